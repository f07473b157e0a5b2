pub mod context;
pub mod path;
pub mod table;

pub use context::NavContext;
pub use path::{paths, Location, Params, RoutePath, Segment};
pub use table::{Guard, Loader, NodeId, RouteMatch, RouteNode, RouteTable, Step};
