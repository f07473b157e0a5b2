pub mod progress;

pub use progress::{
    clamp_percent, CircularProgress, PieProgress, PieSlice, ProgressSize, ProgressVariant,
    RingGeometry,
};
