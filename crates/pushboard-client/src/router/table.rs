//! Route tree, guard/loader seams and URL matching.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::NavigationError;
use crate::routes::{RouteData, RouteId};

use super::context::NavContext;
use super::path::{Location, Params, RoutePath, Segment};

/// Outcome of a guard or loader step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    Continue(T),
    /// Abandon this resolution and resolve `target` instead.
    RedirectTo(String),
}

/// Runs before a node loads. Reads cached data only.
#[async_trait]
pub trait Guard: Send + Sync {
    async fn check(&self, ctx: &NavContext) -> Result<Step<()>, NavigationError>;
}

/// Populates the query cache for a node and hands its data to the view.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, ctx: &mut NavContext) -> Result<Step<RouteData>, NavigationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

pub struct RouteNode {
    pub id: RouteId,
    pub path: RoutePath,
    pub guard: Option<Arc<dyn Guard>>,
    pub loader: Option<Arc<dyn Loader>>,
    children: Vec<NodeId>,
}

impl RouteNode {
    pub fn new(id: RouteId, path: RoutePath) -> Self {
        Self {
            id,
            path,
            guard: None,
            loader: None,
            children: Vec::new(),
        }
    }

    pub fn with_guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }
}

impl std::fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteNode")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("guard", &self.guard.is_some())
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

/// Root-to-leaf chain of a matched URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub chain: Vec<NodeId>,
    pub params: Params,
}

/// Tree of route nodes, stored flat with node 0 as the root.
#[derive(Debug)]
pub struct RouteTable {
    nodes: Vec<RouteNode>,
}

impl RouteTable {
    pub fn new(root: RouteNode) -> Self {
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Attach `node` under `parent`. Children are tried in insertion order.
    pub fn add(&mut self, parent: NodeId, node: RouteNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &RouteNode {
        &self.nodes[id.0]
    }

    /// Match `location` against the tree, depth first, children before
    /// the node itself.
    pub fn resolve(&self, location: &Location) -> Option<RouteMatch> {
        let mut chain = Vec::new();
        let mut params = Params::new();
        if self.match_node(self.root(), &location.segments, &mut chain, &mut params) {
            Some(RouteMatch { chain, params })
        } else {
            None
        }
    }

    /// Route ids of a matched chain.
    pub fn route_ids(&self, matched: &RouteMatch) -> Vec<RouteId> {
        matched.chain.iter().map(|id| self.node(*id).id).collect()
    }

    fn match_node(
        &self,
        id: NodeId,
        remaining: &[String],
        chain: &mut Vec<NodeId>,
        params: &mut Params,
    ) -> bool {
        let node = self.node(id);
        let mut bound = Vec::new();

        let rest = match &node.path {
            RoutePath::Pathless => remaining,
            RoutePath::Index => {
                if !remaining.is_empty() {
                    return false;
                }
                remaining
            }
            RoutePath::Segments(segments) => {
                if remaining.len() < segments.len() {
                    return false;
                }
                for (segment, value) in segments.iter().zip(remaining) {
                    match segment {
                        Segment::Static(expected) if expected == value => {}
                        Segment::Static(_) => return false,
                        Segment::Param(name) => bound.push((name.clone(), value.clone())),
                    }
                }
                &remaining[segments.len()..]
            }
        };

        chain.push(id);
        for (name, value) in &bound {
            params.insert(name.clone(), value.clone());
        }

        for child in &node.children {
            if self.match_node(*child, rest, chain, params) {
                return true;
            }
        }

        if rest.is_empty() && node.path != RoutePath::Pathless {
            return true;
        }

        chain.pop();
        for (name, _) in &bound {
            params.remove(name);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::console_routes;

    fn resolve(path: &str) -> Option<(Vec<RouteId>, Params)> {
        let table = console_routes();
        table
            .resolve(&Location::parse(path))
            .map(|m| (table.route_ids(&m), m.params))
    }

    #[test]
    fn test_root_resolves_to_index() {
        let (ids, params) = resolve("/").unwrap();
        assert_eq!(ids, [RouteId::Root, RouteId::Layout, RouteId::Index]);
        assert!(params.is_empty());
    }

    #[test]
    fn test_apps_paths() {
        let (ids, _) = resolve("/apps").unwrap();
        assert_eq!(ids, [RouteId::Root, RouteId::Layout, RouteId::Apps]);

        let (ids, params) = resolve("/apps/Turneo-iOS").unwrap();
        assert_eq!(
            ids,
            [RouteId::Root, RouteId::Layout, RouteId::Apps, RouteId::App]
        );
        assert_eq!(params["appId"], "Turneo-iOS");
    }

    #[test]
    fn test_release_path_binds_both_params() {
        let (ids, params) = resolve("/apps/My%20App/releases/v141").unwrap();
        assert_eq!(ids.last(), Some(&RouteId::Release));
        assert_eq!(params["appId"], "My App");
        assert_eq!(params["label"], "v141");
    }

    #[test]
    fn test_unknown_paths_do_not_match() {
        assert!(resolve("/settings").is_none());
        assert!(resolve("/apps/A/releases").is_none());
        assert!(resolve("/apps/A/releases/v1/extra").is_none());
    }

    #[test]
    fn test_failed_branch_unbinds_params() {
        // "$appId" binds "x" then its child rejects "oops"; the param must not leak.
        let mut table = RouteTable::new(RouteNode::new(RouteId::Root, RoutePath::Pathless));
        let root = table.root();
        let app = table.add(root, RouteNode::new(RouteId::App, RoutePath::parse("$appId")));
        table.add(app, RouteNode::new(RouteId::Release, RoutePath::parse("details")));
        table.add(root, RouteNode::new(RouteId::Apps, RoutePath::parse("$other/oops")));

        let matched = table.resolve(&Location::parse("/x/oops")).unwrap();
        assert_eq!(table.route_ids(&matched), [RouteId::Root, RouteId::Apps]);
        assert!(!matched.params.contains_key("appId"));
        assert_eq!(matched.params["other"], "x");
    }
}
