use std::sync::Arc;

use pushboard_query::QueryCache;
use pushboard_shared::Environment;

use crate::api::ConsoleBackend;
use crate::error::NavigationError;
use crate::routes::{RouteData, RouteId};
use crate::state::ConsoleState;

use super::path::{Location, Params};

/// Everything a guard or loader may read or write during one navigation.
///
/// Built fresh for every resolution pass; `state` is a private copy of the
/// console state that the controller commits only if this navigation
/// renders.
pub struct NavContext {
    pub cache: QueryCache,
    pub backend: Arc<dyn ConsoleBackend>,
    pub location: Location,
    pub params: Params,
    pub state: ConsoleState,
    /// Whether the node currently running is the last of the matched chain.
    pub is_leaf: bool,
    loaded: Vec<(RouteId, RouteData)>,
}

impl NavContext {
    pub fn new(
        cache: QueryCache,
        backend: Arc<dyn ConsoleBackend>,
        location: Location,
        params: Params,
        state: ConsoleState,
    ) -> Self {
        Self {
            cache,
            backend,
            location,
            params,
            state,
            is_leaf: false,
            loaded: Vec::new(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.state.environment
    }

    pub fn param(&self, name: &'static str) -> Result<&str, NavigationError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or(NavigationError::MissingParam(name))
    }

    /// Data produced by an ancestor's loader earlier in this navigation.
    pub fn loaded(&self, route: RouteId) -> Option<&RouteData> {
        self.loaded
            .iter()
            .find(|(id, _)| *id == route)
            .map(|(_, data)| data)
    }

    pub(crate) fn record(&mut self, route: RouteId, data: RouteData) {
        self.loaded.push((route, data));
    }

    pub(crate) fn into_state(self) -> ConsoleState {
        self.state
    }
}
