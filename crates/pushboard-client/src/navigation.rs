//! Navigation controller.
//!
//! [`Navigator::navigate`] matches a URL against the route table, runs each
//! node's guard and loader root to leaf, follows redirects, and publishes
//! the resulting [`RenderedRoute`]. Every navigation takes a generation
//! number; a navigation that is no longer the latest when it resumes from an
//! await, or when it is about to commit, is dropped without publishing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use pushboard_query::QueryCache;
use pushboard_shared::constants::MAX_REDIRECT_HOPS;
use pushboard_shared::{AppId, Environment, Release};

use crate::api::ConsoleBackend;
use crate::error::NavigationError;
use crate::events::{emit_event, NavigationEvent, EVENT_CAPACITY};
use crate::router::{Location, NavContext, Params, RouteMatch, RouteTable, Step};
use crate::routes::{console_routes, ReleaseDetail, RouteData, RouteId};
use crate::state::ConsoleState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavState {
    Idle,
    Resolving,
    Guarding(RouteId),
    Loading(RouteId),
    Rendered,
    Failed,
}

/// One matched route and the data its loader produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub route: RouteId,
    pub data: RouteData,
}

/// A fully resolved navigation, ready for the views.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRoute {
    pub location: Location,
    pub params: Params,
    pub state: ConsoleState,
    /// Root to leaf. Empty when nothing matched.
    pub layers: Vec<Layer>,
    pub generation: u64,
}

impl RenderedRoute {
    pub fn is_not_found(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn leaf(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn data(&self, route: RouteId) -> Option<&RouteData> {
        self.layers
            .iter()
            .find(|layer| layer.route == route)
            .map(|layer| &layer.data)
    }

    /// Whether the leaf settled on the placeholder view.
    pub fn is_empty(&self) -> bool {
        matches!(self.leaf(), Some(Layer { data: RouteData::Empty, .. }))
    }

    pub fn apps(&self) -> &[AppId] {
        match self.data(RouteId::Layout) {
            Some(RouteData::Layout { apps }) => apps,
            _ => &[],
        }
    }

    pub fn releases(&self) -> Option<(&AppId, &[Release])> {
        match self.data(RouteId::App) {
            Some(RouteData::App { app, releases }) => Some((app, releases.as_slice())),
            _ => None,
        }
    }

    pub fn release_detail(&self) -> Option<&ReleaseDetail> {
        match self.data(RouteId::Release) {
            Some(RouteData::Release(detail)) => Some(detail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    Rendered(Arc<RenderedRoute>),
    /// A newer navigation started before this one could commit.
    Superseded,
}

enum Resolution {
    Render(Vec<Layer>),
    Redirect(String),
    Superseded,
}

pub struct Navigator {
    table: Arc<RouteTable>,
    cache: QueryCache,
    backend: Arc<dyn ConsoleBackend>,
    console: Mutex<ConsoleState>,
    last_target: Mutex<Option<String>>,
    generation: AtomicU64,
    nav_state: watch::Sender<NavState>,
    rendered: watch::Sender<Option<Arc<RenderedRoute>>>,
    events: broadcast::Sender<NavigationEvent>,
}

impl Navigator {
    pub fn new(
        table: RouteTable,
        cache: QueryCache,
        backend: Arc<dyn ConsoleBackend>,
        environment: Environment,
    ) -> Self {
        let (nav_state, _) = watch::channel(NavState::Idle);
        let (rendered, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            table: Arc::new(table),
            cache,
            backend,
            console: Mutex::new(ConsoleState::new(environment)),
            last_target: Mutex::new(None),
            generation: AtomicU64::new(0),
            nav_state,
            rendered,
            events,
        }
    }

    /// Navigator over the console's route tree.
    pub fn console(
        cache: QueryCache,
        backend: Arc<dyn ConsoleBackend>,
        environment: Environment,
    ) -> Self {
        Self::new(console_routes(), cache, backend, environment)
    }

    /// Latest rendered route. `None` before the first render and after a
    /// failed navigation.
    pub fn current(&self) -> Option<Arc<RenderedRoute>> {
        self.rendered.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<RenderedRoute>>> {
        self.rendered.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> NavState {
        *self.nav_state.borrow()
    }

    /// Committed console state.
    pub fn console_state(&self) -> ConsoleState {
        self.console.lock().clone()
    }

    /// Switch deployment and re-resolve the current location.
    pub async fn set_environment(
        &self,
        environment: Environment,
    ) -> Result<NavigationOutcome, NavigationError> {
        self.console.lock().environment = environment;
        info!(env = %environment, "Environment switched");
        self.refresh().await
    }

    /// Resolve the current location again.
    pub async fn refresh(&self) -> Result<NavigationOutcome, NavigationError> {
        let target = match self.current() {
            Some(rendered) => rendered.location.pathname.clone(),
            None => self.last_target.lock().clone().unwrap_or_else(|| "/".to_string()),
        };
        self.navigate(&target).await
    }

    pub async fn navigate(&self, target: &str) -> Result<NavigationOutcome, NavigationError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_target.lock() = Some(target.to_string());
        emit_event(
            &self.events,
            NavigationEvent::Started {
                generation,
                target: target.to_string(),
            },
        );
        debug!(generation, target, "Navigation started");

        match self.resolve(generation, target).await {
            Ok(Some(rendered)) => Ok(self.commit(generation, rendered)),
            Ok(None) => Ok(self.superseded(generation)),
            Err(e) => {
                let console = self.console.lock();
                if !self.is_current(generation) {
                    drop(console);
                    return Ok(self.superseded(generation));
                }
                self.rendered.send_replace(None);
                drop(console);

                warn!(generation, target, error = %e, "Navigation failed");
                self.set_state(NavState::Failed);
                emit_event(
                    &self.events,
                    NavigationEvent::Failed {
                        generation,
                        error: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    /// Resolve `target`, following redirects. `None` when superseded.
    async fn resolve(
        &self,
        generation: u64,
        target: &str,
    ) -> Result<Option<RenderedRoute>, NavigationError> {
        let mut state = self.console.lock().clone();
        let mut current = target.to_string();
        let mut hops = 0;

        loop {
            self.set_state(NavState::Resolving);
            let location = Location::parse(&current);

            let Some(matched) = self.table.resolve(&location) else {
                debug!(path = %location, "No route matched");
                return Ok(Some(RenderedRoute {
                    location,
                    params: Params::new(),
                    state,
                    layers: Vec::new(),
                    generation,
                }));
            };

            let mut ctx = NavContext::new(
                self.cache.clone(),
                self.backend.clone(),
                location,
                matched.params.clone(),
                state,
            );

            match self.run_chain(generation, &matched, &mut ctx).await? {
                Resolution::Superseded => return Ok(None),
                Resolution::Render(layers) => {
                    let location = ctx.location.clone();
                    return Ok(Some(RenderedRoute {
                        location,
                        params: matched.params,
                        state: ctx.into_state(),
                        layers,
                        generation,
                    }));
                }
                Resolution::Redirect(to) => {
                    hops += 1;
                    if hops > MAX_REDIRECT_HOPS {
                        return Err(NavigationError::TooManyRedirects {
                            from: target.to_string(),
                            to,
                        });
                    }
                    debug!(from = %current, to = %to, "Redirecting");
                    emit_event(
                        &self.events,
                        NavigationEvent::Redirected {
                            from: current.clone(),
                            to: to.clone(),
                        },
                    );
                    state = ctx.into_state();
                    current = to;
                }
            }
        }
    }

    /// Run guard then loader of every node, root to leaf.
    async fn run_chain(
        &self,
        generation: u64,
        matched: &RouteMatch,
        ctx: &mut NavContext,
    ) -> Result<Resolution, NavigationError> {
        let leaf = matched.chain.len().saturating_sub(1);
        let mut layers = Vec::with_capacity(matched.chain.len());

        for (depth, node_id) in matched.chain.iter().enumerate() {
            let node = self.table.node(*node_id);
            ctx.is_leaf = depth == leaf;

            if let Some(guard) = &node.guard {
                self.set_state(NavState::Guarding(node.id));
                let step = guard.check(ctx).await?;
                if !self.is_current(generation) {
                    return Ok(Resolution::Superseded);
                }
                if let Step::RedirectTo(to) = step {
                    return Ok(Resolution::Redirect(to));
                }
            }

            let data = match &node.loader {
                Some(loader) => {
                    self.set_state(NavState::Loading(node.id));
                    let step = loader.load(ctx).await?;
                    if !self.is_current(generation) {
                        return Ok(Resolution::Superseded);
                    }
                    match step {
                        Step::Continue(data) => data,
                        Step::RedirectTo(to) => return Ok(Resolution::Redirect(to)),
                    }
                }
                None => RouteData::None,
            };

            ctx.record(node.id, data.clone());
            layers.push(Layer {
                route: node.id,
                data,
            });
        }

        Ok(Resolution::Render(layers))
    }

    fn commit(&self, generation: u64, rendered: RenderedRoute) -> NavigationOutcome {
        let mut console = self.console.lock();
        if !self.is_current(generation) {
            drop(console);
            return self.superseded(generation);
        }

        let rendered = Arc::new(rendered);
        if !rendered.is_not_found() {
            *console = rendered.state.clone();
        }
        self.rendered.send_replace(Some(rendered.clone()));
        drop(console);

        self.set_state(NavState::Rendered);
        emit_event(
            &self.events,
            NavigationEvent::Rendered {
                generation,
                pathname: rendered.location.pathname.clone(),
            },
        );
        info!(generation, path = %rendered.location, "Rendered");
        NavigationOutcome::Rendered(rendered)
    }

    fn superseded(&self, generation: u64) -> NavigationOutcome {
        debug!(generation, "Navigation superseded");
        emit_event(&self.events, NavigationEvent::Superseded { generation });
        NavigationOutcome::Superseded
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn set_state(&self, state: NavState) {
        let previous = self.nav_state.send_replace(state);
        if previous != state {
            emit_event(&self.events, NavigationEvent::StateChanged { state });
        }
    }
}
