use serde::Serialize;
use tokio::sync::broadcast;

use crate::navigation::NavState;

pub const EVENT_STARTED: &str = "navigation-started";
pub const EVENT_STATE_CHANGED: &str = "navigation-state-changed";
pub const EVENT_REDIRECTED: &str = "navigation-redirected";
pub const EVENT_RENDERED: &str = "navigation-rendered";
pub const EVENT_SUPERSEDED: &str = "navigation-superseded";
pub const EVENT_FAILED: &str = "navigation-failed";

/// Capacity of the navigation event channel.
pub const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum NavigationEvent {
    Started { generation: u64, target: String },
    StateChanged { state: NavState },
    Redirected { from: String, to: String },
    Rendered { generation: u64, pathname: String },
    Superseded { generation: u64 },
    Failed { generation: u64, error: String },
}

impl NavigationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => EVENT_STARTED,
            Self::StateChanged { .. } => EVENT_STATE_CHANGED,
            Self::Redirected { .. } => EVENT_REDIRECTED,
            Self::Rendered { .. } => EVENT_RENDERED,
            Self::Superseded { .. } => EVENT_SUPERSEDED,
            Self::Failed { .. } => EVENT_FAILED,
        }
    }
}

pub fn emit_event(events: &broadcast::Sender<NavigationEvent>, event: NavigationEvent) {
    tracing::trace!(event = event.name(), "Emitting navigation event");
    // Sending only fails when nobody subscribed.
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = NavigationEvent::Redirected {
            from: "/".to_string(),
            to: "/apps/A/releases/r2".to_string(),
        };
        assert_eq!(event.name(), EVENT_REDIRECTED);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "event": "redirected",
                "from": "/",
                "to": "/apps/A/releases/r2",
            })
        );
    }
}
