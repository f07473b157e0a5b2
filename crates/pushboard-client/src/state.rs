//! Ephemeral console state threaded through every navigation.
//!
//! The [`ConsoleState`] is owned by the [`crate::navigation::Navigator`].
//! Each navigation works on its own copy inside the navigation context and
//! the copy is written back only when that navigation renders, so a
//! superseded navigation never leaks its selection.

use pushboard_shared::{AppId, Environment};

/// Operator selections that live as long as the console session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleState {
    /// Deployment whose releases are shown.
    pub environment: Environment,

    /// App highlighted in the sidebar.
    /// `None` until an app route has rendered.
    pub selected_app: Option<AppId>,

    /// Label of the release shown in the detail pane.
    pub selected_release: Option<String>,
}

impl ConsoleState {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            selected_app: None,
            selected_release: None,
        }
    }

    /// Selected app and release, when both are known.
    pub fn selection(&self) -> Option<(&AppId, &str)> {
        match (&self.selected_app, &self.selected_release) {
            (Some(app), Some(label)) => Some((app, label.as_str())),
            _ => None,
        }
    }
}
