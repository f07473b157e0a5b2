use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Rollout {0} is out of range (0-100)")]
    RolloutOutOfRange(u8),

    #[error("Rollout cannot decrease from {current}% to {requested}%")]
    RolloutDecrease { current: u8, requested: u8 },

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Promoting a release to its own deployment")]
    SameDeployment,
}
