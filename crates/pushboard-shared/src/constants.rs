/// Application name
pub const APP_NAME: &str = "Pushboard";

/// Version prefix of the release management API
pub const API_VERSION_PREFIX: &str = "/v0.1";

/// Default backend base URL (local development server)
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default organisation owning the apps
pub const DEFAULT_ORG: &str = "turneoapp";

/// Apps shown when no remote listing is configured
pub const DEFAULT_APPS: [&str; 2] = ["Turneo-iOS", "Turneo-Android"];

/// How long a cached query stays fresh, in milliseconds
pub const DEFAULT_STALE_TIME_MS: u64 = 5000;

/// Upper bound of a release rollout percentage
pub const MAX_ROLLOUT: u8 = 100;

/// Redirect hops allowed while resolving a single navigation
pub const MAX_REDIRECT_HOPS: usize = 1;

/// Session endpoint answering 200 for a logged-in operator
pub const AUTHENTICATED_PATH: &str = "/authenticated";

/// Metrics endpoint, joined to releases by label
pub const METRICS_PATH: &str = "/metrics";
