//! Constants used throughout the deployment core

use std::time::Duration;

/// The default bound on how long a step waits for its creation transaction
/// to be confirmed
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);
