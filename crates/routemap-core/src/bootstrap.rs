//! One-shot process configuration for import-only consumers.
//!
//! A service that only reconstructs routes can call [`init`] once at startup
//! with a minimal configuration instead of threading a [`RoutemapConfig`]
//! through every call site. Re-initialization with an identical configuration
//! is a no-op; re-initialization with a different one is rejected, naming the
//! first setting that differs.

use std::sync::OnceLock;

use crate::config::RoutemapConfig;
use crate::error::ConfigError;

static CONFIG: OnceLock<RoutemapConfig> = OnceLock::new();

/// Installs the process-wide configuration.
///
/// The first call wins. Later calls with an equal configuration return the
/// stored one; later calls with a different configuration fail with
/// [`ConfigError::ConflictingInit`].
///
/// # Errors
///
/// Returns [`ConfigError::ConflictingInit`] when a different configuration
/// was already installed.
pub fn init(config: RoutemapConfig) -> Result<&'static RoutemapConfig, ConfigError> {
    let stored = CONFIG.get_or_init(|| config.clone());
    if *stored == config {
        return Ok(stored);
    }

    let existing = stored.settings();
    let requested = config.settings();
    // Name the first setting that differs so the caller knows what to fix.
    for (setting, existing_value) in &existing {
        let requested_value = &requested[setting];
        if existing_value != requested_value {
            return Err(ConfigError::ConflictingInit {
                setting: (*setting).to_string(),
                existing: existing_value.clone(),
                requested: requested_value.clone(),
            });
        }
    }
    // Unreachable in practice: unequal configs always differ in some setting.
    Ok(stored)
}

/// The installed configuration, if [`init`] has run.
#[must_use]
pub fn get() -> Option<&'static RoutemapConfig> {
    CONFIG.get()
}
