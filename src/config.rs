//! Runtime configuration.

use crate::network::auth::AuthConfig;

/// Default bound on each player's notification queue.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Settings for the registry and the binary.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Per-player mailbox bound. Notifications beyond it are dropped.
    pub mailbox_capacity: usize,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
    /// Token validation for authenticated dispatch.
    pub auth: AuthConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            log_filter: "info".to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Read `TICTAC_MAILBOX_CAPACITY`, `TICTAC_LOG` and the `AUTH_*` variables.
    ///
    /// Missing or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mailbox_capacity: std::env::var("TICTAC_MAILBOX_CAPACITY")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.mailbox_capacity),
            log_filter: std::env::var("TICTAC_LOG").unwrap_or(defaults.log_filter),
            auth: AuthConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ArenaConfig::default();
        assert_eq!(config.mailbox_capacity, 64);
        assert_eq!(config.log_filter, "info");
        assert!(!config.auth.is_configured());
    }
}
