use crate::foundation::error::{RestorableError, RestorableResult};

/// Environment variable that overrides [`StoreOpts::max_history_len`].
pub const MAX_HISTORY_ENV: &str = "GPU_RESTORE_MAX_HISTORY";

/// Tuning knobs for an [`crate::ImageStore`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOpts {
    /// Commands an image may log before it is marked stale and captured at the next resolve.
    pub max_history_len: usize,
    /// Fold a draw into the previous command when every piece of draw state matches.
    pub merge_draws: bool,
    /// Read an image back into its base pixels after it has been rebuilt by replay.
    pub capture_after_replay: bool,
}

impl Default for StoreOpts {
    fn default() -> Self {
        Self {
            max_history_len: 1024,
            merge_draws: true,
            capture_after_replay: true,
        }
    }
}

impl StoreOpts {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> RestorableResult<Self> {
        serde_json::from_str(s).map_err(|e| RestorableError::serde(e.to_string()))
    }

    /// Apply [`MAX_HISTORY_ENV`] if it holds a positive integer. Anything else is ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(n) = lookup(MAX_HISTORY_ENV)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.max_history_len = n;
        }
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
