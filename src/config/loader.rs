use std::path::Path;

use super::types::IndexingConfig;

impl IndexingConfig {
    /// Load configuration from a TOML file, falling back to defaults on any
    /// error. Configuration loading is out of scope for correctness — the
    /// only requirement is that a missing or malformed file never panics
    /// the process.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("no config at {path:?}, using defaults: {err}");
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("failed to parse config at {path:?}, using defaults: {err}");
                Self::default()
            }
        }
    }
}
