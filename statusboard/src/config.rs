//! Dashboard configuration
//!
//! Every field has a default matching the stock behavior, so an empty
//! (or absent) configuration file yields the standard dashboard. A YAML
//! file can override any subset of the fields:
//!
//! ```yaml
//! poll_timeout_ms: 100
//! prev_page_key: "p"
//! next_page_key: "n"
//! ```
//!
//! Keys must be quoted in YAML, otherwise digits parse as integers.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Title drawn centered on the first header row.
static DEFAULT_TITLE: &str = "SonATA System Status";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Upper bound on the readiness wait, which is also the loop's
    /// scheduling granularity.
    pub poll_timeout_ms: u64,
    /// If status lines arrived but no boundary marker followed within
    /// this long, a boundary is synthesized.
    pub cycle_interval_ms: u64,
    pub prev_page_key: char,
    pub next_page_key: char,
    /// Width of the key column in body rows. Keys are padded or cut to it.
    pub key_width: usize,
    pub title: String,
    /// First column of the state highlight block in body rows.
    pub highlight_col: u16,
    pub highlight_width: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poll_timeout_ms: 200,
            cycle_interval_ms: 1000,
            prev_page_key: '8',
            next_page_key: '9',
            key_width: 9,
            title: DEFAULT_TITLE.to_string(),
            highlight_col: 6,
            highlight_width: 3,
        }
    }
}

impl Config {
    /// Parses a YAML document. Missing fields keep their defaults.
    pub fn from_yaml(text: &str) -> Result<Config> {
        // An empty document deserializes to unit, not to a mapping.
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|source| Error::Open {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Config::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prev_page_key == self.next_page_key {
            return Err(Error::ConfigInvalid(format!(
                "previous and next page keys are both '{}'",
                self.prev_page_key
            )));
        }
        if self.key_width == 0 {
            return Err(Error::ConfigInvalid("key_width must be at least 1".into()));
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}
