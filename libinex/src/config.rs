use crate::error::{invalid, Result};
use crate::query::DEFAULT_VIEW_LIMIT;

use std::path::PathBuf;
use tracing::debug;

/// Environment variables starting with this prefix are read as options,
/// `INEX_DATA_DIR` sets `data_dir`.
pub const ENV_PREFIX: &str = "INEX_";

/// Where store files live and how views behave by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub view_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            view_limit: DEFAULT_VIEW_LIMIT,
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Default::default()
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Config {
        self.data_dir = dir.into();
        self
    }

    pub fn set_option(&mut self, key: &str, val: &str) -> Result<()> {
        match key {
            "data_dir" => {
                if val.is_empty() {
                    return Err(invalid("data_dir can't be empty"));
                }
                self.data_dir = PathBuf::from(val);
            }
            "view_limit" => {
                self.view_limit = val
                    .parse::<usize>()
                    .map_err(|_| invalid(format!("view_limit `{}' is not a count", val)))?;
            }
            _ => return Err(invalid(format!("unknown option `{}'", key))),
        }
        Ok(())
    }

    pub fn get_option(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => Some(self.data_dir.display().to_string()),
            "view_limit" => Some(self.view_limit.to_string()),
            _ => None,
        }
    }

    /// Apply every `INEX_*` pair from `vars` on top of the defaults. Keys this
    /// type doesn't know (`INEX_LOG` belongs to the shell) are skipped.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Config>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Config::new();
        for (key, val) in vars {
            let Some(option) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let option = option.to_ascii_lowercase();
            if config.get_option(&option).is_none() {
                debug!(option = %option, "ignoring unknown option");
                continue;
            }
            config.set_option(&option, val.as_ref())?;
        }
        Ok(config)
    }

    pub fn from_env() -> Result<Config> {
        Self::from_vars(std::env::vars())
    }
}
