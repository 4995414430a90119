//! Configuration for the stats API, loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{
    de::{self, Deserializer},
    Deserialize,
};

/// Settings read from the TOML file named on the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsApiConfig {
    /// Port the HTTP listener binds on all interfaces.
    listen_port: u16,
    /// Directory the pool engine writes its statistics files into.
    #[serde(deserialize_with = "path_from_toml")]
    stats_dir: PathBuf,
    /// Optional directory for daily-rotated log files.
    #[serde(default, deserialize_with = "opt_path_from_toml")]
    log_dir: Option<PathBuf>,
}

impl StatsApiConfig {
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    pub fn stats_dir(&self) -> &Path {
        &self.stats_dir
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Deserialize a TOML string into a `PathBuf`, expanding `~` and
/// environment variables like `$HOME` or `${VAR}`.
fn path_from_toml<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let expanded = shellexpand::full(&raw).map_err(|e| de::Error::custom(e.to_string()))?;
    Ok(PathBuf::from(expanded.to_string()))
}

/// Same expansion for optional path fields; an absent field stays `None`.
fn opt_path_from_toml<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|raw| {
        let expanded = shellexpand::full(&raw).map_err(|e| de::Error::custom(e.to_string()))?;
        Ok(PathBuf::from(expanded.to_string()))
    })
    .transpose()
}
