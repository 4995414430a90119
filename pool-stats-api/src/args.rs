//! CLI argument handling for the stats API binary.

use std::path::PathBuf;

use pool_stats_api::{
    config::StatsApiConfig,
    error::{StatsApiError, StatsApiResult},
};

#[derive(Debug)]
pub struct Args {
    pub config_path: PathBuf,
}

enum ArgsState {
    Next,
    ExpectPath,
    Done,
}

enum ArgsResult {
    Config(PathBuf),
    None,
    Help(String),
}

impl Args {
    const DEFAULT_CONFIG_PATH: &'static str = "stats-api-config.toml";
    const HELP_MSG: &'static str =
        "Usage: -h/--help, -c/--config <path|default stats-api-config.toml>";

    fn from_args() -> Result<Self, String> {
        let cli_args = std::env::args();

        if cli_args.len() == 1 {
            println!("Using default config path: {}", Self::DEFAULT_CONFIG_PATH);
            println!("{}\n", Self::HELP_MSG);
        }

        let config_path = cli_args
            .scan(ArgsState::Next, |state, item| {
                match std::mem::replace(state, ArgsState::Done) {
                    ArgsState::Next => match item.as_str() {
                        "-c" | "--config" => {
                            *state = ArgsState::ExpectPath;
                            Some(ArgsResult::None)
                        }
                        "-h" | "--help" => Some(ArgsResult::Help(Self::HELP_MSG.to_string())),
                        _ => {
                            *state = ArgsState::Next;
                            Some(ArgsResult::None)
                        }
                    },
                    ArgsState::ExpectPath => Some(ArgsResult::Config(item.into())),
                    ArgsState::Done => None,
                }
            })
            .last();
        let config_path = match config_path {
            Some(ArgsResult::Config(path)) => path,
            Some(ArgsResult::Help(help)) => return Err(help),
            _ => PathBuf::from(Self::DEFAULT_CONFIG_PATH),
        };
        Ok(Self { config_path })
    }
}

/// Load the configuration named on the command line.
pub fn process_cli_args() -> StatsApiResult<StatsApiConfig> {
    let args = Args::from_args().map_err(StatsApiError::Configuration)?;
    let contents = std::fs::read_to_string(&args.config_path).map_err(|e| {
        StatsApiError::Configuration(format!(
            "Failed to read config file {}: {e}",
            args.config_path.display()
        ))
    })?;
    let config = toml::from_str::<StatsApiConfig>(&contents)
        .map_err(|e| StatsApiError::Configuration(e.to_string()))?;
    Ok(config)
}
