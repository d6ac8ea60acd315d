use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single weather request.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Server answered with anything other than 200.
    #[error("Error fetching data: HTTP {}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    /// Request could not be sent or the body could not be read.
    #[error("Could not reach the weather service: {0}")]
    Connection(#[from] reqwest::Error),
}

/// Errors raised while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Could not load configuration file: {} does not exist.\n\
         Hint: run `weatherdesk configure` first.",
        .0.display()
    )]
    Missing(PathBuf),

    #[error("Could not load configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not load configuration file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "Configuration is missing `{0}`.\n\
         Hint: run `weatherdesk configure` and enter your API key."
    )]
    MissingField(&'static str),

    #[error("Could not determine platform config directory")]
    NoConfigDir,
}
