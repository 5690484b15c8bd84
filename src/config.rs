use std::path::PathBuf;
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::Context;
use reqwest::Url;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    /// Extra PEM bundle trusted on top of the platform roots.
    pub ca_bundle: Option<PathBuf>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    pub sentry_dsn: Option<String>,
}

fn default_base_url() -> Url {
    Url::parse("https://xkcd.com/").expect("default base url is valid")
}

fn default_dataset_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_default()
        .join("src")
        .join("xkcd.json")
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into()
}

const fn default_request_delay_ms() -> u64 {
    1000
}

impl Config {
    pub fn from_env() -> Result<Self> {
        envy::from_env::<Config>().wrap_err("failed to load config")
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).wrap_err("failed to load config")
    }

    pub const fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
