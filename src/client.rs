use std::error::Error as _;
use std::fs;

use color_eyre::eyre::{Context, eyre};
use reqwest::blocking::Client;
use reqwest::{Certificate, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::comic::{ComicId, ComicInfo, Entry};
use crate::config::Config;
use crate::error::{Error, Result};

/// Somewhere comics can be fetched from.
pub trait ComicSource {
    /// Id of the most recently published comic.
    fn fetch_latest_id(&self) -> Result<ComicId>;

    /// Fetches a single comic. Any error means "not available right now".
    fn fetch_entry(&self, id: ComicId) -> Result<Entry>;
}

#[derive(Deserialize, Debug)]
struct Latest {
    num: ComicId,
}

pub struct XkcdClient {
    http: Client,
    base_url: Url,
}

impl XkcdClient {
    pub fn new(config: &Config) -> color_eyre::Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(ca_bundle) = &config.ca_bundle {
            let pem = fs::read(ca_bundle)
                .wrap_err_with(|| format!("failed to read CA bundle {}", ca_bundle.display()))?;
            let certs = Certificate::from_pem_bundle(&pem).wrap_err("invalid CA bundle")?;
            if certs.is_empty() {
                return Err(eyre!("CA bundle {} has no certificates", ca_bundle.display()));
            }
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }
        let http = builder.build().wrap_err("failed to build http client")?;
        Ok(Self::with_client(http, config.base_url.clone()))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn latest_url(&self) -> Result<Url> {
        self.endpoint("info.0.json")
    }

    pub fn entry_url(&self, id: ComicId) -> Result<Url> {
        self.endpoint(&format!("{id}/info.0.json"))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|source| Error::InvalidUrl {
            base: self.base_url.to_string(),
            path: path.to_string(),
            source,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let transport = |source: reqwest::Error| Error::Transport {
            url: url.to_string(),
            source,
        };
        let res = self.http.get(url.clone()).send().map_err(transport)?;
        let status = res.status();
        if status != StatusCode::OK {
            return Err(Error::Remote {
                url: url.to_string(),
                status,
            });
        }
        res.json::<T>().map_err(|e| {
            if e.is_decode() {
                Error::Decode {
                    url: url.to_string(),
                    reason: e.source().map_or_else(|| e.to_string(), ToString::to_string),
                }
            } else {
                transport(e)
            }
        })
    }
}

impl ComicSource for XkcdClient {
    fn fetch_latest_id(&self) -> Result<ComicId> {
        let latest: Latest = self.get_json(self.latest_url()?)?;
        Ok(latest.num)
    }

    fn fetch_entry(&self, id: ComicId) -> Result<Entry> {
        let url = self.entry_url(id)?;
        let info: ComicInfo = self.get_json(url.clone())?;
        Entry::try_from(info).map_err(|e| Error::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> XkcdClient {
        XkcdClient::with_client(Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn builds_api_urls() {
        let client = client("https://xkcd.com/");
        assert_eq!(
            client.latest_url().unwrap().as_str(),
            "https://xkcd.com/info.0.json"
        );
        assert_eq!(
            client.entry_url(614).unwrap().as_str(),
            "https://xkcd.com/614/info.0.json"
        );
    }

    #[test]
    fn base_url_may_carry_a_path() {
        let client = client("http://localhost:8080/mirror/");
        assert_eq!(
            client.entry_url(1).unwrap().as_str(),
            "http://localhost:8080/mirror/1/info.0.json"
        );
    }

    #[test]
    fn unjoinable_base_url_is_an_invalid_url_error() {
        let client = client("mailto:comics@example.com");
        let err = client.entry_url(1).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidUrl { ref path, .. } if path == "1/info.0.json"
        ));
        assert!(!err.is_storage());
    }

    #[test]
    fn client_builds_from_default_config() {
        let config = Config::from_vars(Vec::new()).unwrap();
        let client = XkcdClient::new(&config).unwrap();
        assert_eq!(client.base_url.as_str(), "https://xkcd.com/");
    }

    #[test]
    fn missing_ca_bundle_is_rejected() {
        let config = Config::from_vars(vec![(
            "CA_BUNDLE".to_string(),
            "/nonexistent/cacert.pem".to_string(),
        )])
        .unwrap();
        assert!(XkcdClient::new(&config).is_err());
    }
}
