//! Network reachability probe.

use async_trait::async_trait;
use log::warn;

use crate::config::Config;
use crate::initialization::init_probe_client;

/// Answers whether the outside network is usable right now.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Probe issuing a GET against a well-known URL.
pub struct HttpProbe {
    client: reqwest::Client,
    check_url: String,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, check_url: impl Into<String>) -> Self {
        Self {
            client,
            check_url: check_url.into(),
        }
    }

    /// Probes `config.check_url` with `config.http_timeout`.
    ///
    /// # Errors
    ///
    /// Returns a `reqwest::Error` if the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            init_probe_client(config.http_timeout)?,
            config.check_url.clone(),
        ))
    }
}

#[async_trait]
impl NetworkProbe for HttpProbe {
    /// Any transport error or an error status counts as unreachable.
    async fn is_reachable(&self) -> bool {
        match self
            .client
            .get(&self.check_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
        {
            Ok(_) => true,
            Err(e) => {
                warn!("Network check against {} failed: {}", self.check_url, e);
                false
            }
        }
    }
}
