use reqwest::blocking::Client;

use crate::config::FetchConfig;

use super::{Fetcher, NetworkError};

/// [`Fetcher`] over a blocking `reqwest` client. Safe to share between worker
/// threads; the client pools connections internally.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| NetworkError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| NetworkError::BadUrl(url.to_string()))?;
        log::debug!("GET {}", parsed);
        let response = self
            .client
            .get(parsed)
            .send()
            .map_err(|err| map_transport(url, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(|err| map_transport(url, err))?;
        Ok(body.to_vec())
    }
}

fn map_transport(url: &str, err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout(url.to_string())
    } else if err.is_builder() {
        NetworkError::BadUrl(url.to_string())
    } else {
        NetworkError::Transport(err.to_string())
    }
}
