//! Minimal authenticated JSON-over-HTTP transport

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use crate::error::{ClientError, Result};

/// One REST endpoint: base URL, API version and bearer token
#[derive(Clone)]
pub(crate) struct Endpoint {
    base: Url,
    api_version: String,
    token: String,
}

impl Endpoint {
    pub(crate) fn new(base: &str, api_version: &str, token: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!("{} cannot be a base URL", base)));
        }
        Ok(Self {
            base,
            api_version: api_version.to_string(),
            token: token.to_string(),
        })
    }

    /// Build `<base>/<segments...>?api-version=<v>`, percent-encoding each segment
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("base", &self.base.as_str())
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

/// Blocking JSON client shared by both endpoints
#[derive(Debug, Clone)]
pub(crate) struct JsonClient {
    agent: ureq::Agent,
}

impl JsonClient {
    pub(crate) fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect_timeout)
                .timeout_read(read_timeout)
                .build(),
        }
    }

    /// GET a JSON document; any non-2xx status is an error
    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        segments: &[&str],
    ) -> Result<T> {
        let url = endpoint.url(segments)?;
        debug!(%url, "GET");

        let response = self
            .agent
            .get(url.as_str())
            .set("Authorization", &endpoint.authorization())
            .set("Accept", "application/json")
            .call()
            .map_err(map_ureq_error)?;

        read_json(response)
    }

    /// GET a JSON document, treating 404 as "not there yet"
    pub(crate) fn get_optional<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        segments: &[&str],
    ) -> Result<Option<T>> {
        match self.get(endpoint, segments) {
            Ok(value) => Ok(Some(value)),
            Err(ClientError::Http { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// PATCH a JSON body and return the response status
    ///
    /// Client errors (4xx) are returned as a status so the caller can decide
    /// whether they are a rejection; server errors and transport failures
    /// are errors.
    pub(crate) fn patch<B: Serialize>(
        &self,
        endpoint: &Endpoint,
        segments: &[&str],
        body: &B,
    ) -> Result<u16> {
        let url = endpoint.url(segments)?;
        let payload = serde_json::to_string(body)?;
        debug!(%url, "PATCH");
        trace!(%payload, "PATCH body");

        let result = self
            .agent
            .request("PATCH", url.as_str())
            .set("Authorization", &endpoint.authorization())
            .set("Content-Type", "application/json")
            .set("If-Match", "*")
            .send_string(&payload);

        match result {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(status, _)) if (400..500).contains(&status) => Ok(status),
            Err(e) => Err(map_ureq_error(e)),
        }
    }
}

fn read_json<T: DeserializeOwned>(response: ureq::Response) -> Result<T> {
    let body = response
        .into_string()
        .map_err(|e| ClientError::Network(e.to_string()))?;
    serde_json::from_str(&body)
        .map_err(|e| ClientError::Parse(format!("{} in body {:?}", e, body)))
}

fn map_ureq_error(error: ureq::Error) -> ClientError {
    match error {
        ureq::Error::Status(status, response) => ClientError::Http {
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => ClientError::Network(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building_encodes_segments() {
        let endpoint = Endpoint::new("https://hub.example.net/", "2021-04-12", "t").unwrap();
        let url = endpoint.url(&["devices", "dev 1/a"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://hub.example.net/devices/dev%201%2Fa?api-version=2021-04-12"
        );
    }

    #[test]
    fn test_url_building_keeps_base_path() {
        let endpoint = Endpoint::new("https://adu.example.net/prefix", "v1", "t").unwrap();
        let url = endpoint.url(&["deviceupdate", "inst"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://adu.example.net/prefix/deviceupdate/inst?api-version=v1"
        );
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(matches!(
            Endpoint::new("not a url", "v1", "t"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            Endpoint::new("mailto:someone@example.net", "v1", "t"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_authorization_header() {
        let endpoint = Endpoint::new("https://hub.example.net", "v1", "abc").unwrap();
        assert_eq!(endpoint.authorization(), "Bearer abc");
    }
}
