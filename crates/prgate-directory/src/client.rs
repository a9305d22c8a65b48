use std::time::Duration;

use prgate_core::{Credential, CredentialDirectory, CredentialId, DirectoryError, SignerId};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::wire::{ApiKeyCreateRequest, ApiKeyResponse, ApiKeysPage};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    /// REST API root, e.g. `https://api.example.com/api/v1`. A trailing `/` is ignored.
    pub base_url: String,
    /// Personal bearer token.
    pub token: String,
    pub ledger_id: String,
    pub timeout: Duration,
}

/// Blocking client for the three API-key lifecycle endpoints.
pub struct HttpDirectory {
    client: Client,
    base_url: Url,
    token: String,
    ledger_id: String,
}

impl HttpDirectory {
    pub fn new(config: DirectoryConfig) -> Result<Self, DirectoryError> {
        let raw = config.base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(raw).map_err(|e| DirectoryError::Client(format!("invalid base URL {raw}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::Client(format!("base URL {raw} cannot carry a path")));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DirectoryError::Client(e.to_string()))?;
        Ok(Self { client, base_url, token: config.token, ledger_id: config.ledger_id })
    }

    /// Base URL plus percent-escaped path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::Client(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        expected: StatusCode,
        body: Option<Vec<u8>>,
    ) -> Result<T, DirectoryError> {
        let method_s = method.to_string();
        let url_s = url.to_string();
        debug!(method = %method_s, url = %url_s, "directory request");

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().map_err(|e| DirectoryError::Transport {
            method: method_s.clone(),
            url: url_s.clone(),
            message: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().map_err(|e| DirectoryError::Transport {
            method: method_s.clone(),
            url: url_s.clone(),
            message: format!("error reading response body: {e}"),
        })?;

        if status != expected {
            return Err(DirectoryError::UnexpectedStatus {
                method: method_s,
                url: url_s,
                expected: expected.as_u16(),
                actual: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| DirectoryError::Decode { method: method_s, url: url_s, message: e.to_string() })
    }
}

fn credential(resp: ApiKeyResponse) -> Credential {
    Credential { id: CredentialId::from_str(resp.id), secret: resp.key }
}

impl CredentialDirectory for HttpDirectory {
    fn lookup(&self, signer: &SignerId) -> Result<Option<Credential>, DirectoryError> {
        let url = self.endpoint(&["api_keys", "identity", signer.as_str()])?;
        let page: ApiKeysPage = self.send(Method::GET, url, StatusCode::OK, None)?;
        Ok(page.first().map(credential))
    }

    fn create(&self, signer: &SignerId) -> Result<Credential, DirectoryError> {
        let url = self.endpoint(&["ledgers", &self.ledger_id, "api_keys"])?;
        let payload = ApiKeyCreateRequest { name: signer.as_str(), read_only: false };
        let body = serde_json::to_vec(&payload).map_err(|e| DirectoryError::Encode {
            method: Method::POST.to_string(),
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let resp: ApiKeyResponse = self.send(Method::POST, url, StatusCode::CREATED, Some(body))?;
        Ok(credential(resp))
    }

    fn rotate(&self, id: &CredentialId) -> Result<Credential, DirectoryError> {
        let url = self.endpoint(&["ledgers", &self.ledger_id, "api_keys", id.as_str(), "rotate"])?;
        let resp: ApiKeyResponse = self.send(Method::PUT, url, StatusCode::OK, None)?;
        Ok(credential(resp))
    }
}
