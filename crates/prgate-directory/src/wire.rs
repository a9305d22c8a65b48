//! JSON bodies of the key-management REST API.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct ApiKeyResponse {
    pub id: String,
    pub key: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiKeysPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Option<Vec<ApiKeyResponse>>,
}

impl ApiKeysPage {
    pub fn first(self) -> Option<ApiKeyResponse> {
        self.items.and_then(|items| items.into_iter().next())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiKeyCreateRequest<'a> {
    pub name: &'a str,
    pub read_only: bool,
}
