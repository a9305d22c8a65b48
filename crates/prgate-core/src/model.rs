use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::*;

/// Trust status of one signer's notarization of one artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustStatus {
    #[default]
    Trusted,
    Untrusted,
    Unknown,
    Unsupported,
    ApikeyRevoked,
}

impl TrustStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustStatus::Trusted => "TRUSTED",
            TrustStatus::Untrusted => "UNTRUSTED",
            TrustStatus::Unknown => "UNKNOWN",
            TrustStatus::Unsupported => "UNSUPPORTED",
            TrustStatus::ApikeyRevoked => "APIKEY_REVOKED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TRUSTED" => Some(TrustStatus::Trusted),
            "UNTRUSTED" => Some(TrustStatus::Untrusted),
            "UNKNOWN" => Some(TrustStatus::Unknown),
            "UNSUPPORTED" => Some(TrustStatus::Unsupported),
            "APIKEY_REVOKED" => Some(TrustStatus::ApikeyRevoked),
            _ => None,
        }
    }
}

impl fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque API key bound to one approver for the duration of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: CredentialId,
    pub secret: String,
}

impl Credential {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { id: CredentialId::from_str(id), secret: secret.into() }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Content descriptor of the commit under test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub kind: String,
    pub name: String,
    /// Lowercase hex content hash; the ledger key.
    pub hash: String,
    pub size: u64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Notarization record as stored on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub kind: String,
    pub name: String,
    pub hash: String,
    pub size: u64,
    pub signer: SignerId,
    pub status: TrustStatus,
    pub timestamp: i64,
    #[serde(default)]
    pub revoked_at: Option<i64>,
}

impl LedgerRecord {
    pub fn for_artifact(artifact: &ArtifactDescriptor, signer: SignerId, status: TrustStatus, timestamp: i64) -> Self {
        Self {
            kind: artifact.kind.clone(),
            name: artifact.name.clone(),
            hash: artifact.hash.clone(),
            size: artifact.size,
            signer,
            status,
            timestamp,
            revoked_at: None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self.revoked_at, Some(at) if at != 0)
    }

    /// Reported status, except that a revoked key always reads as `ApikeyRevoked`.
    pub fn effective_status(&self) -> TrustStatus {
        if self.is_revoked() {
            TrustStatus::ApikeyRevoked
        } else {
            self.status
        }
    }
}

/// Result of a ledger lookup. Absence is an expected outcome, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Found { record: LedgerRecord, verified: bool },
    NotFound,
}
