use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn from_str(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(ApproverIdentity);
id_newtype!(SignerId);
id_newtype!(CredentialId);

impl SignerId {
    /// Platform-qualified signer form of a bare approver name, e.g. `alice` -> `alice@github`.
    pub fn qualify(approver: &ApproverIdentity, suffix: &str) -> Self {
        Self(format!("{}{}", approver.as_str(), suffix))
    }

    /// Inverse of [`SignerId::qualify`]. A signer without the suffix maps to itself.
    pub fn approver(&self, suffix: &str) -> ApproverIdentity {
        let bare = if suffix.is_empty() {
            self.as_str()
        } else {
            self.as_str().strip_suffix(suffix).unwrap_or(self.as_str())
        };
        ApproverIdentity::from_str(bare)
    }

    /// API keys are minted as `<signerId>.<secret>`; the signer is everything
    /// before the last separator.
    pub fn from_api_key(key: &str) -> Option<Self> {
        let (signer, secret) = key.rsplit_once('.')?;
        if signer.is_empty() || secret.is_empty() {
            return None;
        }
        Some(Self::from_str(signer))
    }
}
