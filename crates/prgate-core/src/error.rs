use thiserror::Error;

use crate::ids::ApproverIdentity;

/// Bad arguments or credential strings. Always raised before any network call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("required argument value {0} is empty")]
    EmptyArgument(String),
    #[error("error parsing the \"{name}\" argument value \"{value}\": expected a boolean")]
    InvalidFlag { name: String, value: String },
    #[error("malformed credential on position {position}: expected <signerId>.<secret>")]
    MalformedCredential { position: usize },
    #[error("duplicate signer ID {0}")]
    DuplicateIdentity(ApproverIdentity),
    #[error("the list of required approvers is empty")]
    NoRequiredApprovers,
}

/// Failure talking to the key-management directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("error initializing directory client: {0}")]
    Client(String),
    #[error("error creating HTTP request {method} {url}: {message}")]
    Encode { method: String, url: String, message: String },
    #[error("error sending request {method} {url}: {message}")]
    Transport { method: String, url: String, message: String },
    #[error("{method} {url} error: expected response status {expected}, got {actual} with body {body}")]
    UnexpectedStatus { method: String, url: String, expected: u16, actual: u16, body: String },
    #[error("error JSON-unmarshaling {method} {url} response body: {message}")]
    Decode { method: String, url: String, message: String },
}

/// Failure of the ledger transport (connect, sign, load).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("error connecting ledger client: {0}")]
    Connect(String),
    #[error("ledger request failed: {0}")]
    Request(String),
}

/// Fatal failure of a gate run. A missing notarization or an aggregate
/// shortfall is never a `GateError`; both show up in the outcome instead.
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("error getting or creating / rotating credential for approver {approver}")]
    Directory { approver: ApproverIdentity, source: DirectoryError },
    #[error("notarization error for approver {approver}")]
    Notarization { approver: ApproverIdentity, source: TransportError },
    #[error("ledger might be compromised: error verifying PR for required approver {approver}")]
    Verification { approver: ApproverIdentity, source: TransportError },
    #[error("ledger might be compromised: verification status for required approver {approver} is \"false\"")]
    LedgerIntegrity { approver: ApproverIdentity },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Directory,
    Notarization,
    LedgerIntegrity,
}

impl GateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GateError::Input(_) => ErrorCategory::Input,
            GateError::Directory { .. } => ErrorCategory::Directory,
            GateError::Notarization { .. } => ErrorCategory::Notarization,
            GateError::Verification { .. } | GateError::LedgerIntegrity { .. } => ErrorCategory::LedgerIntegrity,
        }
    }

    pub fn approver(&self) -> Option<&ApproverIdentity> {
        match self {
            GateError::Input(InputError::DuplicateIdentity(a)) => Some(a),
            GateError::Input(_) => None,
            GateError::Directory { approver, .. }
            | GateError::Notarization { approver, .. }
            | GateError::Verification { approver, .. }
            | GateError::LedgerIntegrity { approver } => Some(approver),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_carries_request_details() {
        let err = DirectoryError::UnexpectedStatus {
            method: "PUT".into(),
            url: "https://dir.example/ledgers/l1/api_keys/k1/rotate".into(),
            expected: 200,
            actual: 403,
            body: "{\"error\":\"forbidden\"}".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("PUT"));
        assert!(msg.contains("/ledgers/l1/api_keys/k1/rotate"));
        assert!(msg.contains("200"));
        assert!(msg.contains("403"));
        assert!(msg.contains("forbidden"));
    }

    #[test]
    fn categories() {
        let alice = ApproverIdentity::from_str("alice");
        assert_eq!(GateError::from(InputError::NoRequiredApprovers).category(), ErrorCategory::Input);
        let e = GateError::LedgerIntegrity { approver: alice.clone() };
        assert_eq!(e.category(), ErrorCategory::LedgerIntegrity);
        assert_eq!(e.approver(), Some(&alice));
        let e = GateError::Notarization { approver: alice, source: TransportError::Request("boom".into()) };
        assert_eq!(e.category(), ErrorCategory::Notarization);
        assert!(std::error::Error::source(&e).is_some_and(|s| s.to_string().contains("boom")));
    }

    #[test]
    fn cause_is_printed_once_in_the_full_chain() {
        let alice = ApproverIdentity::from_str("alice");
        let cases = [
            GateError::Notarization { approver: alice.clone(), source: TransportError::Request("sign rejected".into()) },
            GateError::Verification { approver: alice.clone(), source: TransportError::Connect("sign rejected".into()) },
            GateError::Directory {
                approver: alice,
                source: DirectoryError::Transport {
                    method: "GET".into(),
                    url: "https://dir.example/api_keys/identity/alice@github".into(),
                    message: "sign rejected".into(),
                },
            },
        ];
        for e in cases {
            let full = format!("{:#}", anyhow::Error::from(e));
            assert_eq!(full.matches("sign rejected").count(), 1, "{full}");
            assert!(full.contains("approver alice: "), "{full}");
        }
    }
}
