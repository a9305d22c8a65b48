use tracing::warn;

use crate::error::InputError;
use crate::ids::{CredentialId, SignerId};
use crate::model::Credential;
use crate::reconcile::CredentialMap;

/// Decode a comma-separated list of already-minted API keys (`<signerId>.<secret>`).
///
/// The approver is the signer ID with the platform suffix stripped. No
/// directory is consulted. Two keys decoding to the same approver are rejected.
pub fn parse_supplied_credentials(list: &str, identity_suffix: &str) -> Result<CredentialMap, InputError> {
    let mut credentials = CredentialMap::new();
    for (position, entry) in list.split(',').enumerate() {
        let entry = entry.trim();
        if entry.is_empty() {
            warn!(position, "skipping empty credential in the list of supplied credentials");
            continue;
        }

        let signer = SignerId::from_api_key(entry).ok_or(InputError::MalformedCredential { position })?;
        let approver = signer.approver(identity_suffix);
        if approver.as_str().is_empty() {
            return Err(InputError::MalformedCredential { position });
        }

        let credential = Credential { id: CredentialId::from_str(signer.as_str()), secret: entry.to_string() };
        if credentials.insert(approver.clone(), credential).is_some() {
            return Err(InputError::DuplicateIdentity(approver));
        }
    }
    if credentials.is_empty() {
        return Err(InputError::NoRequiredApprovers);
    }
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ApproverIdentity;

    #[test]
    fn decodes_identity_from_qualified_key() {
        let creds = parse_supplied_credentials("alice@github.XYZ, bob@github.ABC", "@github").unwrap();
        assert_eq!(creds.len(), 2);
        let alice = &creds[&ApproverIdentity::from_str("alice")];
        assert_eq!(alice.id.as_str(), "alice@github");
        assert_eq!(alice.secret, "alice@github.XYZ");
        assert!(creds.contains_key(&ApproverIdentity::from_str("bob")));
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let err = parse_supplied_credentials("alice@github.XYZ,alice@github.ABC", "@github").unwrap_err();
        assert_eq!(err, InputError::DuplicateIdentity(ApproverIdentity::from_str("alice")));
    }

    #[test]
    fn malformed_entry_reports_its_position() {
        let err = parse_supplied_credentials("alice@github.XYZ,bob-without-secret", "@github").unwrap_err();
        assert_eq!(err, InputError::MalformedCredential { position: 1 });
        // never echo the secret back
        assert!(!err.to_string().contains("XYZ"));
    }

    #[test]
    fn suffix_only_signer_is_malformed() {
        let err = parse_supplied_credentials("@github.XYZ", "@github").unwrap_err();
        assert_eq!(err, InputError::MalformedCredential { position: 0 });
    }

    #[test]
    fn empty_positions_are_skipped() {
        let creds = parse_supplied_credentials(",alice@github.XYZ,,", "@github").unwrap();
        assert_eq!(creds.len(), 1);
        assert!(matches!(parse_supplied_credentials(" , ", "@github"), Err(InputError::NoRequiredApprovers)));
    }
}
