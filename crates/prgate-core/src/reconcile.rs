use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::{DirectoryError, GateError, InputError};
use crate::ids::{ApproverIdentity, SignerId};
use crate::model::Credential;
use crate::traits::CredentialDirectory;

/// Platform suffix appended to a bare username to form its signer ID.
pub const DEFAULT_IDENTITY_SUFFIX: &str = "@github";

/// Approver -> credential, keyed by the bare (unsuffixed) identity.
pub type CredentialMap = BTreeMap<ApproverIdentity, Credential>;

/// Split a comma-separated list without trimming; positions are preserved for diagnostics.
pub fn split_list(list: &str) -> Vec<&str> {
    list.split(',').collect()
}

/// Normalize the raw required-approver list.
///
/// Entries are trimmed. Empty positions are skipped with a warning. Duplicates
/// and an empty result are input errors.
pub fn required_approvers<S: AsRef<str>>(raw: &[S]) -> Result<Vec<ApproverIdentity>, InputError> {
    let mut approvers: Vec<ApproverIdentity> = Vec::with_capacity(raw.len());
    for (position, entry) in raw.iter().enumerate() {
        let entry = entry.as_ref().trim();
        if entry.is_empty() {
            warn!(position, "skipping empty approver in the list of required approvers");
            continue;
        }
        let approver = ApproverIdentity::from_str(entry);
        if approvers.contains(&approver) {
            return Err(InputError::DuplicateIdentity(approver));
        }
        approvers.push(approver);
    }
    if approvers.is_empty() {
        return Err(InputError::NoRequiredApprovers);
    }
    Ok(approvers)
}

/// Ensures every required approver holds exactly one freshly issued credential.
pub struct CredentialReconciler<'a> {
    directory: &'a dyn CredentialDirectory,
    identity_suffix: String,
}

impl<'a> CredentialReconciler<'a> {
    pub fn new(directory: &'a dyn CredentialDirectory, identity_suffix: impl Into<String>) -> Self {
        Self { directory, identity_suffix: identity_suffix.into() }
    }

    /// Rotate each approver's existing key, or create one when none exists.
    ///
    /// Fails on the first directory error; no partial map is returned.
    pub fn reconcile<S: AsRef<str>>(&self, required: &[S]) -> Result<CredentialMap, GateError> {
        let approvers = required_approvers(required)?;

        let mut credentials = CredentialMap::new();
        for approver in approvers {
            let signer = SignerId::qualify(&approver, &self.identity_suffix);
            let credential = self
                .obtain(&signer)
                .map_err(|source| GateError::Directory { approver: approver.clone(), source })?;
            credentials.insert(approver, credential);
        }
        Ok(credentials)
    }

    fn obtain(&self, signer: &SignerId) -> Result<Credential, DirectoryError> {
        match self.directory.lookup(signer)? {
            Some(existing) => {
                debug!(%signer, key_id = %existing.id, "rotating existing API key");
                let rotated = self.directory.rotate(&existing.id)?;
                info!(%signer, key_id = %rotated.id, "rotated API key");
                Ok(rotated)
            }
            None => {
                let created = self.directory.create(signer)?;
                info!(%signer, key_id = %created.id, "created API key");
                Ok(created)
            }
        }
    }
}
