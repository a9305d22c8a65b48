use std::path::Path;

use anyhow::Result;

use crate::error::{DirectoryError, TransportError};
use crate::ids::{CredentialId, SignerId};
use crate::model::{ArtifactDescriptor, Credential, LedgerRecord, Lookup, TrustStatus};

/// Key-management directory: one API key per signer.
pub trait CredentialDirectory {
    /// `Ok(None)` when the signer has no key yet.
    fn lookup(&self, signer: &SignerId) -> Result<Option<Credential>, DirectoryError>;

    fn create(&self, signer: &SignerId) -> Result<Credential, DirectoryError>;

    /// Invalidate the current secret and issue a new one under the same id.
    fn rotate(&self, id: &CredentialId) -> Result<Credential, DirectoryError>;
}

/// Ledger client factory. One session is opened per notarization or verification.
pub trait LedgerTransport {
    fn connect<'a>(&'a self, credential: &Credential) -> Result<Box<dyn LedgerSession + 'a>, TransportError>;
}

/// Connected ledger client, scoped to the signer of the credential it was opened with.
pub trait LedgerSession {
    fn sign(&mut self, artifact: &ArtifactDescriptor, status: TrustStatus) -> Result<LedgerRecord, TransportError>;

    fn load_artifact(&mut self, hash: &str) -> Result<Lookup, TransportError>;

    fn disconnect(self: Box<Self>) -> Result<(), TransportError>;
}

/// Produces artifact descriptors for a version-controlled working copy.
pub trait ArtifactExtractor {
    fn extract(&self, repo: &Path) -> Result<Vec<ArtifactDescriptor>>;
}
