use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GateError, TransportError};
use crate::ids::{ApproverIdentity, SignerId};
use crate::model::{ArtifactDescriptor, Credential, LedgerRecord, Lookup, TrustStatus};
use crate::reconcile::CredentialMap;
use crate::traits::{LedgerSession, LedgerTransport};

/// Details of a present notarization, as read back for one approver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub status: TrustStatus,
    pub artifact_name: String,
    pub signer: SignerId,
}

/// Per-approver verification results. `None` means not notarized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalReport {
    entries: BTreeMap<ApproverIdentity, Option<Verification>>,
}

impl ApprovalReport {
    fn record(&mut self, approver: ApproverIdentity, verification: Option<Verification>) {
        self.entries.insert(approver, verification);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, approver: &ApproverIdentity) -> bool {
        self.entries.contains_key(approver)
    }

    /// Status for an approver; `None` when absent or not in the report.
    pub fn status(&self, approver: &ApproverIdentity) -> Option<TrustStatus> {
        self.entries.get(approver).and_then(|v| v.as_ref()).map(|v| v.status)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ApproverIdentity, Option<&Verification>)> {
        self.entries.iter().map(|(a, v)| (a, v.as_ref()))
    }

    pub fn approvers(&self) -> impl Iterator<Item = &ApproverIdentity> {
        self.entries.keys()
    }

    /// Approvers whose notarization reads back as `Trusted`.
    pub fn notarized(&self) -> Vec<&ApproverIdentity> {
        self.entries
            .iter()
            .filter(|(_, v)| matches!(v, Some(v) if v.status == TrustStatus::Trusted))
            .map(|(a, _)| a)
            .collect()
    }

    /// Approvers that are absent or carry any status other than `Trusted`.
    pub fn outstanding(&self) -> Vec<&ApproverIdentity> {
        self.entries
            .iter()
            .filter(|(_, v)| !matches!(v, Some(v) if v.status == TrustStatus::Trusted))
            .map(|(a, _)| a)
            .collect()
    }

    /// Unanimity over a non-empty report.
    pub fn all_trusted(&self) -> bool {
        !self.entries.is_empty() && self.outstanding().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notarization {
    Recorded { approver: ApproverIdentity, record: LedgerRecord },
    Skipped { approver: ApproverIdentity },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub notarization: Notarization,
    pub report: ApprovalReport,
}

/// Notarizes for the acting approver (if required) and verifies every required approver.
pub struct ApprovalEngine<'a> {
    ledger: &'a dyn LedgerTransport,
}

impl<'a> ApprovalEngine<'a> {
    pub fn new(ledger: &'a dyn LedgerTransport) -> Self {
        Self { ledger }
    }

    pub fn run(
        &self,
        artifact: &ArtifactDescriptor,
        credentials: &CredentialMap,
        acting: &ApproverIdentity,
    ) -> Result<Outcome, GateError> {
        let notarization = self.notarize_if_required(artifact, credentials, acting)?;

        info!(required = credentials.len(), hash = %artifact.hash, "verifying notarizations");
        let mut report = ApprovalReport::default();
        for (approver, credential) in credentials {
            let verification = self.verify(approver, credential, &artifact.hash)?;
            report.record(approver.clone(), verification);
        }

        let success = report.len() == credentials.len() && report.all_trusted();
        Ok(Outcome { success, notarization, report })
    }

    /// Notarize under the acting approver's credential, or skip when that approver is not required.
    pub fn notarize_if_required(
        &self,
        artifact: &ArtifactDescriptor,
        credentials: &CredentialMap,
        acting: &ApproverIdentity,
    ) -> Result<Notarization, GateError> {
        let Some(credential) = credentials.get(acting) else {
            info!(approver = %acting, "skipping notarization: approver is not required");
            return Ok(Notarization::Skipped { approver: acting.clone() });
        };

        let record = self
            .with_session(credential, |session| session.sign(artifact, TrustStatus::Trusted))
            .map_err(|source| GateError::Notarization { approver: acting.clone(), source })?;
        info!(approver = %acting, signer = %record.signer, name = %record.name, "notarized");
        Ok(Notarization::Recorded { approver: acting.clone(), record })
    }

    /// Point-in-time read of one approver's notarization of `hash`.
    pub fn verify(
        &self,
        approver: &ApproverIdentity,
        credential: &Credential,
        hash: &str,
    ) -> Result<Option<Verification>, GateError> {
        let lookup = self
            .with_session(credential, |session| session.load_artifact(hash))
            .map_err(|source| GateError::Verification { approver: approver.clone(), source })?;

        match lookup {
            Lookup::NotFound => {
                info!(%approver, "not notarized");
                Ok(None)
            }
            Lookup::Found { verified: false, .. } => Err(GateError::LedgerIntegrity { approver: approver.clone() }),
            Lookup::Found { record, verified: true } => {
                let status = record.effective_status();
                if status != record.status {
                    debug!(%approver, reported = %record.status, "API key revoked; overriding status");
                }
                info!(%approver, %status, "verified");
                Ok(Some(Verification { status, artifact_name: record.name, signer: record.signer }))
            }
        }
    }

    fn with_session<T>(
        &self,
        credential: &Credential,
        op: impl FnOnce(&mut dyn LedgerSession) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        let mut session = self.ledger.connect(credential)?;
        let result = op(session.as_mut());
        if let Err(e) = session.disconnect() {
            warn!(key_id = %credential.id, "ledger disconnect failed: {e}");
        }
        result
    }
}
