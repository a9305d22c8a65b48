//! In-memory collaborators for tests and dry runs. Not durable.
//!
//! Both fakes record every call they receive so callers can assert call
//! counts and ordering.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DirectoryError, TransportError};
use crate::ids::{CredentialId, SignerId};
use crate::model::{ArtifactDescriptor, Credential, LedgerRecord, Lookup, TrustStatus};
use crate::traits::{CredentialDirectory, LedgerSession, LedgerTransport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryCall {
    Lookup(SignerId),
    Create(SignerId),
    Rotate(CredentialId),
}

#[derive(Default)]
pub struct InMemoryDirectory {
    keys: RefCell<BTreeMap<SignerId, Credential>>,
    calls: RefCell<Vec<DirectoryCall>>,
    issued: Cell<u64>,
    fail_creates: Cell<bool>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing key for `signer` without recording a call.
    pub fn seed(&self, signer: &str) -> Credential {
        let signer = SignerId::from_str(signer);
        let credential = Credential::new(format!("key-{}", self.keys.borrow().len() + 1), self.mint(&signer));
        self.keys.borrow_mut().insert(signer, credential.clone());
        credential
    }

    pub fn fail_creates(&self) {
        self.fail_creates.set(true);
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.borrow().clone()
    }

    pub fn create_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| matches!(c, DirectoryCall::Create(_))).count()
    }

    pub fn rotate_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| matches!(c, DirectoryCall::Rotate(_))).count()
    }

    fn mint(&self, signer: &SignerId) -> String {
        let n = self.issued.get() + 1;
        self.issued.set(n);
        format!("{}.secret{}", signer.as_str(), n)
    }
}

impl CredentialDirectory for InMemoryDirectory {
    fn lookup(&self, signer: &SignerId) -> Result<Option<Credential>, DirectoryError> {
        self.calls.borrow_mut().push(DirectoryCall::Lookup(signer.clone()));
        Ok(self.keys.borrow().get(signer).cloned())
    }

    fn create(&self, signer: &SignerId) -> Result<Credential, DirectoryError> {
        self.calls.borrow_mut().push(DirectoryCall::Create(signer.clone()));
        if self.fail_creates.get() {
            return Err(DirectoryError::UnexpectedStatus {
                method: "POST".into(),
                url: "memory://api_keys".into(),
                expected: 201,
                actual: 500,
                body: "create disabled".into(),
            });
        }
        let credential = Credential::new(format!("key-{}", self.keys.borrow().len() + 1), self.mint(signer));
        self.keys.borrow_mut().insert(signer.clone(), credential.clone());
        Ok(credential)
    }

    fn rotate(&self, id: &CredentialId) -> Result<Credential, DirectoryError> {
        self.calls.borrow_mut().push(DirectoryCall::Rotate(id.clone()));
        let signer = self
            .keys
            .borrow()
            .iter()
            .find(|(_, c)| &c.id == id)
            .map(|(s, _)| s.clone())
            .ok_or_else(|| DirectoryError::UnexpectedStatus {
                method: "PUT".into(),
                url: format!("memory://api_keys/{id}/rotate"),
                expected: 200,
                actual: 404,
                body: "unknown key".into(),
            })?;
        let rotated = Credential { id: id.clone(), secret: self.mint(&signer) };
        self.keys.borrow_mut().insert(signer, rotated.clone());
        Ok(rotated)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerCall {
    Connect(SignerId),
    Sign { signer: SignerId, hash: String },
    Load { signer: SignerId, hash: String },
    Disconnect(SignerId),
}

/// Ledger keyed by (signer, hash); the latest notarization wins.
#[derive(Default)]
pub struct InMemoryLedger {
    records: RefCell<BTreeMap<(SignerId, String), LedgerRecord>>,
    tampered: RefCell<BTreeSet<SignerId>>,
    revoked: RefCell<BTreeMap<SignerId, i64>>,
    calls: RefCell<Vec<LedgerCall>>,
    clock: Cell<i64>,
    fail_signs: Cell<bool>,
    fail_disconnects: Cell<bool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record directly, as if notarized in an earlier run.
    pub fn insert(&self, record: LedgerRecord) {
        self.records.borrow_mut().insert((record.signer.clone(), record.hash.clone()), record);
    }

    /// Records of `signer` load with `verified = false` from now on.
    pub fn tamper(&self, signer: &str) {
        self.tampered.borrow_mut().insert(SignerId::from_str(signer));
    }

    pub fn revoke(&self, signer: &str, at: i64) {
        self.revoked.borrow_mut().insert(SignerId::from_str(signer), at);
    }

    pub fn fail_signs(&self) {
        self.fail_signs.set(true);
    }

    pub fn fail_disconnects(&self) {
        self.fail_disconnects.set(true);
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.borrow().clone()
    }

    pub fn sign_calls(&self) -> Vec<SignerId> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                LedgerCall::Sign { signer, .. } => Some(signer.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn load_calls(&self) -> Vec<SignerId> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                LedgerCall::Load { signer, .. } => Some(signer.clone()),
                _ => None,
            })
            .collect()
    }

    fn tick(&self) -> i64 {
        let t = self.clock.get() + 1;
        self.clock.set(t);
        t
    }
}

impl LedgerTransport for InMemoryLedger {
    fn connect<'a>(&'a self, credential: &Credential) -> Result<Box<dyn LedgerSession + 'a>, TransportError> {
        let signer = SignerId::from_api_key(&credential.secret)
            .ok_or_else(|| TransportError::Connect(format!("malformed API key for {}", credential.id)))?;
        self.calls.borrow_mut().push(LedgerCall::Connect(signer.clone()));
        Ok(Box::new(MemorySession { ledger: self, signer }))
    }
}

struct MemorySession<'a> {
    ledger: &'a InMemoryLedger,
    signer: SignerId,
}

impl LedgerSession for MemorySession<'_> {
    fn sign(&mut self, artifact: &ArtifactDescriptor, status: TrustStatus) -> Result<LedgerRecord, TransportError> {
        self.ledger
            .calls
            .borrow_mut()
            .push(LedgerCall::Sign { signer: self.signer.clone(), hash: artifact.hash.clone() });
        if self.ledger.fail_signs.get() {
            return Err(TransportError::Request("sign rejected".into()));
        }
        let record = LedgerRecord::for_artifact(artifact, self.signer.clone(), status, self.ledger.tick());
        self.ledger.insert(record.clone());
        Ok(record)
    }

    fn load_artifact(&mut self, hash: &str) -> Result<Lookup, TransportError> {
        self.ledger
            .calls
            .borrow_mut()
            .push(LedgerCall::Load { signer: self.signer.clone(), hash: hash.to_string() });
        let key = (self.signer.clone(), hash.to_string());
        let Some(mut record) = self.ledger.records.borrow().get(&key).cloned() else {
            return Ok(Lookup::NotFound);
        };
        record.revoked_at = self.ledger.revoked.borrow().get(&self.signer).copied();
        let verified = !self.ledger.tampered.borrow().contains(&self.signer);
        Ok(Lookup::Found { record, verified })
    }

    fn disconnect(self: Box<Self>) -> Result<(), TransportError> {
        self.ledger.calls.borrow_mut().push(LedgerCall::Disconnect(self.signer.clone()));
        if self.ledger.fail_disconnects.get() {
            return Err(TransportError::Request("disconnect failed".into()));
        }
        Ok(())
    }
}
