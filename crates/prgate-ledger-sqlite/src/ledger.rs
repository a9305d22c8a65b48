use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use prgate_core::{
    ArtifactDescriptor, Credential, LedgerRecord, LedgerSession, LedgerTransport, Lookup, SignerId, TransportError,
    TrustStatus,
};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::LedgerConfig;

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// File-backed ledger. Each session opens its own connection and closes it on disconnect.
pub struct SqliteLedger {
    db_path: PathBuf,
}

impl SqliteLedger {
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        let db_path = config.db_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let conn = Connection::open(&db_path).with_context(|| format!("open sqlite db {}", db_path.display()))?;
        conn.execute_batch(include_str!("../migrations/0001_init.sql"))
            .with_context(|| "init ledger schema")?;
        debug!(db = %db_path.display(), no_tls = config.no_tls, "ledger opened");
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Mark every key of `signer` as revoked at `revoked_at` (unix seconds).
    pub fn revoke_signer(&self, signer: &SignerId, revoked_at: i64) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO revocations(signer, revoked_at) VALUES (?1, ?2)
             ON CONFLICT(signer) DO UPDATE SET revoked_at = excluded.revoked_at",
            params![signer.as_str(), revoked_at],
        )?;
        Ok(())
    }
}

impl LedgerTransport for SqliteLedger {
    fn connect<'a>(&'a self, credential: &Credential) -> Result<Box<dyn LedgerSession + 'a>, TransportError> {
        let signer = SignerId::from_api_key(&credential.secret)
            .ok_or_else(|| TransportError::Connect(format!("malformed API key for {}", credential.id)))?;
        let conn = Connection::open(&self.db_path).map_err(|e| TransportError::Connect(e.to_string()))?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Box::new(SqliteSession { conn, signer }))
    }
}

struct SqliteSession {
    conn: Connection,
    signer: SignerId,
}

impl LedgerSession for SqliteSession {
    fn sign(&mut self, artifact: &ArtifactDescriptor, status: TrustStatus) -> Result<LedgerRecord, TransportError> {
        let record = LedgerRecord::for_artifact(artifact, self.signer.clone(), status, now_unix());
        self.conn
            .execute(
                "INSERT INTO notarizations(signer, hash, kind, name, size, status, created_at, digest)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(signer, hash) DO UPDATE SET
                   kind = excluded.kind, name = excluded.name, size = excluded.size,
                   status = excluded.status, created_at = excluded.created_at, digest = excluded.digest",
                params![
                    record.signer.as_str(),
                    record.hash,
                    record.kind,
                    record.name,
                    record.size as i64,
                    record.status.as_str(),
                    record.timestamp,
                    record_digest(&record),
                ],
            )
            .map_err(|e| TransportError::Request(format!("sign: {e}")))?;
        Ok(record)
    }

    fn load_artifact(&mut self, hash: &str) -> Result<Lookup, TransportError> {
        let row = self
            .conn
            .query_row(
                "SELECT n.kind, n.name, n.size, n.status, n.created_at, n.digest, r.revoked_at
                 FROM notarizations n LEFT JOIN revocations r ON r.signer = n.signer
                 WHERE n.signer = ?1 AND n.hash = ?2",
                params![self.signer.as_str(), hash],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, i64>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, i64>(4)?,
                        r.get::<_, String>(5)?,
                        r.get::<_, Option<i64>>(6)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| TransportError::Request(format!("load artifact: {e}")))?;

        let Some((kind, name, size, status, created_at, digest, revoked_at)) = row else {
            return Ok(Lookup::NotFound);
        };

        let parsed = TrustStatus::parse(&status);
        let record = LedgerRecord {
            kind,
            name,
            hash: hash.to_string(),
            size: size.max(0) as u64,
            signer: self.signer.clone(),
            status: parsed.unwrap_or(TrustStatus::Unknown),
            timestamp: created_at,
            revoked_at,
        };
        let verified = parsed.is_some() && record_digest(&record) == digest;
        Ok(Lookup::Found { record, verified })
    }

    fn disconnect(self: Box<Self>) -> Result<(), TransportError> {
        self.conn
            .close()
            .map_err(|(_, e)| TransportError::Request(format!("close: {e}")))
    }
}

/// SHA-256 over the notarized fields. Revocation is tracked separately and not covered.
pub fn record_digest(record: &LedgerRecord) -> String {
    let size = record.size.to_string();
    let timestamp = record.timestamp.to_string();
    let mut hasher = Sha256::new();
    for field in [
        record.kind.as_str(),
        record.name.as_str(),
        record.hash.as_str(),
        size.as_str(),
        record.signer.as_str(),
        record.status.as_str(),
        timestamp.as_str(),
    ] {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

pub fn now_unix() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
