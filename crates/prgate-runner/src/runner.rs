use anyhow::{anyhow, Context, Result};
use prgate_core::{
    parse_supplied_credentials, split_list, ApprovalEngine, ApproverIdentity, ArtifactDescriptor, ArtifactExtractor,
    CredentialMap, CredentialReconciler, GateError, Outcome,
};
use prgate_directory::{DirectoryConfig, HttpDirectory};
use prgate_ledger_sqlite::{LedgerConfig, SqliteLedger};
use prgate_vcs_git::GitArtifactExtractor;
use serde::Serialize;
use tracing::{info, warn};

use crate::args::{LedgerEndpoint, ManagedArgs, SuppliedArgs};
use crate::config::GateConfig;

/// Result of one gate run: the artifact that was checked and what the engine decided.
#[derive(Clone, Debug, Serialize)]
pub struct GateRun {
    pub artifact: ArtifactDescriptor,
    pub outcome: Outcome,
}

/// Wires the directory, the artifact extractor and the ledger together for one run.
///
/// Errors are `anyhow` at this layer, but a `GateError` stays recoverable with
/// `downcast_ref` so callers can tell its category.
pub struct Runner {
    cfg: GateConfig,
    extractor: Box<dyn ArtifactExtractor>,
}

impl Runner {
    pub fn new(cfg: GateConfig) -> Self {
        Self { cfg, extractor: Box::new(GitArtifactExtractor::new()) }
    }

    pub fn with_extractor(cfg: GateConfig, extractor: Box<dyn ArtifactExtractor>) -> Self {
        Self { cfg, extractor }
    }

    pub fn config(&self) -> &GateConfig {
        &self.cfg
    }

    /// Reconcile credentials through the directory, then notarize and verify.
    pub fn run_managed(&self, args: &ManagedArgs) -> Result<GateRun> {
        let directory = HttpDirectory::new(DirectoryConfig {
            base_url: args.directory_url.clone(),
            token: args.token.clone(),
            ledger_id: args.ledger_id.clone(),
            timeout: self.cfg.http_timeout(),
        })
        .context("build directory client")?;

        let required = split_list(&args.required_approvers);
        let credentials = CredentialReconciler::new(&directory, self.cfg.identity_suffix.as_str()).reconcile(&required)?;
        info!(count = credentials.len(), "credentials reconciled");

        self.finish(&args.ledger, &credentials, &args.approver)
    }

    /// Use already-minted credentials; the directory is never contacted.
    pub fn run_supplied(&self, args: &SuppliedArgs) -> Result<GateRun> {
        let credentials =
            parse_supplied_credentials(&args.credentials, &self.cfg.identity_suffix).map_err(GateError::from)?;
        info!(count = credentials.len(), "using supplied credentials");

        self.finish(&args.ledger, &credentials, &args.approver)
    }

    fn finish(&self, endpoint: &LedgerEndpoint, credentials: &CredentialMap, approver: &str) -> Result<GateRun> {
        let repo = self.cfg.repo_path();
        let artifact = self
            .extractor
            .extract(&repo)
            .with_context(|| format!("extract artifact from {}", repo.display()))?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no artifact found in {}", repo.display()))?;

        let store_dir = self.cfg.store_dir();
        if let Err(e) = std::fs::create_dir_all(&store_dir) {
            warn!(dir = %store_dir.display(), "cannot create store dir: {e}");
        }

        let ledger = SqliteLedger::open(&LedgerConfig {
            host: endpoint.host.clone(),
            port: endpoint.port.clone(),
            no_tls: endpoint.no_tls,
            store_dir,
        })?;

        let acting = ApproverIdentity::from_str(approver);
        let outcome = ApprovalEngine::new(&ledger).run(&artifact, credentials, &acting)?;
        info!(success = outcome.success, name = %artifact.name, "gate run finished");
        Ok(GateRun { artifact, outcome })
    }
}
