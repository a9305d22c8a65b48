use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use prgate_core::{ArtifactDescriptor, ArtifactExtractor};
use sha2::{Digest, Sha256};
use tracing::debug;

pub const GIT_KIND: &str = "git";

/// Describes the HEAD commit of a git working copy.
///
/// The content hash is the SHA-256 of the raw commit object, so it changes
/// with the tree, the parents, and the commit metadata.
#[derive(Clone, Debug, Default)]
pub struct GitArtifactExtractor;

impl GitArtifactExtractor {
    pub fn new() -> Self {
        Self
    }

    fn run(repo: &Path, args: &[&str]) -> Result<Vec<u8>> {
        let mut cmd = Command::new(args[0]);
        cmd.args(&args[1..]).current_dir(repo);
        let out = cmd.output().with_context(|| format!("run {:?}", args))?;
        if !out.status.success() {
            return Err(anyhow!(
                "command failed: {:?}\nstdout:{}\nstderr:{}",
                args,
                String::from_utf8_lossy(&out.stdout),
                String::from_utf8_lossy(&out.stderr)
            ));
        }
        Ok(out.stdout)
    }

    fn head_commit(repo: &Path) -> Result<String> {
        let out = Self::run(repo, &["git", "rev-parse", "--verify", "HEAD^{commit}"])?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }

    fn repo_name(repo: &Path) -> String {
        let resolved = repo.canonicalize().unwrap_or_else(|_| repo.to_path_buf());
        resolved
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("repo")
            .to_string()
    }
}

impl ArtifactExtractor for GitArtifactExtractor {
    fn extract(&self, repo: &Path) -> Result<Vec<ArtifactDescriptor>> {
        let commit = Self::head_commit(repo).with_context(|| format!("resolve HEAD of {}", repo.display()))?;
        let raw = Self::run(repo, &["git", "cat-file", "commit", &commit])?;
        let hash = hex::encode(Sha256::digest(&raw));
        let short = &commit[..commit.len().min(7)];
        let name = format!("git://{}@{}", Self::repo_name(repo), short);
        debug!(%name, %hash, "extracted git artifact");

        let mut metadata = BTreeMap::new();
        metadata.insert("commit".to_string(), commit.clone());

        Ok(vec![ArtifactDescriptor { kind: GIT_KIND.to_string(), name, hash, size: raw.len() as u64, metadata }])
    }
}
