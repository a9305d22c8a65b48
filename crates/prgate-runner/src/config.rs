use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use prgate_core::DEFAULT_IDENTITY_SUFFIX;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Working copy whose HEAD commit is notarized.
    pub repo_path: String,
    /// Appended to approver names to form signer IDs.
    pub identity_suffix: String,
    pub http_timeout_secs: u64,
    /// Local state for the ledger transport. `~` is expanded.
    pub store_dir: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            repo_path: "/github/workspace".to_string(),
            identity_suffix: DEFAULT_IDENTITY_SUFFIX.to_string(),
            http_timeout_secs: 30,
            store_dir: "./.prgate".to_string(),
        }
    }
}

impl GateConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: GateConfig = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        cfg.validate().with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_timeout_secs == 0 {
            bail!("http_timeout_secs must be greater than 0");
        }
        Ok(())
    }

    /// `load_from` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn store_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store_dir).to_string())
    }

    pub fn repo_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.repo_path).to_string())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("prgate.toml");
        let cfg = GateConfig { repo_path: "/work/repo".into(), http_timeout_secs: 5, ..GateConfig::default() };
        cfg.save_to(&path).unwrap();
        assert_eq!(GateConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prgate.toml");
        std::fs::write(&path, "identity_suffix = \"@gitlab\"\n").unwrap();
        let cfg = GateConfig::load_from(&path).unwrap();
        assert_eq!(cfg.identity_suffix, "@gitlab");
        assert_eq!(cfg.http_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.repo_path, "/github/workspace");
    }

    #[test]
    fn tilde_store_dir_is_expanded() {
        let Some(home) = std::env::var_os("HOME") else { return };
        let cfg = GateConfig { store_dir: "~/.prgate".into(), ..GateConfig::default() };
        assert_eq!(cfg.store_dir(), PathBuf::from(home).join(".prgate"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prgate.toml");
        std::fs::write(&path, "http_timeout_secs = 0\n").unwrap();
        let err = GateConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("http_timeout_secs must be greater than 0"));
    }

    #[test]
    fn save_reports_the_directory_it_cannot_create() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let parent = blocker.join("conf");
        let err = GateConfig::default().save_to(&parent.join("prgate.toml")).unwrap_err();
        assert!(err.to_string().contains(&format!("create {}", parent.display())));
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(GateConfig::load_or_default(None).unwrap(), GateConfig::default());
    }
}
