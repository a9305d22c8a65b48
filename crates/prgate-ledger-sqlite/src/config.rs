use std::path::PathBuf;

/// Ledger endpoint plus the local state directory the transport may use.
///
/// Built once per run and handed to the transport constructor.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub host: String,
    pub port: String,
    pub no_tls: bool,
    pub store_dir: PathBuf,
}

impl LedgerConfig {
    /// One database per endpoint, so runs against different ledgers never mix.
    pub fn db_path(&self) -> PathBuf {
        self.store_dir
            .join(format!("ledger-{}-{}.db", sanitize(&self.host), sanitize(&self.port)))
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}
