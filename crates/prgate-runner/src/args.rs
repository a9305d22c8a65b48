use prgate_core::InputError;

/// Trimmed value of a required argument; empty is an input error naming the argument.
pub fn require_arg(name: &str, value: &str) -> Result<String, InputError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(InputError::EmptyArgument(name.to_string()));
    }
    Ok(value.to_string())
}

/// Boolean flag in the usual spellings. An empty value means `false`.
pub fn parse_flag(name: &str, value: &str) -> Result<bool, InputError> {
    match value.trim() {
        "" => Ok(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(InputError::InvalidFlag { name: name.to_string(), value: other.to_string() }),
    }
}

/// Ledger endpoint arguments shared by both modes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEndpoint {
    pub host: String,
    pub port: String,
    pub no_tls: bool,
}

impl LedgerEndpoint {
    pub fn parse(host: &str, port: &str, no_tls: &str) -> Result<Self, InputError> {
        Ok(Self {
            host: require_arg("ledger host", host)?,
            port: require_arg("ledger port", port)?,
            no_tls: parse_flag("no TLS", no_tls)?,
        })
    }
}

/// Credentials minted through the key-management directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedArgs {
    pub directory_url: String,
    pub token: String,
    pub ledger: LedgerEndpoint,
    pub ledger_id: String,
    pub required_approvers: String,
    pub approver: String,
}

impl ManagedArgs {
    #[allow(clippy::too_many_arguments)]
    pub fn parse(
        directory_url: &str,
        token: &str,
        host: &str,
        port: &str,
        no_tls: &str,
        ledger_id: &str,
        required_approvers: &str,
        approver: &str,
    ) -> Result<Self, InputError> {
        Ok(Self {
            directory_url: require_arg("directory REST API URL", directory_url)?.trim_end_matches('/').to_string(),
            token: require_arg("directory REST API personal token", token)?,
            ledger: LedgerEndpoint::parse(host, port, no_tls)?,
            ledger_id: require_arg("ledger ID", ledger_id)?,
            required_approvers: require_arg("required PR approvers", required_approvers)?,
            approver: require_arg("PR approver", approver)?,
        })
    }
}

/// Already-minted credentials; no directory involved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuppliedArgs {
    pub ledger: LedgerEndpoint,
    pub credentials: String,
    pub approver: String,
}

impl SuppliedArgs {
    pub fn parse(host: &str, port: &str, no_tls: &str, credentials: &str, approver: &str) -> Result<Self, InputError> {
        Ok(Self {
            ledger: LedgerEndpoint::parse(host, port, no_tls)?,
            credentials: require_arg("required PR approvers credentials", credentials)?,
            approver: require_arg("PR approver", approver)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_values_are_trimmed() {
        assert_eq!(require_arg("x", "  v ").unwrap(), "v");
        assert_eq!(require_arg("PR approver", "   "), Err(InputError::EmptyArgument("PR approver".into())));
    }

    #[test]
    fn flag_spellings() {
        assert!(parse_flag("no TLS", "true").unwrap());
        assert!(parse_flag("no TLS", "1").unwrap());
        assert!(!parse_flag("no TLS", "").unwrap());
        assert!(!parse_flag("no TLS", "F").unwrap());
        assert!(matches!(parse_flag("no TLS", "yes"), Err(InputError::InvalidFlag { .. })));
    }

    #[test]
    fn managed_args_trim_trailing_slash() {
        let args = ManagedArgs::parse(
            "https://dir.example/api/",
            "tok",
            "ledger.example",
            "443",
            "",
            "l1",
            "alice,bob",
            "alice",
        )
        .unwrap();
        assert_eq!(args.directory_url, "https://dir.example/api");
        assert!(!args.ledger.no_tls);
    }

    #[test]
    fn first_empty_argument_is_reported() {
        let err = ManagedArgs::parse("https://d", "", "h", "1", "", "l1", "alice", "alice").unwrap_err();
        assert_eq!(err, InputError::EmptyArgument("directory REST API personal token".into()));
    }

    #[test]
    fn supplied_args_reject_bad_flag() {
        let err = SuppliedArgs::parse("h", "1", "maybe", "alice@github.k", "alice").unwrap_err();
        assert!(matches!(err, InputError::InvalidFlag { ref value, .. } if value == "maybe"));
    }
}
