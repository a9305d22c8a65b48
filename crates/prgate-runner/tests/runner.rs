use std::path::Path;

use prgate_core::{ApproverIdentity, ErrorCategory, GateError, Notarization, TrustStatus};
use prgate_runner::{GateConfig, ManagedArgs, Runner, SuppliedArgs};
use prgate_vcs_git::fixture::init_git_repo;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(repo: &Path, store: &Path) -> GateConfig {
    GateConfig {
        repo_path: repo.display().to_string(),
        store_dir: store.display().to_string(),
        ..GateConfig::default()
    }
}

fn supplied(credentials: &str, approver: &str) -> SuppliedArgs {
    SuppliedArgs::parse("ledger.example", "3324", "true", credentials, approver).unwrap()
}

async fn mount_existing_key(server: &MockServer, signer: &str, key_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api_keys/identity/{signer}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "items": [{"id": key_id, "key": format!("{signer}.old")}]
        })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/ledgers/ledger-1/api_keys/{key_id}/rotate")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": key_id, "key": format!("{signer}.rotated")})),
        )
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn managed_runs_converge_once_every_approver_has_notarized() {
    let server = MockServer::start().await;
    mount_existing_key(&server, "alice@github", "k-a").await;
    mount_existing_key(&server, "bob@github", "k-b").await;

    let repo = tempdir().unwrap();
    let store = tempdir().unwrap();
    init_git_repo(repo.path()).unwrap();
    let cfg = config(repo.path(), &store.path().join("state"));
    let url = server.uri();

    let (first, second) = tokio::task::spawn_blocking(move || {
        let runner = Runner::new(cfg);
        let args = |approver: &str| {
            ManagedArgs::parse(&url, "tok", "ledger.example", "3324", "", "ledger-1", "alice, bob", approver).unwrap()
        };
        let first = runner.run_managed(&args("alice")).unwrap();
        let second = runner.run_managed(&args("bob")).unwrap();
        (first, second)
    })
    .await
    .unwrap();

    assert!(!first.outcome.success);
    let outstanding: Vec<_> = first.outcome.report.outstanding().into_iter().map(|a| a.as_str()).collect();
    assert_eq!(outstanding, vec!["bob"]);

    assert!(second.outcome.success);
    assert_eq!(second.artifact, first.artifact);
    assert!(matches!(second.outcome.notarization, Notarization::Recorded { ref approver, .. } if approver.as_str() == "bob"));
}

#[tokio::test(flavor = "multi_thread")]
async fn managed_run_surfaces_directory_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api_keys/identity/alice@github"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let repo = tempdir().unwrap();
    let store = tempdir().unwrap();
    let cfg = config(repo.path(), store.path());
    let url = server.uri();

    let err = tokio::task::spawn_blocking(move || {
        let args =
            ManagedArgs::parse(&url, "tok", "ledger.example", "3324", "", "ledger-1", "alice", "alice").unwrap();
        Runner::new(cfg).run_managed(&args).unwrap_err()
    })
    .await
    .unwrap();

    let gate = err.downcast_ref::<GateError>().unwrap();
    assert_eq!(gate.category(), ErrorCategory::Directory);
    let full = format!("{err:#}");
    assert_eq!(full.matches("bad token").count(), 1, "{full}");
    assert!(full.contains("credential for approver alice: GET "), "{full}");
}

#[test]
fn supplied_run_notarizes_for_required_approver() {
    let repo = tempdir().unwrap();
    let store = tempdir().unwrap();
    init_git_repo(repo.path()).unwrap();
    let runner = Runner::new(config(repo.path(), store.path()));

    let run = runner.run_supplied(&supplied("alice@github.s1", "alice")).unwrap();
    assert!(run.outcome.success);
    assert_eq!(run.outcome.report.status(&ApproverIdentity::from_str("alice")), Some(TrustStatus::Trusted));
}

#[test]
fn supplied_run_for_non_required_approver_only_verifies() {
    let repo = tempdir().unwrap();
    let store = tempdir().unwrap();
    init_git_repo(repo.path()).unwrap();
    let runner = Runner::new(config(repo.path(), store.path()));

    let run = runner.run_supplied(&supplied("alice@github.s1,bob@github.s2", "carol")).unwrap();
    assert!(matches!(run.outcome.notarization, Notarization::Skipped { .. }));
    assert!(!run.outcome.success);
    assert_eq!(run.outcome.report.outstanding().len(), 2);
}

#[test]
fn duplicate_supplied_credentials_are_an_input_error() {
    let repo = tempdir().unwrap();
    let store = tempdir().unwrap();
    let runner = Runner::new(config(repo.path(), store.path()));

    let err = runner.run_supplied(&supplied("alice@github.k1,alice@github.k2", "alice")).unwrap_err();
    let gate = err.downcast_ref::<GateError>().unwrap();
    assert_eq!(gate.category(), ErrorCategory::Input);
    assert!(!store.path().join("ledger-ledger.example-3324.db").exists());
}

#[test]
fn missing_repository_is_reported() {
    let repo = tempdir().unwrap();
    let store = tempdir().unwrap();
    let runner = Runner::new(config(repo.path(), store.path()));

    let err = runner.run_supplied(&supplied("alice@github.s1", "alice")).unwrap_err();
    assert!(err.downcast_ref::<GateError>().is_none());
    assert!(format!("{err:#}").contains("extract artifact"));
}
