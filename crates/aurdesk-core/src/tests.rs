use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    descriptor_path, read_descriptor, remove_descriptor, write_descriptor, ActionLedger,
    ActionType, DescriptorError, OperationDescriptor, OperationKind, PackageRecord,
    DESCRIPTOR_SCHEMA_VERSION,
};

#[test]
fn toggle_twice_restores_the_ledger() {
    let mut ledger = ActionLedger::new();
    let before = ledger.clone();

    assert!(ledger.toggle(ActionType::Install, "ripgrep"));
    assert!(!ledger.toggle(ActionType::Install, "ripgrep"));

    assert_eq!(ledger, before);
}

#[test]
fn toggle_never_duplicates_a_name() {
    let mut ledger = ActionLedger::new();
    for _ in 0..5 {
        ledger.toggle(ActionType::Update, "bat");
    }

    assert_eq!(ledger.queued(ActionType::Update), ["bat"]);
}

#[test]
fn toggle_moves_a_name_between_classifications() {
    let mut ledger = ActionLedger::new();
    ledger.toggle(ActionType::Install, "fd");
    ledger.toggle(ActionType::Remove, "fd");

    assert!(ledger.queued(ActionType::Install).is_empty());
    assert_eq!(ledger.queued(ActionType::Remove), ["fd"]);
    assert_eq!(ledger.classification_of("fd"), Some(ActionType::Remove));
}

#[test]
fn toggle_preserves_staging_order() {
    let mut ledger = ActionLedger::new();
    ledger.toggle(ActionType::Install, "a");
    ledger.toggle(ActionType::Install, "b");
    ledger.toggle(ActionType::Install, "c");
    ledger.toggle(ActionType::Install, "b");
    ledger.toggle(ActionType::Install, "b");

    assert_eq!(ledger.queued(ActionType::Install), ["a", "c", "b"]);
}

#[test]
fn drain_empties_one_classification_and_returns_its_contents() {
    let mut ledger = ActionLedger::new();
    ledger.toggle(ActionType::Remove, "first");
    ledger.toggle(ActionType::Remove, "second");
    ledger.toggle(ActionType::Install, "kept");

    let drained = ledger.drain(ActionType::Remove);
    assert_eq!(drained, ["first", "second"]);
    assert!(ledger.queued(ActionType::Remove).is_empty());
    assert_eq!(ledger.queued(ActionType::Install), ["kept"]);

    assert!(ledger.drain(ActionType::Remove).is_empty());
}

#[test]
fn default_record_is_invalid_and_constructed_record_is_valid() {
    assert!(!PackageRecord::invalid().is_valid());

    let record = PackageRecord::new("paru", "2.0.4-1");
    assert!(record.is_valid());
    assert_eq!(record.name, "paru");
    assert_eq!(record.version, "2.0.4-1");
}

#[test]
fn descriptor_round_trips_through_the_prefix_file() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");

    let descriptor = OperationDescriptor::new(
        OperationKind::Remove,
        "/",
        "/var/lib/pacman",
        None,
        vec!["foo".to_string()],
    );
    write_descriptor(&prefix, &descriptor).expect("must write descriptor");

    let read_back = read_descriptor(&prefix).expect("must read descriptor");
    assert_eq!(read_back, descriptor);

    let raw = fs::read_to_string(descriptor_path(&prefix)).expect("must read raw descriptor");
    assert!(raw.contains("\"db-path\""));
    assert!(raw.contains("\"operation\": \"remove\""));
    assert!(!raw.contains("install-prefix"));

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn install_descriptor_serializes_its_prefix() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");

    let descriptor = OperationDescriptor::new(
        OperationKind::Install,
        "/",
        "/var/lib/pacman",
        Some(PathBuf::from("/var/tmp/aurdesk")),
        vec!["paru".to_string()],
    );
    write_descriptor(&prefix, &descriptor).expect("must write descriptor");

    let raw = fs::read_to_string(descriptor_path(&prefix)).expect("must read raw descriptor");
    assert!(raw.contains("\"install-prefix\""));

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn write_descriptor_refuses_an_already_claimed_slot() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");
    fs::write(descriptor_path(&prefix), "{}").expect("must plant leftover");

    let descriptor = OperationDescriptor::new(
        OperationKind::Remove,
        "/",
        "/var/lib/pacman",
        None,
        vec!["foo".to_string()],
    );
    let err = write_descriptor(&prefix, &descriptor).expect_err("must refuse claimed slot");
    assert!(matches!(err, DescriptorError::AlreadyClaimed { .. }));

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn read_descriptor_reports_missing_file() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");

    let err = read_descriptor(&prefix).expect_err("must report missing descriptor");
    assert!(matches!(err, DescriptorError::Missing { .. }));

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn read_descriptor_rejects_unknown_schema_version() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");
    fs::write(
        descriptor_path(&prefix),
        format!(
            "{{\"version\":{},\"operation\":\"remove\",\"root\":\"/\",\"db-path\":\"/var/lib/pacman\",\"pkgs\":[\"foo\"]}}",
            DESCRIPTOR_SCHEMA_VERSION + 1
        ),
    )
    .expect("must write descriptor");

    let err = read_descriptor(&prefix).expect_err("must reject unknown version");
    assert!(matches!(
        err,
        DescriptorError::UnsupportedVersion { found, .. } if found == DESCRIPTOR_SCHEMA_VERSION + 1
    ));

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn read_descriptor_rejects_install_without_prefix() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");
    fs::write(
        descriptor_path(&prefix),
        "{\"version\":1,\"operation\":\"install\",\"root\":\"/\",\"db-path\":\"/var/lib/pacman\",\"pkgs\":[\"paru\"]}",
    )
    .expect("must write descriptor");

    let err = read_descriptor(&prefix).expect_err("must reject install without prefix");
    assert!(matches!(err, DescriptorError::Malformed { .. }));

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn read_descriptor_rejects_empty_package_list() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");
    fs::write(
        descriptor_path(&prefix),
        "{\"version\":1,\"operation\":\"remove\",\"root\":\"/\",\"db-path\":\"/var/lib/pacman\",\"pkgs\":[]}",
    )
    .expect("must write descriptor");

    let err = read_descriptor(&prefix).expect_err("must reject empty package list");
    assert!(matches!(err, DescriptorError::Malformed { .. }));

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn read_descriptor_rejects_unparseable_payload() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");
    fs::write(descriptor_path(&prefix), "not json at all").expect("must write descriptor");

    let err = read_descriptor(&prefix).expect_err("must reject unparseable payload");
    assert!(matches!(err, DescriptorError::Malformed { .. }));

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn remove_descriptor_reports_whether_a_file_was_deleted() {
    let prefix = test_prefix();
    fs::create_dir_all(&prefix).expect("must create prefix");

    assert!(!remove_descriptor(&prefix).expect("must tolerate missing descriptor"));

    fs::write(descriptor_path(&prefix), "{}").expect("must plant descriptor");
    assert!(remove_descriptor(&prefix).expect("must delete descriptor"));
    assert!(!descriptor_path(&prefix).exists());

    let _ = fs::remove_dir_all(&prefix);
}

#[test]
fn bare_dependency_name_strips_version_comparisons() {
    assert_eq!(crate::bare_dependency_name("foo>=1.2"), "foo");
    assert_eq!(crate::bare_dependency_name("foo<1.2"), "foo");
    assert_eq!(crate::bare_dependency_name("foo=1.2"), "foo");
    assert_eq!(crate::bare_dependency_name("foo>1.2-3"), "foo");
    assert_eq!(crate::bare_dependency_name("foo"), "foo");
}

#[test]
fn expand_env_substitutes_known_variables() {
    std::env::set_var("AURDESK_TEST_HOME", "/home/tester");

    assert_eq!(
        crate::expand_env("$AURDESK_TEST_HOME/.cache"),
        "/home/tester/.cache"
    );
    assert_eq!(
        crate::expand_env("${AURDESK_TEST_HOME}/.cache"),
        "/home/tester/.cache"
    );

    std::env::remove_var("AURDESK_TEST_HOME");
}

#[test]
fn expand_env_drops_unset_variables_and_keeps_literal_dollars() {
    std::env::remove_var("AURDESK_TEST_UNSET");

    assert_eq!(crate::expand_env("a$AURDESK_TEST_UNSET/b"), "a/b");
    assert_eq!(crate::expand_env("price: 5$"), "price: 5$");
    assert_eq!(crate::expand_env("a$0b"), "a$0b");
}

fn test_prefix() -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!("aurdesk-core-tests-{}-{}", std::process::id(), nanos));
    path
}
