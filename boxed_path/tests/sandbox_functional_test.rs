//! Functional tests for sandbox construction and lexical validation on a real
//! filesystem.
//!
//! Covers root normalization, the *Absolute*/*Relative* split at `wrap`, the
//! lexical escape rules and the error classification callers rely on.

use boxed_path::test_utils::TestSandbox;
use boxed_path::utils::logging::init_test_logging;
use boxed_path::{
    JailbreakPolicy, PathKind, ReasonCode, Sandbox, SandboxConfig, SandboxError,
    SecurityViolation,
};
use std::path::PathBuf;

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_root_is_canonical_and_trimmed() {
    init_test_logging();
    let test = TestSandbox::new();
    let with_slash = format!("{}/", test.root().display());
    let sandbox = Sandbox::new(&with_slash).unwrap();
    assert_eq!(sandbox.root_path(), test.root());
    assert!(!sandbox.root_path().to_string_lossy().ends_with('/'));
}

#[test]
fn test_relative_root_is_made_absolute() {
    let sandbox = Sandbox::new("some/relative/root").unwrap();
    assert!(sandbox.root_path().is_absolute());
    assert!(sandbox.root_path().ends_with("some/relative/root"));
}

#[test]
fn test_create_sets_policy_and_limit() {
    let test = TestSandbox::new();
    let sandbox = Sandbox::create(test.root(), JailbreakPolicy::UncheckedSymlinks, 2).unwrap();
    assert_eq!(sandbox.jailbreak_policy(), JailbreakPolicy::UncheckedSymlinks);
    assert_eq!(sandbox.max_link_follows(), 2);
}

#[test]
fn test_root_value_exports_root() {
    let test = TestSandbox::new();
    let root = test.sandbox.root();
    assert_eq!(root.kind(), PathKind::Absolute);
    assert_eq!(root.export().unwrap(), test.root());
}

// =============================================================================
// Lexical validation
// =============================================================================

#[test]
fn test_dotdot_inside_the_root_is_normalized() {
    let test = TestSandbox::new();
    test.create_dir("data/temp");

    let path = test
        .sandbox
        .resolve("data/temp/../file.txt")
        .unwrap();
    assert_eq!(path.export().unwrap(), test.path("data/file.txt"));
}

#[test]
fn test_relative_traversal_fails_on_export() {
    let test = TestSandbox::new();
    let path = test.wrap("../../etc/passwd").unwrap();
    assert_eq!(path.kind(), PathKind::Relative);

    let err = path.export().unwrap_err();
    assert!(err.is_security_violation());
    assert_eq!(err.reason(), Some(ReasonCode::LexicalEscape));
}

#[test]
fn test_absolute_outside_fails_at_wrap() {
    let test = TestSandbox::new();
    let outside = test.outside().join("secret.txt");
    let err = test.wrap(&outside).unwrap_err();
    assert!(matches!(
        err,
        SandboxError::Security(SecurityViolation::LexicalEscape { .. })
    ));
}

#[test]
fn test_sibling_with_shared_prefix_is_outside() {
    let test = TestSandbox::new();
    let sibling = PathBuf::from(format!("{}2", test.root().display())).join("file.txt");
    let err = test.wrap(&sibling).unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::LexicalEscape));
}

#[test]
fn test_absolute_dotdot_back_into_root_is_accepted() {
    let test = TestSandbox::new();
    test.create_dir("data");
    let name = test.root().file_name().unwrap().to_owned();
    let round_trip = test.root().join("..").join(name).join("data");
    assert_eq!(
        test.wrap(&round_trip).unwrap().export().unwrap(),
        test.path("data")
    );
}

#[test]
fn test_nonexistent_paths_are_allowed() {
    let test = TestSandbox::new();
    let path = test.wrap("not/yet/created.txt").unwrap();
    assert_eq!(path.export().unwrap(), test.path("not/yet/created.txt"));
}

#[test]
fn test_relative_is_revalidated_on_every_export() {
    let test = TestSandbox::new();
    let path = test.wrap("reports/today.txt").unwrap();
    assert_eq!(path.export().unwrap(), test.path("reports/today.txt"));

    test.create_file("reports/today.txt", "x");
    assert_eq!(path.export().unwrap(), test.path("reports/today.txt"));
}

#[test]
fn test_security_errors_name_the_offending_path() {
    let test = TestSandbox::new();
    let err = test.wrap("../escape").unwrap().export().unwrap_err();
    let violation = err.security_violation().unwrap();
    assert!(violation.path().ends_with("escape"));
    assert!(err.to_string().contains("outside the sandbox"));
}

#[test]
fn test_validation_is_deterministic() {
    let test = TestSandbox::new();
    test.create_file("a/b.txt", "b");
    let path = test.wrap("a/./b.txt").unwrap();
    let first = path.export().unwrap();
    for _ in 0..10 {
        assert_eq!(path.export().unwrap(), first);
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_builds_equivalent_sandbox() {
    let test = TestSandbox::new();
    let toml = format!(
        "root = {:?}\njailbreak_policy = \"disallow\"\nmax_link_follows = 3\n",
        test.root().to_string_lossy()
    );
    let sandbox = SandboxConfig::from_toml_str(&toml).unwrap().build().unwrap();

    assert_eq!(sandbox.root_path(), test.root());
    assert_eq!(sandbox.max_link_follows(), 3);
    assert_eq!(
        sandbox,
        Sandbox::create(test.root(), JailbreakPolicy::Disallow, 3).unwrap()
    );
}
