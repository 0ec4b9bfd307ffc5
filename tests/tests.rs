//! Runs the unit tests with different feature flags.
//!
//! The `serde` impls of `Key` are only compiled when the feature is on, but the `FromStr` and
//! `Debug` impls they rely on are always present. This makes sure both configurations build and
//! pass.

use std::{env, ffi::OsString, process::Command};

fn test(args: &[&str]) {
    let cargo = env::var_os("CARGO").unwrap_or_else(|| OsString::from("cargo"));
    let output = Command::new(cargo)
        .args(["test", "-p", "keynput", "--lib"]) // avoid infinite recursion
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "cargo exited with error code {:?}. stderr:\n{}\nstdout: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout),
    );
}

#[test]
fn no_default_features() {
    test(&["--no-default-features"]);
}

#[test]
fn serde() {
    test(&["--features", "serde"]);
}
