//! Test helpers for black-box CLI specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;

pub fn nexus_cmd() -> Command {
    Command::cargo_bin("nexus").expect("nexus binary built")
}

/// Write `contents` as `nexus.hcl` inside `dir` and return its path.
pub fn write_runbook(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("nexus.hcl");
    std::fs::write(&path, contents).expect("write runbook");
    path
}
