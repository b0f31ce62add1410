// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus-config: load a `nexus_core::Config` from an HCL runbook file.
//!
//! Grammar: top-level `host`, `group`, `task`, `handler`, and `defaults`
//! blocks. This is a small, single-pass loader, not a general-purpose
//! DSL — see the crate's `DESIGN.md` entry for the line it draws.

mod document;
mod error;
mod loader;

pub use error::LoadError;
pub use loader::{load_file, load_str};
