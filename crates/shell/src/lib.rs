// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus-shell: command-line assembly and POSIX-shell quoting for
//! shell-step dispatch.
//!
//! This crate does not parse or validate shell scripts — it only builds
//! the single command line a `Transport::exec` or local `sh -c` call
//! runs, given a caller-supplied command string and sudo options.

mod quote;
mod sudo;

pub use quote::quote;
pub use sudo::{effective_command, SudoOptions};
