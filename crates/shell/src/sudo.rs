// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sudo wrapping: `sudo -u <user> -- sh -c <escaped>`
//! or `sudo -- sh -c <escaped>`, falling back to the bare command when
//! sudo isn't requested.

use crate::quote::quote;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SudoOptions {
    pub sudo: bool,
    pub sudo_user: Option<String>,
}

impl SudoOptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn sudo() -> Self {
        Self {
            sudo: true,
            sudo_user: None,
        }
    }

    pub fn sudo_as(user: impl Into<String>) -> Self {
        Self {
            sudo: true,
            sudo_user: Some(user.into()),
        }
    }
}

/// Assemble the effective command line for `cmd` under `opts` (spec
/// §4.6). `sudo_user` is only meaningful when `sudo` is set.
pub fn effective_command(cmd: &str, opts: &SudoOptions) -> String {
    if !opts.sudo {
        return cmd.to_string();
    }
    let quoted = quote(cmd);
    match &opts.sudo_user {
        Some(user) => format!("sudo -u {user} -- sh -c {quoted}"),
        None => format!("sudo -- sh -c {quoted}"),
    }
}

#[cfg(test)]
#[path = "sudo_tests.rs"]
mod tests;
