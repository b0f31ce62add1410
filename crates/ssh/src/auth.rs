// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication method resolution.
//!
//! Priority: explicit `identity` path, then password (if supplied), then
//! agent (if `SSH_AUTH_SOCK` is set), then default keys in order
//! `id_ed25519`, `id_ecdsa`, `id_rsa`, `id_dsa`.

use std::path::{Path, PathBuf};

use crate::error::TransportError;
use crate::transport::HostAddr;

const DEFAULT_KEY_NAMES: [&str; 4] = ["id_ed25519", "id_ecdsa", "id_rsa", "id_dsa"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    Identity(PathBuf),
    Password(String),
    Agent,
    DefaultKey(PathBuf),
}

/// Resolve the auth method to attempt first, given the destination and the
/// environment. Callers retry with the next candidate on `AuthFailed`.
pub fn resolve_auth_methods(addr: &HostAddr, ssh_auth_sock_set: bool, home: &Path) -> Vec<AuthMethod> {
    let mut methods = Vec::new();

    if let Some(identity) = &addr.identity_path {
        methods.push(AuthMethod::Identity(PathBuf::from(identity)));
    }
    if let Some(password) = &addr.password {
        methods.push(AuthMethod::Password(password.clone()));
    }
    if ssh_auth_sock_set {
        methods.push(AuthMethod::Agent);
    }
    for name in DEFAULT_KEY_NAMES {
        let candidate = home.join(".ssh").join(name);
        methods.push(AuthMethod::DefaultKey(candidate));
    }

    methods
}

/// Private-key files must be `0600` or stricter. Unix-only check; on
/// non-unix platforms this is a no-op
/// (permission bits don't carry the same meaning).
#[cfg(unix)]
pub fn check_key_permissions(path: &Path) -> Result<(), TransportError> {
    use std::os::unix::fs::PermissionsExt;

    let meta = std::fs::metadata(path)?;
    let mode = meta.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(TransportError::KeyPermissionsTooLoose {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn check_key_permissions(_path: &Path) -> Result<(), TransportError> {
    Ok(())
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
