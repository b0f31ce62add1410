// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step executors: one `apply` function per `Step` variant. `when` is
//! evaluated by the caller; retry wrapping for shell/guarded-command is
//! likewise the caller's responsibility
//! (`crate::retry::run_with_retries`) since a single attempt here must
//! stay side-effect-idempotent to retry safely.

use std::time::{Duration, Instant};

use nexus_core::{FactValue, Facts, ResourceAttrs, ResourceKind, Step, WaitForKind};
use nexus_shell::{effective_command, quote, SudoOptions};
use nexus_ssh::Transport;

use crate::executor::{self, Executor};
use crate::health::{self, Probe};

/// Run a single attempt of `step` against `executor`, using `facts` to
/// select a resource implementation by platform.
pub async fn execute_once<T: Transport>(step: &Step, executor: &Executor<'_, T>, facts: &Facts) -> StepResult {
    let start = Instant::now();
    let mut result = match step {
        Step::Shell {
            cmd,
            sudo,
            sudo_user,
            timeout_ms,
            ..
        } => shell(cmd, *sudo, sudo_user.as_deref(), *timeout_ms, executor).await,
        Step::Upload {
            local_path,
            remote_path,
            sudo,
            mode,
            ..
        } => upload(local_path, remote_path, *sudo, mode.as_deref(), executor).await,
        Step::Download {
            remote_path,
            local_path,
            sudo,
            ..
        } => download(remote_path, local_path, *sudo, executor).await,
        Step::Template {
            source,
            destination,
            vars,
            sudo,
            mode,
            ..
        } => template(source, destination, vars, *sudo, mode.as_deref(), executor).await,
        Step::WaitFor {
            kind,
            target,
            timeout_ms,
            interval_ms,
            expected_status,
            expected_body,
            ..
        } => {
            wait_for_step(
                *kind,
                target,
                expected_status.unwrap_or(200),
                expected_body.as_deref(),
                *interval_ms,
                *timeout_ms,
                executor,
            )
            .await
        }
        Step::GuardedCommand {
            cmd,
            creates,
            removes,
            unless,
            onlyif,
            sudo,
            sudo_user,
            cwd,
            env,
            timeout_ms,
            ..
        } => {
            guarded_command(
                cmd,
                creates.as_deref(),
                removes.as_deref(),
                unless.as_deref(),
                onlyif.as_deref(),
                *sudo,
                sudo_user.as_deref(),
                cwd.as_deref(),
                env,
                *timeout_ms,
                executor,
            )
            .await
        }
        Step::Resource {
            resource, name, attrs, ..
        } => resource(*resource, name, attrs, facts, executor).await,
    };

    result.description = step.description();
    if result.status.is_ok_like() && !matches!(result.status, nexus_core::StepStatus::Skipped) {
        result.notify = step.notify().cloned();
    }
    if result.duration_ms == 0 {
        result.duration_ms = start.elapsed().as_millis() as u64;
    }
    result
}

use nexus_core::StepResult;
use nexus_core::StepStatus;

fn ok(output: impl Into<String>, exit_code: i32, start: Instant) -> StepResult {
    StepResult {
        description: String::new(),
        status: if exit_code == 0 { StepStatus::Ok } else { StepStatus::Error },
        output: output.into(),
        exit_code,
        attempts: 1,
        duration_ms: start.elapsed().as_millis() as u64,
        notify: None,
    }
}

fn errored(output: impl Into<String>, start: Instant) -> StepResult {
    StepResult {
        description: String::new(),
        status: StepStatus::Error,
        output: output.into(),
        exit_code: -1,
        attempts: 1,
        duration_ms: start.elapsed().as_millis() as u64,
        notify: None,
    }
}

async fn shell<T: Transport>(
    cmd: &str,
    sudo: bool,
    sudo_user: Option<&str>,
    timeout_ms: u64,
    executor: &Executor<'_, T>,
) -> StepResult {
    let start = Instant::now();
    let opts = match sudo_user {
        Some(user) if sudo => SudoOptions::sudo_as(user),
        _ if sudo => SudoOptions::sudo(),
        _ => SudoOptions::none(),
    };
    let effective = effective_command(cmd, &opts);
    match executor.exec(&effective, Duration::from_millis(timeout_ms)).await {
        Ok(out) => ok(out.combined(), out.exit_code, start),
        Err(nexus_ssh::TransportError::Timeout(_)) => StepResult::timeout(String::new(), 1, start.elapsed().as_millis() as u64),
        Err(e) => errored(e.to_string(), start),
    }
}

fn random_hex16() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

async fn upload_bytes<T: Transport>(
    contents: &[u8],
    remote_path: &str,
    sudo: bool,
    mode: Option<&str>,
    executor: &Executor<'_, T>,
) -> StepResult {
    let start = Instant::now();
    if !sudo {
        if let Err(e) = executor.write_file(remote_path, contents).await {
            return errored(e.to_string(), start);
        }
        if let Some(mode) = mode {
            if let Err(e) = executor.chmod(remote_path, mode).await {
                return errored(e.to_string(), start);
            }
        }
        return ok(String::new(), 0, start);
    }

    let staged = format!("/tmp/nexus_transfer_{}", random_hex16());
    if let Err(e) = executor.write_file(&staged, contents).await {
        return errored(e.to_string(), start);
    }
    let move_cmd = format!("sudo mv {} {}", quote(&staged), quote(remote_path));
    match executor.exec(&move_cmd, Duration::from_secs(30)).await {
        Ok(out) if out.exit_code == 0 => {
            if let Some(mode) = mode {
                let chmod_cmd = format!("sudo chmod {} {}", mode, quote(remote_path));
                if let Err(e) = executor.exec(&chmod_cmd, Duration::from_secs(30)).await {
                    return errored(e.to_string(), start);
                }
            }
            ok(String::new(), 0, start)
        }
        Ok(out) => {
            let _ = executor.exec(&format!("rm -f {}", quote(&staged)), Duration::from_secs(10)).await;
            errored(out.combined(), start)
        }
        Err(e) => {
            let _ = executor.exec(&format!("rm -f {}", quote(&staged)), Duration::from_secs(10)).await;
            errored(e.to_string(), start)
        }
    }
}

async fn upload<T: Transport>(
    local_path: &str,
    remote_path: &str,
    sudo: bool,
    mode: Option<&str>,
    executor: &Executor<'_, T>,
) -> StepResult {
    let start = Instant::now();
    let contents = match executor::read_local(local_path).await {
        Ok(c) => c,
        Err(e) => return errored(e.to_string(), start),
    };
    upload_bytes(&contents, remote_path, sudo, mode, executor).await
}

async fn download<T: Transport>(remote_path: &str, local_path: &str, sudo: bool, executor: &Executor<'_, T>) -> StepResult {
    let start = Instant::now();
    let contents = if sudo {
        let cmd = format!("sudo cat {}", quote(remote_path));
        match executor.exec(&cmd, Duration::from_secs(30)).await {
            Ok(out) if out.exit_code == 0 => out.stdout.into_bytes(),
            Ok(out) => return errored(out.combined(), start),
            Err(e) => return errored(e.to_string(), start),
        }
    } else {
        match executor.read_file(remote_path).await {
            Ok(c) => c,
            Err(e) => return errored(e.to_string(), start),
        }
    };
    match executor::write_local(local_path, &contents).await {
        Ok(()) => ok(String::new(), 0, start),
        Err(e) => errored(e.to_string(), start),
    }
}

/// Placeholder substitution: every `{{key}}` in `text` is replaced by
/// `vars[key]`'s JSON scalar rendering. Rendering logic beyond this is
/// out of scope.
fn render(text: &str, vars: &std::collections::HashMap<String, serde_json::Value>) -> String {
    let mut rendered = text.to_string();
    for (key, value) in vars {
        let needle = format!("{{{{{key}}}}}");
        let replacement = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        rendered = rendered.replace(&needle, &replacement);
    }
    rendered
}

async fn template<T: Transport>(
    source: &str,
    destination: &str,
    vars: &std::collections::HashMap<String, serde_json::Value>,
    sudo: bool,
    mode: Option<&str>,
    executor: &Executor<'_, T>,
) -> StepResult {
    let start = Instant::now();
    let raw = match executor::read_local(source).await {
        Ok(c) => c,
        Err(e) => return errored(e.to_string(), start),
    };
    let text = String::from_utf8_lossy(&raw).into_owned();
    let rendered = render(&text, vars);

    let tmp_path = std::env::temp_dir().join(format!("nexus_render_{}", random_hex16()));
    let tmp_path_str = tmp_path.to_string_lossy().into_owned();
    if let Err(e) = executor::write_local(&tmp_path_str, rendered.as_bytes()).await {
        return errored(e.to_string(), start);
    }

    let outcome = upload_bytes(rendered.as_bytes(), destination, sudo, mode, executor).await;
    let _ = tokio::fs::remove_file(&tmp_path).await;
    StepResult { duration_ms: start.elapsed().as_millis() as u64, ..outcome }
}

#[allow(clippy::too_many_arguments)]
async fn wait_for_step<T: Transport>(
    kind: WaitForKind,
    target: &str,
    expected_status: u16,
    expected_body: Option<&str>,
    interval_ms: u64,
    timeout_ms: u64,
    executor: &Executor<'_, T>,
) -> StepResult {
    let start = Instant::now();
    let probe = Probe {
        kind,
        target,
        expected_status,
        expected_body,
    };
    match health::wait_for(&probe, executor, interval_ms, timeout_ms).await {
        Ok(()) => ok(String::new(), 0, start),
        Err(health::HealthError::Timeout) => StepResult::timeout(String::new(), 1, start.elapsed().as_millis() as u64),
        Err(e) => errored(e.to_string(), start),
    }
}

async fn guard_path_exists<T: Transport>(path: &str, executor: &Executor<'_, T>) -> bool {
    let cmd = format!("test -e {}", quote(path));
    executor
        .exec(&cmd, Duration::from_secs(10))
        .await
        .map(|out| out.exit_code == 0)
        .unwrap_or(false)
}

#[allow(clippy::too_many_arguments)]
async fn guarded_command<T: Transport>(
    cmd: &str,
    creates: Option<&str>,
    removes: Option<&str>,
    unless: Option<&str>,
    onlyif: Option<&str>,
    sudo: bool,
    sudo_user: Option<&str>,
    cwd: Option<&str>,
    env: &std::collections::HashMap<String, String>,
    timeout_ms: u64,
    executor: &Executor<'_, T>,
) -> StepResult {
    if let Some(path) = creates {
        if guard_path_exists(path, executor).await {
            return StepResult::skipped(String::new());
        }
    }
    if let Some(path) = removes {
        if !guard_path_exists(path, executor).await {
            return StepResult::skipped(String::new());
        }
    }
    if let Some(check) = unless {
        let succeeded = executor
            .exec(check, Duration::from_secs(10))
            .await
            .map(|out| out.exit_code == 0)
            .unwrap_or(false);
        if succeeded {
            return StepResult::skipped(String::new());
        }
    }
    if let Some(check) = onlyif {
        let succeeded = executor
            .exec(check, Duration::from_secs(10))
            .await
            .map(|out| out.exit_code == 0)
            .unwrap_or(false);
        if !succeeded {
            return StepResult::skipped(String::new());
        }
    }

    let start = Instant::now();
    let mut effective = cmd.to_string();
    if !env.is_empty() {
        let prefix = env
            .iter()
            .map(|(k, v)| format!("{k}={}", quote(v)))
            .collect::<Vec<_>>()
            .join(" ");
        effective = format!("{prefix} sh -c {}", quote(&effective));
    }
    if let Some(cwd) = cwd {
        effective = format!("cd {} && {}", quote(cwd), effective);
    }
    let opts = match sudo_user {
        Some(user) if sudo => SudoOptions::sudo_as(user),
        _ if sudo => SudoOptions::sudo(),
        _ => SudoOptions::none(),
    };
    let effective = effective_command(&effective, &opts);
    match executor.exec(&effective, Duration::from_millis(timeout_ms)).await {
        Ok(out) => ok(out.combined(), out.exit_code, start),
        Err(nexus_ssh::TransportError::Timeout(_)) => StepResult::timeout(String::new(), 1, start.elapsed().as_millis() as u64),
        Err(e) => errored(e.to_string(), start),
    }
}

fn os_family(facts: &Facts) -> String {
    match facts.get("os_family") {
        Some(FactValue::Str(s)) => s.clone(),
        _ => "unknown".to_string(),
    }
}

async fn resource<T: Transport>(
    kind: ResourceKind,
    name: &str,
    attrs: &ResourceAttrs,
    facts: &Facts,
    executor: &Executor<'_, T>,
) -> StepResult {
    let start = Instant::now();
    let family = os_family(facts);
    match kind {
        ResourceKind::Package => resource_package(name, attrs, &family, executor, start).await,
        ResourceKind::Service => resource_service(name, attrs, &family, executor, start).await,
        ResourceKind::File => resource_file(name, attrs, executor, start).await,
        ResourceKind::Directory => resource_directory(name, attrs, executor, start).await,
        ResourceKind::User => resource_account(name, attrs, "user", &family, executor, start).await,
        ResourceKind::Group => resource_account(name, attrs, "group", &family, executor, start).await,
    }
}

fn changed(start: Instant) -> StepResult {
    StepResult {
        description: String::new(),
        status: StepStatus::Changed,
        output: String::new(),
        exit_code: 0,
        attempts: 1,
        duration_ms: start.elapsed().as_millis() as u64,
        notify: None,
    }
}

/// A resource probe found current state already matching desired state.
fn already_ok(start: Instant) -> StepResult {
    ok("already in desired state", 0, start)
}

async fn resource_package<T: Transport>(
    name: &str,
    attrs: &ResourceAttrs,
    family: &str,
    executor: &Executor<'_, T>,
    start: Instant,
) -> StepResult {
    let desired_present = attrs.state.as_deref() != Some("absent");
    let (describe_cmd, install_cmd, remove_cmd): (String, String, String) = match family {
        "linux" => (
            format!("dpkg-query -W -f='${{Status}}' {}", quote(name)),
            format!("sudo apt-get install -y {}", quote(name)),
            format!("sudo apt-get remove -y {}", quote(name)),
        ),
        "darwin" => (
            format!("brew list --versions {}", quote(name)),
            format!("brew install {}", quote(name)),
            format!("brew uninstall {}", quote(name)),
        ),
        _ => return errored(format!("unsupported platform for package resource: {family}"), start),
    };

    let is_present = executor
        .exec(&describe_cmd, Duration::from_secs(15))
        .await
        .map(|out| out.exit_code == 0 && !out.stdout.trim().is_empty())
        .unwrap_or(false);

    if is_present == desired_present {
        return already_ok(start);
    }

    let apply_cmd = if desired_present { install_cmd } else { remove_cmd };
    match executor.exec(&apply_cmd, Duration::from_secs(300)).await {
        Ok(out) if out.exit_code == 0 => changed(start),
        Ok(out) => errored(out.combined(), start),
        Err(e) => errored(e.to_string(), start),
    }
}

async fn resource_service<T: Transport>(
    name: &str,
    attrs: &ResourceAttrs,
    family: &str,
    executor: &Executor<'_, T>,
    start: Instant,
) -> StepResult {
    if family != "linux" {
        return errored(format!("unsupported platform for service resource: {family}"), start);
    }
    let desired_active = attrs.state.as_deref() != Some("stopped");
    let mut any_change = false;

    let is_active = executor
        .exec(&format!("systemctl is-active {}", quote(name)), Duration::from_secs(10))
        .await
        .map(|out| out.stdout.trim() == "active")
        .unwrap_or(false);
    if is_active != desired_active {
        let cmd = if desired_active {
            format!("sudo systemctl start {}", quote(name))
        } else {
            format!("sudo systemctl stop {}", quote(name))
        };
        match executor.exec(&cmd, Duration::from_secs(60)).await {
            Ok(out) if out.exit_code == 0 => any_change = true,
            Ok(out) => return errored(out.combined(), start),
            Err(e) => return errored(e.to_string(), start),
        }
    }

    if let Some(desired_enabled) = attrs.enabled {
        let is_enabled = executor
            .exec(&format!("systemctl is-enabled {}", quote(name)), Duration::from_secs(10))
            .await
            .map(|out| out.stdout.trim() == "enabled")
            .unwrap_or(false);
        if is_enabled != desired_enabled {
            let cmd = if desired_enabled {
                format!("sudo systemctl enable {}", quote(name))
            } else {
                format!("sudo systemctl disable {}", quote(name))
            };
            match executor.exec(&cmd, Duration::from_secs(30)).await {
                Ok(out) if out.exit_code == 0 => any_change = true,
                Ok(out) => return errored(out.combined(), start),
                Err(e) => return errored(e.to_string(), start),
            }
        }
    }

    if any_change {
        changed(start)
    } else {
        already_ok(start)
    }
}

async fn resource_file<T: Transport>(path: &str, attrs: &ResourceAttrs, executor: &Executor<'_, T>, start: Instant) -> StepResult {
    if attrs.state.as_deref() == Some("absent") {
        let exists = guard_path_exists(path, executor).await;
        if !exists {
            return already_ok(start);
        }
        return match executor.exec(&format!("rm -f {}", quote(path)), Duration::from_secs(10)).await {
            Ok(out) if out.exit_code == 0 => changed(start),
            Ok(out) => errored(out.combined(), start),
            Err(e) => errored(e.to_string(), start),
        };
    }

    let mut any_change = false;
    if let Some(content) = &attrs.content {
        let current = executor.read_file(path).await.ok();
        if current.as_deref() != Some(content.as_bytes()) {
            if let Err(e) = executor.write_file(path, content.as_bytes()).await {
                return errored(e.to_string(), start);
            }
            any_change = true;
        }
    }
    if let Some(mode) = &attrs.mode {
        if let Err(e) = executor.chmod(path, mode).await {
            return errored(e.to_string(), start);
        }
    }
    if any_change {
        changed(start)
    } else {
        already_ok(start)
    }
}

async fn resource_directory<T: Transport>(path: &str, attrs: &ResourceAttrs, executor: &Executor<'_, T>, start: Instant) -> StepResult {
    if attrs.state.as_deref() == Some("absent") {
        let exists = guard_path_exists(path, executor).await;
        if !exists {
            return already_ok(start);
        }
        return match executor.exec(&format!("rm -rf {}", quote(path)), Duration::from_secs(30)).await {
            Ok(out) if out.exit_code == 0 => changed(start),
            Ok(out) => errored(out.combined(), start),
            Err(e) => errored(e.to_string(), start),
        };
    }

    let exists = guard_path_exists(path, executor).await;
    if !exists {
        match executor.exec(&format!("mkdir -p {}", quote(path)), Duration::from_secs(10)).await {
            Ok(out) if out.exit_code == 0 => return changed(start),
            Ok(out) => return errored(out.combined(), start),
            Err(e) => return errored(e.to_string(), start),
        }
    }
    if let Some(mode) = &attrs.mode {
        if let Err(e) = executor.chmod(path, mode).await {
            return errored(e.to_string(), start);
        }
    }
    already_ok(start)
}

async fn resource_account<T: Transport>(
    name: &str,
    attrs: &ResourceAttrs,
    kind: &str,
    family: &str,
    executor: &Executor<'_, T>,
    start: Instant,
) -> StepResult {
    if family != "linux" {
        return errored(format!("unsupported platform for {kind} resource: {family}"), start);
    }
    let desired_present = attrs.state.as_deref() != Some("absent");
    let db = if kind == "user" { "passwd" } else { "group" };
    let is_present = executor
        .exec(&format!("getent {db} {}", quote(name)), Duration::from_secs(10))
        .await
        .map(|out| out.exit_code == 0)
        .unwrap_or(false);

    if is_present == desired_present {
        return already_ok(start);
    }

    let add_bin = if kind == "user" { "useradd" } else { "groupadd" };
    let del_bin = if kind == "user" { "userdel" } else { "groupdel" };
    let cmd = if desired_present {
        format!("sudo {add_bin} {}", quote(name))
    } else {
        format!("sudo {del_bin} {}", quote(name))
    };
    match executor.exec(&cmd, Duration::from_secs(30)).await {
        Ok(out) if out.exit_code == 0 => changed(start),
        Ok(out) => errored(out.combined(), start),
        Err(e) => errored(e.to_string(), start),
    }
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
