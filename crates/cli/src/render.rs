// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan/result rendering for `-o text|json`, kept as pure functions so
//! the formatting itself is unit-testable without spinning up an
//! orchestrator run.

use nexus_core::PipelineResult;
use nexus_engine::orchestrator::Plan;

use crate::output::OutputFormat;

pub fn render_plan(plan: &Plan, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
        OutputFormat::Text => {
            let mut out = String::new();
            for (i, phase) in plan.phases.iter().enumerate() {
                let names: Vec<&str> = phase.iter().map(|t| t.as_str()).collect();
                out.push_str(&format!("phase {i}: {}\n", names.join(", ")));
            }
            out
        }
    }
}

pub fn render_result(result: &PipelineResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
        OutputFormat::Text => {
            let mut out = String::new();
            for task in &result.task_results {
                out.push_str(&format!("task {} [{:?}] ({}ms)\n", task.task, task.status, task.duration_ms));
                for host in &task.host_results {
                    out.push_str(&format!("  host {} [{:?}]\n", host.host, host.status));
                    for step in &host.steps {
                        out.push_str(&format!("    {} [{:?}] {}ms\n", step.description, step.status, step.duration_ms));
                    }
                }
            }
            if let Some(aborted) = &result.aborted_at {
                out.push_str(&format!("aborted at task {aborted}\n"));
            }
            out.push_str(&format!(
                "{} task(s) run, {} succeeded, {} failed ({:?}, {}ms)\n",
                result.tasks_run, result.tasks_succeeded, result.tasks_failed, result.status, result.duration_ms
            ));
            out
        }
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
