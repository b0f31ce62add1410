// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus-dag: the task dependency graph.
//!
//! One vertex per defined task, one edge from each dependency to its
//! dependent. Hand-rolled adjacency list with DFS cycle detection, in the
//! style of a dependency-graph executor helper rather than a general graph
//! library — the topology here (a task DAG, unweighted, unattributed
//! edges) doesn't need one.

use std::collections::{HashMap, HashSet};

use nexus_core::{Config, TaskName};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DagError {
    #[error("dependency cycle: {}", path.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(" -> "))]
    Cycle { path: Vec<TaskName> },
    #[error("unknown tasks: {}", names.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", "))]
    UnknownTasks { names: Vec<TaskName> },
}

/// The task dependency graph: adjacency list `task -> [dependencies]`.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    /// task -> its direct dependencies (deps(task))
    deps: HashMap<TaskName, Vec<TaskName>>,
    /// task -> tasks that directly depend on it (reverse edges)
    dependents: HashMap<TaskName, Vec<TaskName>>,
}

impl Graph {
    /// Build the graph from a `Config`. One vertex per defined task,
    /// even one with no dependencies and no dependents. Fails with the
    /// first cycle found.
    pub fn build(config: &Config) -> Result<Self, DagError> {
        let mut graph = Graph::default();
        for task in config.tasks.values() {
            graph.deps.entry(task.name.clone()).or_default();
            graph.dependents.entry(task.name.clone()).or_default();
        }
        for task in config.tasks.values() {
            for dep in &task.deps {
                graph.deps.entry(task.name.clone()).or_default().push(dep.clone());
                graph
                    .dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(task.name.clone());
            }
        }

        graph.check_acyclic()?;
        Ok(graph)
    }

    fn check_acyclic(&self) -> Result<(), DagError> {
        let mut visited: HashSet<TaskName> = HashSet::new();
        let mut temp_visited: HashSet<TaskName> = HashSet::new();

        let mut names: Vec<&TaskName> = self.deps.keys().collect();
        names.sort();

        for name in names {
            if !visited.contains(name) {
                let mut path = Vec::new();
                self.visit(name, &mut visited, &mut temp_visited, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit(
        &self,
        node: &TaskName,
        visited: &mut HashSet<TaskName>,
        temp_visited: &mut HashSet<TaskName>,
        path: &mut Vec<TaskName>,
    ) -> Result<(), DagError> {
        if visited.contains(node) {
            return Ok(());
        }
        if temp_visited.contains(node) {
            let mut cycle_path = path.clone();
            cycle_path.push(node.clone());
            return Err(DagError::Cycle { path: cycle_path });
        }

        temp_visited.insert(node.clone());
        path.push(node.clone());

        if let Some(deps) = self.deps.get(node) {
            for dep in deps {
                self.visit(dep, visited, temp_visited, path)?;
            }
        }

        path.pop();
        temp_visited.remove(node);
        visited.insert(node.clone());
        Ok(())
    }

    /// Transitive closure of ancestors, excluding `task` itself.
    pub fn dependencies(&self, task: &TaskName) -> Vec<TaskName> {
        let mut seen = HashSet::new();
        let mut stack = self.deps.get(task).cloned().unwrap_or_default();
        let mut result = Vec::new();
        while let Some(node) = stack.pop() {
            if seen.insert(node.clone()) {
                result.push(node.clone());
                if let Some(deps) = self.deps.get(&node) {
                    stack.extend(deps.clone());
                }
            }
        }
        result
    }

    /// `{t} ∪ dependencies(G, t)` for each target, deduplicated, with
    /// unknown targets reported distinctly from a cycle.
    pub fn required_set(&self, targets: &[TaskName]) -> Result<Vec<TaskName>, DagError> {
        let unknown: Vec<TaskName> = targets
            .iter()
            .filter(|t| !self.deps.contains_key(*t))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(DagError::UnknownTasks { names: unknown });
        }

        let mut set: HashSet<TaskName> = HashSet::new();
        for target in targets {
            set.insert(target.clone());
            for dep in self.dependencies(target) {
                set.insert(dep);
            }
        }
        Ok(set.into_iter().collect())
    }

    /// Partition the required set into topological layers. Layer 0 =
    /// sources (no incoming edges within the subgraph); layer k+1 =
    /// vertices whose predecessors are all in layers ≤ k. Tasks within a
    /// layer are returned in name order for stable output.
    pub fn execution_phases(&self, required: &[TaskName]) -> Vec<Vec<TaskName>> {
        let required_set: HashSet<&TaskName> = required.iter().collect();
        let mut remaining: HashSet<TaskName> = required.iter().cloned().collect();
        let mut phase_of: HashMap<TaskName, usize> = HashMap::new();
        let mut phases: Vec<Vec<TaskName>> = Vec::new();

        while !remaining.is_empty() {
            let mut layer: Vec<TaskName> = remaining
                .iter()
                .filter(|task| {
                    self.deps
                        .get(*task)
                        .map(|deps| {
                            deps.iter()
                                .filter(|d| required_set.contains(d))
                                .all(|d| phase_of.contains_key(d))
                        })
                        .unwrap_or(true)
                })
                .cloned()
                .collect();

            if layer.is_empty() {
                // Cycles are rejected at build() time; this only guards
                // against a malformed required_set producing no progress.
                break;
            }

            layer.sort();
            let idx = phases.len();
            for task in &layer {
                phase_of.insert(task.clone(), idx);
                remaining.remove(task);
            }
            phases.push(layer);
        }
        phases
    }

    /// Phase index assigned to a task name known to the graph, if any has
    /// been computed by a prior [`Graph::execution_phases`] call. Exposed
    /// for tests asserting a dependency's phase index precedes its
    /// dependent's.
    pub fn phase_index_map(&self, phases: &[Vec<TaskName>]) -> HashMap<TaskName, usize> {
        let mut map = HashMap::new();
        for (idx, layer) in phases.iter().enumerate() {
            for task in layer {
                map.insert(task.clone(), idx);
            }
        }
        map
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
