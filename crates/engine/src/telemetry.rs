// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured telemetry events. The core only ever sends on this
//! channel; it never reads back.

use nexus_core::{RunStatus, StepStatus, TaskName};

#[derive(Clone, Debug)]
pub enum TelemetryEvent {
    TaskStart {
        task: TaskName,
    },
    TaskStop {
        task: TaskName,
        status: RunStatus,
    },
    CommandStart {
        task: TaskName,
        host: String,
        description: String,
    },
    CommandStop {
        task: TaskName,
        host: String,
        description: String,
        status: StepStatus,
    },
    CommandRetry {
        task: TaskName,
        host: String,
        description: String,
        attempt: u32,
    },
}
