// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::engine::EngineHandle;
use crate::error::EngineUnavailable;
use crate::operands::OperandDomain;
use crate::operation::Operation;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{info, warn};

pub const PLAINTEXT_BACKEND: &str = "plaintext";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityStatus {
    pub available: bool,
    pub message: String,
}

/// Outcome of the start up probe: either an engine with every circuit
/// built, or the reason the plaintext fallback is in use.
#[derive(Debug, Clone)]
pub struct Availability {
    handle: Option<EngineHandle>,
    status: AvailabilityStatus,
    unavailable: Option<EngineUnavailable>,
}

impl Availability {
    pub fn ready(handle: EngineHandle) -> Self {
        let engine = handle.engine();
        let circuits: Vec<&str> = Operation::with_circuits().map(|op| op.name()).collect();
        let message = format!(
            "{} engine ready, circuits built for {} over {}",
            engine.name(),
            circuits.join(", "),
            engine.domain()
        );
        Self {
            status: AvailabilityStatus {
                available: true,
                message,
            },
            handle: Some(handle),
            unavailable: None,
        }
    }

    pub fn unavailable(reason: EngineUnavailable) -> Self {
        Self {
            handle: None,
            status: AvailabilityStatus {
                available: false,
                message: format!("Engine unavailable, using plaintext fallback: {reason}"),
            },
            unavailable: Some(reason),
        }
    }

    pub fn handle(&self) -> Option<&EngineHandle> {
        self.handle.as_ref()
    }

    pub fn status(&self) -> &AvailabilityStatus {
        &self.status
    }

    /// Why the engine is not in use, if it is not
    pub fn unavailable_reason(&self) -> Option<&EngineUnavailable> {
        self.unavailable.as_ref()
    }

    pub fn backend(&self) -> &str {
        match &self.handle {
            Some(handle) => handle.engine().name(),
            None => PLAINTEXT_BACKEND,
        }
    }
}

/// One-shot engine acquisition.
///
/// The first call to [`AvailabilityProbe::run`] acquires the engine and
/// checks its circuits. Every later call returns that same outcome without
/// invoking its `acquire` argument.
#[derive(Debug, Default)]
pub struct AvailabilityProbe {
    outcome: OnceCell<Availability>,
}

static PROCESS_PROBE: AvailabilityProbe = AvailabilityProbe::new();

/// The probe shared by the whole process
pub fn process_probe() -> &'static AvailabilityProbe {
    &PROCESS_PROBE
}

impl AvailabilityProbe {
    pub const fn new() -> Self {
        Self {
            outcome: OnceCell::new(),
        }
    }

    /// Acquire the engine once. `required` is the operand range the service
    /// accepts; the engine's circuits must cover all of it.
    pub fn run<F>(&self, required: OperandDomain, acquire: F) -> &Availability
    where
        F: FnOnce() -> Result<EngineHandle, EngineUnavailable>,
    {
        self.outcome.get_or_init(|| {
            let outcome = match probe(required, acquire) {
                Ok(handle) => Availability::ready(handle),
                Err(reason) => Availability::unavailable(reason),
            };
            if outcome.status().available {
                info!(backend = outcome.backend(), "{}", outcome.status().message);
            } else {
                warn!("{}", outcome.status().message);
            }
            outcome
        })
    }

    /// The outcome, if the probe has run
    pub fn get(&self) -> Option<&Availability> {
        self.outcome.get()
    }
}

fn probe<F>(required: OperandDomain, acquire: F) -> Result<EngineHandle, EngineUnavailable>
where
    F: FnOnce() -> Result<EngineHandle, EngineUnavailable>,
{
    let handle = catch_unwind(AssertUnwindSafe(acquire))
        .map_err(|payload| EngineUnavailable::new(panic_message(payload)))??;

    let engine = handle.engine();
    if let Some(missing) = Operation::with_circuits().find(|op| !engine.has_circuit(*op)) {
        return Err(EngineUnavailable::new(format!(
            "{} engine has no circuit for '{missing}'",
            engine.name()
        )));
    }

    let built = engine.domain();
    if built.min > required.min || built.max < required.max {
        return Err(EngineUnavailable::new(format!(
            "circuits were built for {built} which does not cover {required}"
        )));
    }

    Ok(handle)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("engine initialization panicked: {detail}")
}
