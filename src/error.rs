// error.rs — Error taxonomy for setup, configuration, and dispatch failures.
//
//   Setup         NoAdapter, DeviceRequest, KernelCompile
//                 Raised once while building a backend. Fatal, never retried.
//   Configuration Config(ConfigError)
//                 Raised before any backend resource is allocated.
//   Dispatch      DeviceExecution, Readback
//                 Raised mid-run. The stepper refuses to swap, and the driver
//                 wraps the error in a `RunFailure` that records how far the
//                 run got.
//   Contract      IncompleteStep, ShapeMismatch, StepperFaulted
//                 Misuse of the storage/stepper contract. Programming errors
//                 surfaced as values rather than panics.

use thiserror::Error;

use crate::config::ConfigError;
use crate::grid::Grid;

/// Convenience alias used throughout the crate.
pub type GolResult<T> = Result<T, GolError>;

/// A fault reported by the accelerator while executing submitted work.
///
/// Fatal for the run that observed it: storage is left untouched and the
/// partially written "next" generation is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("device execution failed on submission {submission}: {message}")]
pub struct DeviceExecutionError {
    /// 1-based count of submissions made to this device, including the failed one.
    pub submission: u64,
    pub message: String,
}

impl DeviceExecutionError {
    pub fn new(submission: u64, message: impl Into<String>) -> Self {
        DeviceExecutionError { submission, message: message.into() }
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum GolError {
    /// No adapter was visible to wgpu.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// wgpu refused the device request (driver issue, unsupported limits, ...).
    #[error("device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// The Life kernel could not be compiled or its pipeline created.
    #[error("kernel `{kernel}` failed to build: {message}")]
    KernelCompile { kernel: &'static str, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DeviceExecution(#[from] DeviceExecutionError),

    /// Mapping a readback buffer failed.
    #[error("readback failed: {0}")]
    Readback(String),

    /// Work was submitted before every part of the step was recorded.
    #[error("step submitted without {0}")]
    IncompleteStep(&'static str),

    /// A grid handed to storage does not match the storage's shape.
    #[error("grid is {got_width}×{got_height} but storage holds {width}×{height}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },

    /// `step()` was called again after a dispatch failure.
    #[error("stepper faulted after generation {generation}; start a new run")]
    StepperFaulted { generation: u64 },

    /// A run stopped early; see [`RunFailure`].
    #[error(transparent)]
    RunAborted(#[from] Box<RunFailure>),
}

/// A run that stopped before reaching its requested generation count.
///
/// `grid` is the last consistent state: the snapshot after generation
/// `completed` (the seed when `completed == 0`). It is never a partially
/// written generation.
#[derive(Debug, Error)]
#[error(
    "run aborted after {completed} of {requested} generations on a {width}×{height} grid: {source}"
)]
pub struct RunFailure {
    pub completed: u64,
    pub requested: u64,
    pub width: usize,
    pub height: usize,
    pub grid: Grid,
    #[source]
    pub source: GolError,
}

impl From<RunFailure> for GolError {
    fn from(f: RunFailure) -> Self {
        GolError::RunAborted(Box::new(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display() {
        let e = DeviceExecutionError::new(3, "lost");
        assert_eq!(e.to_string(), "device execution failed on submission 3: lost");
    }

    #[test]
    fn test_run_failure_display_mentions_progress() {
        let f = RunFailure {
            completed: 4,
            requested: 10,
            width: 8,
            height: 6,
            grid: Grid::new(8, 6),
            source: DeviceExecutionError::new(5, "boom").into(),
        };
        let msg = f.to_string();
        assert!(msg.contains("after 4 of 10"), "{msg}");
        assert!(msg.contains("8×6"), "{msg}");
    }

    #[test]
    fn test_run_failure_converts_to_gol_error() {
        let f = RunFailure {
            completed: 0,
            requested: 1,
            width: 1,
            height: 1,
            grid: Grid::new(1, 1),
            source: GolError::NoAdapter,
        };
        let e: GolError = f.into();
        assert!(matches!(e, GolError::RunAborted(ref b) if b.completed == 0));
    }
}
