// conway-gpu: Conway's Game of Life on a compute accelerator
//
// Generation-stepped evolution of a 2D binary grid with double-buffered
// state, driven through one stepping contract over two storage layouts
// (flat buffer, 2D image) on wgpu or on a host-memory simulated device.
//
// Layering, bottom-up:
//   grid, patterns, life       host-side values and the reference rule
//   config, error              run parameters and failure taxonomy
//   sim                        storage/accelerator contracts, stepper, driver
//   host, gpu                  concrete backends
//   run, frames, logging       wiring for the binary, benches, and demos

pub mod config;
pub mod error;
pub mod frames;
pub mod gpu;
pub mod grid;
pub mod host;
pub mod life;
pub mod logging;
pub mod patterns;
pub mod run;
pub mod sim;

pub use config::{BackendKind, ConfigError, RunConfig};
pub use error::{DeviceExecutionError, GolError, GolResult, RunFailure};
pub use grid::{Cell, Grid};
pub use sim::{CellStorage, RunReport, Simulation, Stepper};
