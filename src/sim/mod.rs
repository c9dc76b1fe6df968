// sim/mod.rs — Backend-independent simulation core.
//
// Two contracts separate "how a generation is stored and executed" from
// "how generations are sequenced":
//
//   Accelerator  — the compute backend handle. Hands out an empty unit of
//                  work (`begin_step`) and executes it synchronously
//                  (`submit_and_wait`).
//
//   CellStorage  — the storage model. Owns the current/next pair, binds
//                  them into a unit of work, swaps roles, and produces
//                  host-readable snapshots.
//
// The stepper and driver are generic over `CellStorage` and never name a
// concrete backend. Four storages implement it:
//
//   host::HostBufferStorage  ─┐
//   host::HostImageStorage   ─┴─ Accel = host::HostDevice
//   gpu::GpuBufferStorage    ─┐
//   gpu::GpuTextureStorage   ─┴─ Accel = gpu::GpuDevice
//
// One step, as the stepper drives it:
//
//   let mut work = accel.begin_step();
//   storage.bind_for_step(&mut work);        // current → slot 0, next → slot 1
//   work.set_dimensions(width, height);      // scalar params
//   work.dispatch(geometry);                 // tiles
//   accel.submit_and_wait(work)?;            // blocks until the device is done
//   storage.swap();                          // only after success
//
// NEW RUST CONCEPTS:
// - Generic associated types (`type Work<'a>`). A unit of GPU work borrows
//   the pipeline and bind group owned by the storage for exactly as long
//   as it is being recorded and submitted. The lifetime parameter on the
//   associated type expresses that without boxing or reference counting.
//   The borrow ends when `submit_and_wait` consumes the work, which is
//   what allows `swap(&mut self)` afterwards.

pub mod driver;
pub mod geometry;
pub mod stepper;

pub use driver::{RunReport, Simulation};
pub use geometry::{align_to, DispatchGeometry, TILE_SIZE};
pub use stepper::{StepState, Stepper};

use crate::error::{GolError, GolResult};
use crate::grid::Grid;

/// A unit of work for one generation, filled in by the storage (bindings)
/// and the stepper (parameters, geometry) before submission.
pub trait StepWork {
    /// Grid width and height, handed to the kernel as dispatch-time constants.
    fn set_dimensions(&mut self, width: u32, height: u32);

    /// Record the tile dispatch.
    fn dispatch(&mut self, geometry: DispatchGeometry);
}

/// The compute backend handle: device, compiled kernel(s), queue.
///
/// Construction is where setup errors surface. Once built, the only
/// runtime failure is a `DeviceExecutionError` out of `submit_and_wait`.
pub trait Accelerator {
    type Work<'a>: StepWork
    where
        Self: 'a;

    /// An empty unit of work.
    fn begin_step(&self) -> Self::Work<'_>;

    /// Execute `work` and block until the device reports completion.
    ///
    /// No retry happens here. A failure leaves every storage resource as it
    /// was, apart from whatever the device managed to write into "next".
    fn submit_and_wait(&self, work: Self::Work<'_>) -> GolResult<()>;
}

/// The storage model: a current/next pair of grid-shaped resources.
///
/// "Current" is authoritative and readable; "next" is the write target of
/// the in-flight step. Implementations allocate both once, up front, and
/// exchange roles on `swap` without copying data.
pub trait CellStorage {
    type Accel: Accelerator + 'static;

    /// (width, height) in cells.
    fn dimensions(&self) -> (u32, u32);

    /// Copy `seed` into current storage. Next storage is left as is; it is
    /// fully overwritten before it is ever read.
    fn ingest(&mut self, accel: &Self::Accel, seed: &Grid) -> GolResult<()>;

    /// Attach current (read) and next (write) storage to `work` at the
    /// backend's fixed binding slots.
    fn bind_for_step<'a>(&'a self, work: &mut <Self::Accel as Accelerator>::Work<'a>);

    /// Exchange current and next. O(1); never copies cells.
    fn swap(&mut self);

    /// Host-readable copy of current storage.
    fn read_current(&self, accel: &Self::Accel) -> GolResult<Grid>;

    /// Which role index is current (0 or 1). Exposed for tests and logging.
    fn current_index(&self) -> usize;
}

/// Check that `grid` matches a storage of `width × height`.
pub(crate) fn check_shape(width: u32, height: u32, grid: &Grid) -> GolResult<()> {
    if grid.width() != width as usize || grid.height() != height as usize {
        return Err(GolError::ShapeMismatch {
            width: width as usize,
            height: height as usize,
            got_width: grid.width(),
            got_height: grid.height(),
        });
    }
    Ok(())
}
