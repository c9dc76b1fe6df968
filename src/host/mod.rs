// host/mod.rs — Host-memory accelerator: the simulated device.
//
// RESPONSIBILITIES
// ────────────────
// `HostDevice` implements `Accelerator` on the calling thread. It runs the
// same tiled dispatch a GPU would: one loop per tile and per thread in the
// tile, each thread bounds-checked against the grid before touching memory.
// That makes the dispatch geometry observable (`DispatchStats`) and lets
// tests inject device faults (`FaultPlan`) without a GPU present.
//
// Both storage variants live in `storage.rs`:
//   HostBufferStorage — planes with pitch == width (flat linear buffer)
//   HostImageStorage  — planes with rows padded to 64 cells (2D image)
//
// FAULT INJECTION
// ───────────────
// A fault plan names a 1-based submission or readback number. When that
// submission arrives, the device writes a garbage value over the first
// half of the "next" plane, as a real device might before reporting a
// fault, and then returns `DeviceExecutionError`. The stepper must not
// swap, so the garbage must never reach a snapshot. A readback fault
// leaves the planes alone and fails the copy back to the host with
// `GolError::Readback`.
//
// NEW RUST CONCEPTS:
// - `RefCell` — the storage binds its planes by shared reference (`&'a
//   HostPlane`), yet the kernel must write "next". `RefCell` moves the
//   aliasing check to runtime: `borrow()` for current, `borrow_mut()` for
//   next. Two distinct planes never conflict.
// - `Cell<u64>` — interior-mutable counter on a `&self` method. Not `Sync`,
//   so a `HostDevice` cannot be shared across threads, which matches the
//   single control thread driving a simulation.

mod storage;

pub use storage::{HostBufferStorage, HostImageStorage, Region};

use std::cell::{Cell, RefCell};

use tracing::{debug, warn};

use crate::error::{DeviceExecutionError, GolError, GolResult};
use crate::grid;
use crate::life;
use crate::sim::{Accelerator, DispatchGeometry, StepWork};

/// Default value written over "next" by an injected fault.
pub const GARBAGE: u32 = 0xDEAD_BEEF;

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

/// Which device operation a [`FaultPlan`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultSite {
    /// The n-th step submission fails after corrupting "next".
    Submission(u64),
    /// The n-th copy of current back to the host fails.
    Readback(u64),
}

/// Makes one device operation fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPlan {
    pub site: FaultSite,
    /// Value scribbled over the first half of "next" by a submission fault.
    pub garbage: u32,
}

impl FaultPlan {
    pub fn at_submission(submission: u64) -> Self {
        FaultPlan { site: FaultSite::Submission(submission), garbage: GARBAGE }
    }

    pub fn at_readback(readback: u64) -> Self {
        FaultPlan { site: FaultSite::Readback(readback), garbage: GARBAGE }
    }

    pub fn with_garbage(mut self, garbage: u32) -> Self {
        self.garbage = garbage;
        self
    }
}

// ---------------------------------------------------------------------------
// Dispatch statistics
// ---------------------------------------------------------------------------

/// What the last successful dispatch actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    /// Tiles (workgroups) launched.
    pub tiles: u64,
    /// Threads launched, including the ones that exited at the bounds check.
    pub threads: u64,
    /// Cells written to "next".
    pub cells_written: u64,
    /// Highest linear cell index (`y * width + x`) written, if any.
    pub max_index: Option<u64>,
}

// ---------------------------------------------------------------------------
// Planes
// ---------------------------------------------------------------------------

/// One grid-shaped plane of host memory with a row pitch in cells.
#[derive(Debug)]
pub struct HostPlane {
    cells: RefCell<Vec<u32>>,
    pitch: usize,
    rows: usize,
}

impl HostPlane {
    pub fn new(pitch: usize, rows: usize) -> Self {
        HostPlane { cells: RefCell::new(vec![grid::DEAD; pitch * rows]), pitch, rows }
    }

    /// Cells per row, including padding.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Exclusive access outside a dispatch (ingest).
    pub(crate) fn cells_mut(&mut self) -> &mut Vec<u32> {
        self.cells.get_mut()
    }

    /// Shared access outside a dispatch (readback).
    pub(crate) fn cells(&self) -> std::cell::Ref<'_, Vec<u32>> {
        self.cells.borrow()
    }
}

// ---------------------------------------------------------------------------
// Step work
// ---------------------------------------------------------------------------

/// One generation's worth of recorded host work.
#[derive(Debug, Default)]
pub struct HostStepWork<'a> {
    current: Option<&'a HostPlane>,
    next: Option<&'a HostPlane>,
    dimensions: Option<(u32, u32)>,
    geometry: Option<DispatchGeometry>,
}

impl<'a> HostStepWork<'a> {
    /// Bind `current` as the read plane (slot 0) and `next` as the write
    /// plane (slot 1).
    pub fn bind(&mut self, current: &'a HostPlane, next: &'a HostPlane) {
        self.current = Some(current);
        self.next = Some(next);
    }
}

impl StepWork for HostStepWork<'_> {
    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.dimensions = Some((width, height));
    }

    fn dispatch(&mut self, geometry: DispatchGeometry) {
        self.geometry = Some(geometry);
    }
}

// ---------------------------------------------------------------------------
// HostDevice
// ---------------------------------------------------------------------------

/// Accelerator that executes Life tiles on the calling thread.
#[derive(Debug, Default)]
pub struct HostDevice {
    submissions: Cell<u64>,
    readbacks: Cell<u64>,
    fault: Option<FaultPlan>,
    last_dispatch: Cell<Option<DispatchStats>>,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(plan: FaultPlan) -> Self {
        HostDevice { fault: Some(plan), ..Self::default() }
    }

    /// Submissions received so far, failed ones included.
    pub fn submissions(&self) -> u64 {
        self.submissions.get()
    }

    /// Readbacks attempted so far, failed ones included.
    pub fn readbacks(&self) -> u64 {
        self.readbacks.get()
    }

    /// Statistics of the most recent successful dispatch.
    pub fn last_dispatch(&self) -> Option<DispatchStats> {
        self.last_dispatch.get()
    }

    /// Count one copy back to the host, failing it if the fault plan says so.
    pub(crate) fn begin_readback(&self) -> GolResult<()> {
        let readback = self.readbacks.get() + 1;
        self.readbacks.set(readback);
        if self.fault.is_some_and(|p| p.site == FaultSite::Readback(readback)) {
            warn!(readback, "injected readback fault");
            return Err(GolError::Readback(format!("injected fault on readback {readback}")));
        }
        Ok(())
    }
}

impl Accelerator for HostDevice {
    type Work<'a> = HostStepWork<'a>;

    fn begin_step(&self) -> HostStepWork<'_> {
        HostStepWork::default()
    }

    fn submit_and_wait(&self, work: HostStepWork<'_>) -> GolResult<()> {
        let (Some(current), Some(next)) = (work.current, work.next) else {
            return Err(GolError::IncompleteStep("storage bindings"));
        };
        let Some((width, height)) = work.dimensions else {
            return Err(GolError::IncompleteStep("grid dimensions"));
        };
        let Some(geometry) = work.geometry else {
            return Err(GolError::IncompleteStep("a dispatch"));
        };

        let submission = self.submissions.get() + 1;
        self.submissions.set(submission);

        if let Some(plan) = self.fault.filter(|p| p.site == FaultSite::Submission(submission)) {
            let mut out = next.cells.borrow_mut();
            let half = out.len().div_ceil(2);
            out[..half].fill(plan.garbage);
            warn!(submission, "injected device fault");
            return Err(DeviceExecutionError::new(submission, "injected fault").into());
        }

        let stats = run_tiles(current, next, width as usize, height as usize, geometry);
        debug!(
            submission,
            tiles = stats.tiles,
            written = stats.cells_written,
            "host dispatch complete"
        );
        self.last_dispatch.set(Some(stats));
        Ok(())
    }
}

/// The Life kernel, executed tile by tile.
fn run_tiles(
    current: &HostPlane,
    next: &HostPlane,
    width: usize,
    height: usize,
    geometry: DispatchGeometry,
) -> DispatchStats {
    let src = current.cells.borrow();
    let mut dst = next.cells.borrow_mut();
    let (src_pitch, dst_pitch) = (current.pitch, next.pitch);
    let tile = geometry.tile as usize;

    let mut stats = DispatchStats::default();
    for ty in 0..geometry.tiles_y as usize {
        for tx in 0..geometry.tiles_x as usize {
            stats.tiles += 1;
            for ly in 0..tile {
                for lx in 0..tile {
                    stats.threads += 1;
                    let (x, y) = (tx * tile + lx, ty * tile + ly);
                    if x >= width || y >= height {
                        continue;
                    }
                    let n = life::count_live_neighbors(x, y, width, height, |nx, ny| {
                        src[ny * src_pitch + nx]
                    });
                    let here = grid::Cell::from_raw(src[y * src_pitch + x]);
                    dst[y * dst_pitch + x] = life::next_state(here, n).raw();
                    stats.cells_written += 1;
                    let index = (y * width + x) as u64;
                    stats.max_index = Some(stats.max_index.map_or(index, |m| m.max(index)));
                }
            }
        }
    }
    stats
}
