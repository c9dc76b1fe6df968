// sim/driver.rs — Simulation driver: N generations end to end.
//
// RESPONSIBILITIES:
//   1. Ingest the seed into storage.
//   2. Step `generations` times through one `Stepper`.
//   3. After each completed step, read a snapshot and hand it to the
//      observation hook with its 1-based generation index.
//   4. On failure, stop and report how far the run got, together with the
//      last consistent grid.
//
// Recording generation 0 is left to the caller. The hook is only invoked
// for generations the driver itself produced.
//
// The hook receives `&Grid`, a host copy owned by the driver. It cannot
// alias device storage, and the next step is not recorded until the hook
// returns.

use tracing::{debug, error, info};

use crate::error::{GolError, RunFailure};
use crate::grid::Grid;
use crate::sim::{CellStorage, Stepper};

/// Outcome of a run that reached its requested generation count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Current grid after the final generation (the seed when 0 were requested).
    pub grid: Grid,
    /// Generations completed. Always equals the requested count.
    pub generations: u64,
}

/// Runs generations over one storage on one accelerator.
///
/// Generic over the storage model only. Nothing in here knows which
/// backend it is driving.
pub struct Simulation<'a, S: CellStorage> {
    accel: &'a S::Accel,
    storage: S,
}

impl<'a, S: CellStorage> Simulation<'a, S> {
    pub fn new(accel: &'a S::Accel, storage: S) -> Self {
        Simulation { accel, storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Run `generations` steps from `seed`, calling `hook(snapshot, g)`
    /// after each completed generation `g` (1-based).
    ///
    /// # Errors
    /// A [`RunFailure`] whose `completed` is the number of generations that
    /// finished and whose `grid` is the snapshot of that generation. When
    /// the k-th step fails, `completed == k - 1`. A failed ingest reports
    /// `completed == 0` with the seed.
    pub fn run<H>(&mut self, seed: &Grid, generations: u64, mut hook: H) -> Result<RunReport, RunFailure>
    where
        H: FnMut(&Grid, u64),
    {
        let (width, height) = self.storage.dimensions();
        info!(width, height, generations, "simulation start");

        let fail = |completed: u64, grid: Grid, source: GolError| {
            error!(completed, requested = generations, error = %source, "simulation aborted");
            RunFailure {
                completed,
                requested: generations,
                width: width as usize,
                height: height as usize,
                grid,
                source,
            }
        };

        if let Err(e) = self.storage.ingest(self.accel, seed) {
            return Err(fail(0, seed.clone(), e));
        }

        let mut stepper = Stepper::new(width, height);
        let mut last = seed.clone();

        for g in 1..=generations {
            if let Err(e) = stepper.step(self.accel, &mut self.storage) {
                return Err(fail(g - 1, last, e));
            }
            // Generation g is in current storage but has not been observed;
            // a failed readback leaves g - 1 as the last consistent state.
            let snapshot = match self.storage.read_current(self.accel) {
                Ok(grid) => grid,
                Err(e) => return Err(fail(g - 1, last, e)),
            };
            hook(&snapshot, g);
            last = snapshot;
        }

        debug!(population = last.population(), "final grid");
        info!(generations, "simulation complete");
        Ok(RunReport { grid: last, generations })
    }
}
