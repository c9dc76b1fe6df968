// sim/stepper.rs — Generation stepper: one synchronous step at a time.
//
// STATE MACHINE
// ─────────────
//
//            step()                 submit_and_wait Ok
//   Idle ───────────────► Dispatched ──────────────────► Swapped
//    ▲                        │                             │
//    │                        │ submit_and_wait Err         │
//    │                        ▼                             │
//    │                     Faulted (terminal)               │
//    └──────────────────────────────────────────────────────┘
//                      next step() (implicit)
//
// The swap happens only on the Ok edge. On the Err edge the storage is left
// exactly as it was: current still holds the last completed generation and
// whatever the device scribbled into next stays unreachable.
//
// Consecutive steps never overlap. `submit_and_wait` blocks until the
// device is idle, and the next dispatch is recorded only after `swap`
// returns, so every dispatch reads a fully settled generation.

use tracing::{debug, error};

use crate::error::{GolError, GolResult};
use crate::sim::{Accelerator, CellStorage, DispatchGeometry, StepWork};

/// Where the stepper is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Ready for `step()`.
    Idle,
    /// Work recorded and submitted; waiting on the device.
    Dispatched,
    /// Device finished and storage roles were exchanged.
    Swapped,
    /// A dispatch failed. The stepper refuses further steps.
    Faulted,
}

/// Drives single generations over any [`CellStorage`].
///
/// Grid size is fixed for the lifetime of a stepper, so the dispatch
/// geometry is computed once in `new`.
#[derive(Debug, Clone)]
pub struct Stepper {
    width: u32,
    height: u32,
    geometry: DispatchGeometry,
    state: StepState,
    generation: u64,
}

impl Stepper {
    pub fn new(width: u32, height: u32) -> Self {
        Stepper {
            width,
            height,
            geometry: DispatchGeometry::covering(width, height),
            state: StepState::Idle,
            generation: 0,
        }
    }

    /// Stepper sized for `storage`.
    pub fn for_storage<S: CellStorage>(storage: &S) -> Self {
        let (w, h) = storage.dimensions();
        Self::new(w, h)
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    /// Generations completed so far (0 before the first step).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn geometry(&self) -> DispatchGeometry {
        self.geometry
    }

    /// Advance `storage` by one generation.
    ///
    /// Returns the generation number now held in current storage.
    ///
    /// # Errors
    /// - whatever `submit_and_wait` reports (typically
    ///   `GolError::DeviceExecution`); the stepper moves to `Faulted` and
    ///   storage is not swapped.
    /// - `GolError::StepperFaulted` if called again after a failure.
    pub fn step<S: CellStorage>(&mut self, accel: &S::Accel, storage: &mut S) -> GolResult<u64> {
        if self.state == StepState::Faulted {
            return Err(GolError::StepperFaulted { generation: self.generation });
        }
        debug_assert_eq!(storage.dimensions(), (self.width, self.height));

        self.state = StepState::Dispatched;
        let result = {
            let mut work = accel.begin_step();
            storage.bind_for_step(&mut work);
            work.set_dimensions(self.width, self.height);
            work.dispatch(self.geometry);
            accel.submit_and_wait(work)
        };

        match result {
            Ok(()) => {
                storage.swap();
                self.generation += 1;
                self.state = StepState::Swapped;
                debug!(
                    generation = self.generation,
                    current = storage.current_index(),
                    "generation complete"
                );
                Ok(self.generation)
            }
            Err(e) => {
                self.state = StepState::Faulted;
                error!(
                    generation = self.generation + 1,
                    error = %e,
                    "dispatch failed; storage not swapped"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GolError;
    use crate::grid::Grid;
    use crate::host::{FaultPlan, HostBufferStorage, HostDevice};
    use crate::life;

    #[test]
    fn test_geometry_fixed_at_construction() {
        let s = Stepper::new(40, 20);
        assert_eq!(s.geometry(), DispatchGeometry { tiles_x: 3, tiles_y: 2, tile: 16 });
        assert_eq!(s.state(), StepState::Idle);
        assert_eq!(s.generation(), 0);
    }

    #[test]
    fn test_step_swaps_and_counts() {
        let dev = HostDevice::new();
        let seed = Grid::random(20, 12, 0.4, 11);
        let mut storage = HostBufferStorage::new(20, 12).unwrap();
        storage.ingest(&dev, &seed).unwrap();
        let mut stepper = Stepper::for_storage(&storage);

        let before = storage.current_index();
        assert_eq!(stepper.step(&dev, &mut storage).unwrap(), 1);
        assert_eq!(stepper.state(), StepState::Swapped);
        assert_ne!(storage.current_index(), before);
        assert_eq!(storage.read_current(&dev).unwrap(), life::step(&seed));

        assert_eq!(stepper.step(&dev, &mut storage).unwrap(), 2);
        assert_eq!(storage.current_index(), before);
        assert_eq!(storage.read_current(&dev).unwrap(), life::run(&seed, 2));
    }

    #[test]
    fn test_failed_step_does_not_swap() {
        let dev = HostDevice::with_fault(FaultPlan::at_submission(1));
        let seed = Grid::random(16, 16, 0.3, 5);
        let mut storage = HostBufferStorage::new(16, 16).unwrap();
        storage.ingest(&dev, &seed).unwrap();
        let mut stepper = Stepper::for_storage(&storage);

        let before = storage.current_index();
        let err = stepper.step(&dev, &mut storage).unwrap_err();
        assert!(matches!(err, GolError::DeviceExecution(_)), "{err}");
        assert_eq!(stepper.state(), StepState::Faulted);
        assert_eq!(stepper.generation(), 0);
        assert_eq!(storage.current_index(), before);
        assert_eq!(storage.read_current(&dev).unwrap(), seed);
    }

    #[test]
    fn test_faulted_stepper_refuses_further_steps() {
        let dev = HostDevice::with_fault(FaultPlan::at_submission(2));
        let mut storage = HostBufferStorage::new(8, 8).unwrap();
        storage.ingest(&dev, &Grid::new(8, 8)).unwrap();
        let mut stepper = Stepper::new(8, 8);

        stepper.step(&dev, &mut storage).unwrap();
        stepper.step(&dev, &mut storage).unwrap_err();
        let submissions = dev.submissions();
        let err = stepper.step(&dev, &mut storage).unwrap_err();
        assert!(matches!(err, GolError::StepperFaulted { generation: 1 }));
        // No further work reached the device.
        assert_eq!(dev.submissions(), submissions);
    }
}
