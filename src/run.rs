// run.rs — Pick a backend from a `RunConfig` and drive it.
//
// This is the only place that names concrete backends. Everything past
// `drive` is generic over `CellStorage`.

use tracing::info;

use crate::config::{BackendKind, RunConfig};
use crate::error::{GolError, GolResult};
use crate::gpu::{GpuBufferStorage, GpuDevice, GpuTextureStorage};
use crate::grid::Grid;
use crate::host::{HostBufferStorage, HostDevice, HostImageStorage};
use crate::sim::{CellStorage, RunReport, Simulation};

/// The seed grid `config` describes.
pub fn seed_grid(config: &RunConfig) -> Grid {
    Grid::random(config.width as usize, config.height as usize, config.density, config.seed)
}

/// Validate `config`, seed a grid, and run it on `config.backend`.
///
/// `hook` is called after every completed generation. Generation 0 is not
/// reported; use [`seed_grid`] to record it.
///
/// # Errors
/// Configuration and setup errors are returned as they are. A failure
/// during the run is `GolError::RunAborted` carrying the completed
/// generation count and the last consistent grid.
pub fn simulate<H>(config: &RunConfig, hook: H) -> GolResult<RunReport>
where
    H: FnMut(&Grid, u64),
{
    config.validate()?;
    let seed = seed_grid(config);
    info!(
        backend = %config.backend,
        seed = config.seed,
        density = config.density,
        population = seed.population(),
        "seeded grid"
    );
    simulate_from(config.backend, &seed, config.generations, hook)
}

/// Run `generations` steps of `seed` on `backend`.
pub fn simulate_from<H>(backend: BackendKind, seed: &Grid, generations: u64, hook: H) -> GolResult<RunReport>
where
    H: FnMut(&Grid, u64),
{
    let (w, h) = (seed.width() as u32, seed.height() as u32);
    match backend {
        BackendKind::HostBuffer => {
            let dev = HostDevice::new();
            drive(&dev, HostBufferStorage::new(w, h)?, seed, generations, hook)
        }
        BackendKind::HostImage => {
            let dev = HostDevice::new();
            drive(&dev, HostImageStorage::new(w, h)?, seed, generations, hook)
        }
        BackendKind::GpuBuffer => {
            let gpu = GpuDevice::new()?;
            drive(&gpu, GpuBufferStorage::new(&gpu, w, h)?, seed, generations, hook)
        }
        BackendKind::GpuTexture => {
            let gpu = GpuDevice::new()?;
            drive(&gpu, GpuTextureStorage::new(&gpu, w, h)?, seed, generations, hook)
        }
    }
}

fn drive<S, H>(accel: &S::Accel, storage: S, seed: &Grid, generations: u64, hook: H) -> GolResult<RunReport>
where
    S: CellStorage,
    H: FnMut(&Grid, u64),
{
    Simulation::new(accel, storage)
        .run(seed, generations, hook)
        .map_err(GolError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::life;

    fn host_config(backend: BackendKind) -> RunConfig {
        RunConfig { width: 48, height: 40, generations: 12, backend, ..Default::default() }
    }

    #[test]
    fn test_seed_grid_is_deterministic() {
        let cfg = RunConfig::default();
        assert_eq!(seed_grid(&cfg), seed_grid(&cfg));
        let other = RunConfig { seed: 1338, ..cfg.clone() };
        assert_ne!(seed_grid(&cfg), seed_grid(&other));
    }

    #[test]
    fn test_host_backends_match_reference() {
        for backend in [BackendKind::HostBuffer, BackendKind::HostImage] {
            let cfg = host_config(backend);
            let mut last = 0;
            let report = simulate(&cfg, |_, g| last = g).unwrap();
            assert_eq!(last, 12);
            assert_eq!(report.grid, life::run(&seed_grid(&cfg), 12), "{backend}");
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_running() {
        let cfg = RunConfig { width: 0, backend: BackendKind::HostBuffer, ..Default::default() };
        let mut calls = 0;
        let err = simulate(&cfg, |_, _| calls += 1).unwrap_err();
        assert!(matches!(err, GolError::Config(ConfigError::ZeroDimension { .. })));
        assert_eq!(calls, 0);
    }
}
