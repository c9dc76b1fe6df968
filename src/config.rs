// config.rs — Run configuration and validation.
//
// Validation happens in two places:
//   `RunConfig::validate` — pure checks, no device needed (dimensions,
//                           density, index range). Called before anything
//                           is allocated.
//   storage constructors  — device-limit checks (max texture dimension,
//                           max storage binding size, max workgroups per
//                           dispatch dimension), reported through the
//                           same `ConfigError` type and also raised before
//                           the first allocation.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::grid::DEFAULT_DENSITY;

/// Which storage model and accelerator carry the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// wgpu storage buffers, flat `array<u32>`.
    GpuBuffer,
    /// wgpu `R32Uint` 2D textures.
    GpuTexture,
    /// Host memory, flat planes.
    HostBuffer,
    /// Host memory, pitched 2D planes with region-based transfer.
    HostImage,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::GpuBuffer,
        BackendKind::GpuTexture,
        BackendKind::HostBuffer,
        BackendKind::HostImage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::GpuBuffer => "gpu-buffer",
            BackendKind::GpuTexture => "gpu-texture",
            BackendKind::HostBuffer => "host-buffer",
            BackendKind::HostImage => "host-image",
        }
    }

    pub fn is_gpu(self) -> bool {
        matches!(self, BackendKind::GpuBuffer | BackendKind::GpuTexture)
    }

    /// The other storage layout on the same accelerator.
    pub fn sibling(self) -> BackendKind {
        match self {
            BackendKind::GpuBuffer => BackendKind::GpuTexture,
            BackendKind::GpuTexture => BackendKind::GpuBuffer,
            BackendKind::HostBuffer => BackendKind::HostImage,
            BackendKind::HostImage => BackendKind::HostBuffer,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gpu-buffer" | "buffer" => Ok(BackendKind::GpuBuffer),
            "gpu-texture" | "texture" => Ok(BackendKind::GpuTexture),
            "host-buffer" => Ok(BackendKind::HostBuffer),
            "host-image" => Ok(BackendKind::HostImage),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// A configuration rejected before any backend resource is allocated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid dimensions must be non-zero (got {width}×{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("grid of {width}×{height} cells exceeds 32-bit cell indexing")]
    TooManyCells { width: u32, height: u32 },

    #[error("density must be a finite probability in [0, 1] (got {0})")]
    Density(f64),

    #[error("{width}×{height} exceeds the device's maximum 2D image size of {max}")]
    ExceedsImageLimit { width: u32, height: u32, max: u32 },

    #[error("grid needs {bytes} bytes of storage but the device binds at most {max}")]
    ExceedsBufferLimit { bytes: u64, max: u64 },

    #[error("grid needs {tiles_x}×{tiles_y} workgroups but the device dispatches at most {max} per dimension")]
    ExceedsDispatchLimit { tiles_x: u32, tiles_y: u32, max: u32 },

    #[error("unknown backend `{0}` (expected gpu-buffer, gpu-texture, host-buffer or host-image)")]
    UnknownBackend(String),
}

/// Everything needed to reproduce a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Number of generations to advance. 0 returns the seed unchanged.
    pub generations: u64,
    pub backend: BackendKind,
    /// Seed for the initial-grid generator.
    pub seed: u64,
    /// Probability that a seeded cell starts alive.
    pub density: f64,
}

impl Default for RunConfig {
    /// 512×512, 100 generations, density 0.2, seed 1337.
    fn default() -> Self {
        RunConfig {
            width: 512,
            height: 512,
            generations: 100,
            backend: BackendKind::GpuBuffer,
            seed: 1337,
            density: DEFAULT_DENSITY,
        }
    }
}

impl RunConfig {
    /// Device-independent validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions(self.width, self.height)?;
        if !self.density.is_finite() || !(0.0..=1.0).contains(&self.density) {
            return Err(ConfigError::Density(self.density));
        }
        Ok(())
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Check that a `width × height` grid is non-empty and addressable with
/// 32-bit linear indices (the kernels index with `u32`).
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::ZeroDimension { width, height });
    }
    if width as u64 * height as u64 > u32::MAX as u64 {
        return Err(ConfigError::TooManyCells { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.cell_count(), 512 * 512);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let cfg = RunConfig { width: 0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDimension { width: 0, height: 512 }));
        let cfg = RunConfig { height: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroDimension { .. })));
    }

    #[test]
    fn test_zero_generations_allowed() {
        let cfg = RunConfig { generations: 0, ..Default::default() };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_density_range() {
        for bad in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let cfg = RunConfig { density: bad, ..Default::default() };
            assert!(matches!(cfg.validate(), Err(ConfigError::Density(_))), "{bad} accepted");
        }
        for ok in [0.0, 0.5, 1.0] {
            let cfg = RunConfig { density: ok, ..Default::default() };
            assert_eq!(cfg.validate(), Ok(()));
        }
    }

    #[test]
    fn test_too_many_cells() {
        assert!(matches!(
            validate_dimensions(u32::MAX, 2),
            Err(ConfigError::TooManyCells { .. })
        ));
        assert_eq!(validate_dimensions(65536, 65535), Ok(()));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("gpu-buffer".parse::<BackendKind>(), Ok(BackendKind::GpuBuffer));
        assert_eq!("Texture".parse::<BackendKind>(), Ok(BackendKind::GpuTexture));
        assert_eq!("host-image".parse::<BackendKind>(), Ok(BackendKind::HostImage));
        assert!(matches!("metal".parse::<BackendKind>(), Err(ConfigError::UnknownBackend(_))));
        for kind in BackendKind::ALL {
            assert_eq!(kind.name().parse::<BackendKind>(), Ok(kind));
            assert_eq!(kind.sibling().sibling(), kind);
            assert_eq!(kind.sibling().is_gpu(), kind.is_gpu());
        }
    }
}
