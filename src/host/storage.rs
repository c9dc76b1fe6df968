// host/storage.rs — The two storage variants on host memory.
//
//   HostBufferStorage   pitch = width            flat copy in, flat copy out
//   HostImageStorage    pitch = align(width, 64) region copy in, extraction out
//
// The image variant never exposes its padding: ingest writes only the
// `width × height` region, and readback extracts the same region row by
// row into a tightly packed `Grid`.

use tracing::debug;

use crate::config::validate_dimensions;
use crate::error::GolResult;
use crate::grid::Grid;
use crate::host::{HostDevice, HostPlane, HostStepWork};
use crate::sim::{align_to, check_shape, CellStorage};

/// Row alignment of the pitched plane, in cells (256 bytes of `u32`).
pub const IMAGE_ROW_ALIGNMENT: u32 = 64;

// ---------------------------------------------------------------------------
// Linear buffer variant
// ---------------------------------------------------------------------------

/// Current/next pair of flat `width * height` planes.
#[derive(Debug)]
pub struct HostBufferStorage {
    width: u32,
    height: u32,
    planes: [HostPlane; 2],
    current: usize,
}

impl HostBufferStorage {
    pub fn new(width: u32, height: u32) -> GolResult<Self> {
        validate_dimensions(width, height)?;
        let (w, h) = (width as usize, height as usize);
        debug!(width, height, "allocating host buffer planes");
        Ok(HostBufferStorage {
            width,
            height,
            planes: [HostPlane::new(w, h), HostPlane::new(w, h)],
            current: 0,
        })
    }
}

impl CellStorage for HostBufferStorage {
    type Accel = HostDevice;

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn ingest(&mut self, _accel: &HostDevice, seed: &Grid) -> GolResult<()> {
        check_shape(self.width, self.height, seed)?;
        self.planes[self.current].cells_mut().copy_from_slice(seed.as_slice());
        Ok(())
    }

    fn bind_for_step<'a>(&'a self, work: &mut HostStepWork<'a>) {
        work.bind(&self.planes[self.current], &self.planes[1 - self.current]);
    }

    fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    fn read_current(&self, accel: &HostDevice) -> GolResult<Grid> {
        accel.begin_readback()?;
        let cells = self.planes[self.current].cells().clone();
        Ok(Grid::from_raw_cells(self.width as usize, self.height as usize, cells))
    }

    fn current_index(&self) -> usize {
        self.current
    }
}

// ---------------------------------------------------------------------------
// 2D image variant
// ---------------------------------------------------------------------------

/// A rectangular region of a 2D plane: origin and size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// The whole `width × height` grid.
    pub fn full(width: u32, height: u32) -> Self {
        Region { x: 0, y: 0, width, height }
    }
}

/// Current/next pair of pitched 2D planes, addressed by region.
#[derive(Debug)]
pub struct HostImageStorage {
    width: u32,
    height: u32,
    pitch: u32,
    planes: [HostPlane; 2],
    current: usize,
}

impl HostImageStorage {
    pub fn new(width: u32, height: u32) -> GolResult<Self> {
        validate_dimensions(width, height)?;
        let pitch = align_to(width, IMAGE_ROW_ALIGNMENT);
        let (p, h) = (pitch as usize, height as usize);
        debug!(width, height, pitch, "allocating host image planes");
        Ok(HostImageStorage {
            width,
            height,
            pitch,
            planes: [HostPlane::new(p, h), HostPlane::new(p, h)],
            current: 0,
        })
    }

    /// Row pitch in cells.
    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    /// Copy tightly packed `src` rows into `region` of the current plane.
    fn replace_region(&mut self, region: Region, src: &[u32]) {
        let pitch = self.pitch as usize;
        let (rx, rw) = (region.x as usize, region.width as usize);
        let dst = self.planes[self.current].cells_mut();
        for (row, src_row) in src.chunks_exact(rw).enumerate() {
            let start = (region.y as usize + row) * pitch + rx;
            dst[start..start + rw].copy_from_slice(src_row);
        }
    }

    /// Tightly packed copy of `region` of the current plane.
    fn extract_region(&self, region: Region) -> Vec<u32> {
        let pitch = self.pitch as usize;
        let (rx, rw) = (region.x as usize, region.width as usize);
        let src = self.planes[self.current].cells();
        let mut out = Vec::with_capacity(rw * region.height as usize);
        for row in 0..region.height as usize {
            let start = (region.y as usize + row) * pitch + rx;
            out.extend_from_slice(&src[start..start + rw]);
        }
        out
    }
}

impl CellStorage for HostImageStorage {
    type Accel = HostDevice;

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn ingest(&mut self, _accel: &HostDevice, seed: &Grid) -> GolResult<()> {
        check_shape(self.width, self.height, seed)?;
        self.replace_region(Region::full(self.width, self.height), seed.as_slice());
        Ok(())
    }

    fn bind_for_step<'a>(&'a self, work: &mut HostStepWork<'a>) {
        work.bind(&self.planes[self.current], &self.planes[1 - self.current]);
    }

    fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    fn read_current(&self, accel: &HostDevice) -> GolResult<Grid> {
        accel.begin_readback()?;
        let cells = self.extract_region(Region::full(self.width, self.height));
        Ok(Grid::from_raw_cells(self.width as usize, self.height as usize, cells))
    }

    fn current_index(&self) -> usize {
        self.current
    }
}
