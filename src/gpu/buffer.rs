// gpu/buffer.rs — Linear-buffer storage variant on wgpu storage buffers.
//
// Two `STORAGE` buffers of `width * height` u32 cells, plus one bind group
// per ping-pong direction:
//
//   bind_groups[0]: binding 0 = buffers[0], binding 1 = buffers[1]
//   bind_groups[1]: binding 0 = buffers[1], binding 1 = buffers[0]
//
// `swap` only flips `current`, which selects both the bind group for the
// next step and the buffer read back. Nothing is re-created per step.
//
// READBACK
// ────────
// Storage buffers cannot be `MAP_READ` on portable wgpu, so the current
// buffer is copied into a persistent staging buffer with
// `copy_buffer_to_buffer` and mapped there. The layout is identical on
// both sides (no row padding), so the mapped bytes are the grid.

use tracing::debug;

use crate::config::{validate_dimensions, ConfigError};
use crate::error::GolResult;
use crate::gpu::device::{GpuDevice, GpuStepWork};
use crate::gpu::kernel::{KernelLayout, LifeKernel};
use crate::grid::Grid;
use crate::sim::{check_shape, CellStorage, DispatchGeometry};

pub struct GpuBufferStorage {
    width: u32,
    height: u32,
    kernel: LifeKernel,
    buffers: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
    staging: wgpu::Buffer,
    current: usize,
}

impl GpuBufferStorage {
    /// Allocate both buffers and compile the buffer-layout kernel.
    ///
    /// # Errors
    /// - `ConfigError::ExceedsBufferLimit` if one generation does not fit
    ///   in a single storage binding on this device.
    /// - `ConfigError::ExceedsDispatchLimit` if the tiling needs more
    ///   workgroups per axis than the device dispatches.
    /// - `GolError::KernelCompile` if the kernel fails to build.
    pub fn new(gpu: &GpuDevice, width: u32, height: u32) -> GolResult<Self> {
        validate_dimensions(width, height)?;
        let bytes = width as u64 * height as u64 * std::mem::size_of::<u32>() as u64;
        let limits = gpu.device.limits();
        let max = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
        if bytes > max {
            return Err(ConfigError::ExceedsBufferLimit { bytes, max }.into());
        }
        DispatchGeometry::covering(width, height).check_limit(limits.max_compute_workgroups_per_dimension)?;

        let kernel = LifeKernel::new(gpu, KernelLayout::Buffer)?;

        let make = |label| {
            gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: bytes,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let buffers = [make("cells 0"), make("cells 1")];

        let bind = |read: &wgpu::Buffer, write: &wgpu::Buffer, label| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &kernel.bgl,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: read.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: write.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: kernel.params.as_entire_binding() },
                ],
            })
        };
        let bind_groups = [
            bind(&buffers[0], &buffers[1], "cells 0 -> 1"),
            bind(&buffers[1], &buffers[0], "cells 1 -> 0"),
        ];

        let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cells readback"),
            size: bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        debug!(width, height, bytes, "allocated GPU buffer storage");
        Ok(GpuBufferStorage { width, height, kernel, buffers, bind_groups, staging, current: 0 })
    }

    fn byte_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * std::mem::size_of::<u32>() as u64
    }
}

impl CellStorage for GpuBufferStorage {
    type Accel = GpuDevice;

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn ingest(&mut self, gpu: &GpuDevice, seed: &Grid) -> GolResult<()> {
        check_shape(self.width, self.height, seed)?;
        gpu.queue.write_buffer(&self.buffers[self.current], 0, bytemuck::cast_slice(seed.as_slice()));
        Ok(())
    }

    fn bind_for_step<'a>(&'a self, work: &mut GpuStepWork<'a>) {
        work.bind(&self.kernel, &self.bind_groups[self.current]);
    }

    fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    fn read_current(&self, gpu: &GpuDevice) -> GolResult<Grid> {
        let size = self.byte_len();
        let cells = gpu.read_back(
            &self.staging,
            |encoder| encoder.copy_buffer_to_buffer(&self.buffers[self.current], 0, &self.staging, 0, size),
            |bytes| bytemuck::cast_slice::<u8, u32>(bytes).to_vec(),
        )?;
        Ok(Grid::from_raw_cells(self.width as usize, self.height as usize, cells))
    }

    fn current_index(&self) -> usize {
        self.current
    }
}
