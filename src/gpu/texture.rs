// gpu/texture.rs — 2D-image storage variant on R32Uint textures.
//
// Two `R32Uint` textures, each usable as a sampled texture (read side),
// a write-only storage texture (write side), and a copy source and
// destination. As with the buffer variant, one bind group per direction
// is built up front and `swap` only flips an index.
//
// THE ROW-ALIGNMENT PROBLEM
// ─────────────────────────
// `copy_texture_to_buffer` requires `bytes_per_row` to be a multiple of
// `COPY_BYTES_PER_ROW_ALIGNMENT` (256). A 100-cell row is 400 bytes, so the
// staging buffer rows are padded to 512:
//
//   staging row y:  [ 400 bytes of cells | 112 bytes padding ]
//
// Extraction copies the first `width` cells of each row into a packed
// `Grid`. Uploads go through `queue.write_texture`, which has no alignment
// requirement, so ingest writes the packed grid directly.

use tracing::debug;

use crate::config::{validate_dimensions, ConfigError};
use crate::error::GolResult;
use crate::gpu::device::{GpuDevice, GpuStepWork};
use crate::gpu::kernel::{KernelLayout, LifeKernel};
use crate::grid::Grid;
use crate::sim::{align_to, check_shape, CellStorage, DispatchGeometry};

const COPY_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
const CELL_BYTES: u32 = std::mem::size_of::<u32>() as u32;

pub struct GpuTextureStorage {
    width: u32,
    height: u32,
    kernel: LifeKernel,
    textures: [wgpu::Texture; 2],
    bind_groups: [wgpu::BindGroup; 2],
    staging: wgpu::Buffer,
    padded_bytes_per_row: u32,
    current: usize,
}

impl GpuTextureStorage {
    /// Allocate both textures and compile the texture-layout kernel.
    ///
    /// # Errors
    /// - `ConfigError::ExceedsImageLimit` if either dimension exceeds the
    ///   device's `max_texture_dimension_2d`.
    /// - `ConfigError::ExceedsDispatchLimit` if the tiling needs more
    ///   workgroups per axis than the device dispatches.
    /// - `GolError::KernelCompile` if the kernel fails to build.
    pub fn new(gpu: &GpuDevice, width: u32, height: u32) -> GolResult<Self> {
        validate_dimensions(width, height)?;
        let limits = gpu.device.limits();
        let max = limits.max_texture_dimension_2d;
        if width > max || height > max {
            return Err(ConfigError::ExceedsImageLimit { width, height, max }.into());
        }
        DispatchGeometry::covering(width, height).check_limit(limits.max_compute_workgroups_per_dimension)?;

        let kernel = LifeKernel::new(gpu, KernelLayout::Texture)?;

        let make = |label| {
            gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: extent(width, height),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R32Uint,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
        };
        let textures = [make("cells image 0"), make("cells image 1")];
        let views = textures
            .each_ref()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));

        let bind = |read: &wgpu::TextureView, write: &wgpu::TextureView, label| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &kernel.bgl,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(read) },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(write) },
                    wgpu::BindGroupEntry { binding: 2, resource: kernel.params.as_entire_binding() },
                ],
            })
        };
        let bind_groups = [
            bind(&views[0], &views[1], "cells image 0 -> 1"),
            bind(&views[1], &views[0], "cells image 1 -> 0"),
        ];

        let padded_bytes_per_row = align_to(width * CELL_BYTES, COPY_ALIGNMENT);
        let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cells image readback"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        debug!(width, height, padded_bytes_per_row, "allocated GPU texture storage");
        Ok(GpuTextureStorage {
            width,
            height,
            kernel,
            textures,
            bind_groups,
            staging,
            padded_bytes_per_row,
            current: 0,
        })
    }

    fn copy_target(&self) -> wgpu::ImageCopyTexture<'_> {
        wgpu::ImageCopyTexture {
            texture: &self.textures[self.current],
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        }
    }

    /// Strip row padding from a mapped staging buffer.
    fn extract(&self, bytes: &[u8]) -> Vec<u32> {
        let row_bytes = (self.width * CELL_BYTES) as usize;
        let pitch = self.padded_bytes_per_row as usize;
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height as usize {
            let row = &bytes[y * pitch..y * pitch + row_bytes];
            out.extend_from_slice(bytemuck::cast_slice::<u8, u32>(row));
        }
        out
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d { width, height, depth_or_array_layers: 1 }
}

impl CellStorage for GpuTextureStorage {
    type Accel = GpuDevice;

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn ingest(&mut self, gpu: &GpuDevice, seed: &Grid) -> GolResult<()> {
        check_shape(self.width, self.height, seed)?;
        gpu.queue.write_texture(
            self.copy_target(),
            bytemuck::cast_slice(seed.as_slice()),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width * CELL_BYTES),
                rows_per_image: Some(self.height),
            },
            extent(self.width, self.height),
        );
        Ok(())
    }

    fn bind_for_step<'a>(&'a self, work: &mut GpuStepWork<'a>) {
        work.bind(&self.kernel, &self.bind_groups[self.current]);
    }

    fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    fn read_current(&self, gpu: &GpuDevice) -> GolResult<Grid> {
        let cells = gpu.read_back(
            &self.staging,
            |encoder| {
                encoder.copy_texture_to_buffer(
                    self.copy_target(),
                    wgpu::ImageCopyBuffer {
                        buffer: &self.staging,
                        layout: wgpu::ImageDataLayout {
                            offset: 0,
                            bytes_per_row: Some(self.padded_bytes_per_row),
                            rows_per_image: Some(self.height),
                        },
                    },
                    extent(self.width, self.height),
                )
            },
            |bytes| self.extract(bytes),
        )?;
        Ok(Grid::from_raw_cells(self.width as usize, self.height as usize, cells))
    }

    fn current_index(&self) -> usize {
        self.current
    }
}
