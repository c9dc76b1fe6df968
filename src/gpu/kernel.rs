// gpu/kernel.rs — The compiled Life kernel, one per storage layout.
//
// Both layouts use the same three bindings:
//
//   binding 0 — current generation (read)
//   binding 1 — next generation (write)
//   binding 2 — LifeParams uniform { width, height }
//
// and differ only in the resource type at bindings 0 and 1:
//
//   Buffer   var<storage, read> array<u32> / var<storage, read_write> array<u32>
//   Texture  texture_2d<u32>               / texture_storage_2d<r32uint, write>
//
// The tile edge is substituted into the WGSL template (`{{TILE}}`) before
// compilation so the workgroup size always matches `DispatchGeometry`.

use crate::error::{GolError, GolResult};
use crate::gpu::device::GpuDevice;
use crate::sim::TILE_SIZE;

// ---------------------------------------------------------------------------
// Uniform params (must match WGSL struct LifeParams exactly)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LifeParams {
    pub width: u32,
    pub height: u32,
    // Uniform structs are sized in multiples of 16 bytes.
    _pad0: u32,
    _pad1: u32,
}

impl LifeParams {
    pub fn new(width: u32, height: u32) -> Self {
        LifeParams { width, height, _pad0: 0, _pad1: 0 }
    }
}

/// Which storage layout a kernel is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelLayout {
    Buffer,
    Texture,
}

impl KernelLayout {
    fn source_template(self) -> &'static str {
        match self {
            KernelLayout::Buffer => include_str!("../shaders/life_buffer.wgsl"),
            KernelLayout::Texture => include_str!("../shaders/life_texture.wgsl"),
        }
    }

    pub fn shader_name(self) -> &'static str {
        match self {
            KernelLayout::Buffer => "life_buffer.wgsl",
            KernelLayout::Texture => "life_texture.wgsl",
        }
    }

    /// WGSL source with the tile size substituted.
    pub fn source(self) -> String {
        self.source_template().replace("{{TILE}}", &TILE_SIZE.to_string())
    }

    fn layout_entries(self) -> [wgpu::BindGroupLayoutEntry; 3] {
        let (current, next) = match self {
            KernelLayout::Buffer => (
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
            ),
            KernelLayout::Texture => (
                wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Uint,
                },
                wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: wgpu::TextureFormat::R32Uint,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
            ),
        };
        let entry = |binding, ty| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty,
            count: None,
        };
        [
            entry(0, current),
            entry(1, next),
            entry(
                2,
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
            ),
        ]
    }
}

// ---------------------------------------------------------------------------
// LifeKernel
// ---------------------------------------------------------------------------

/// Compute pipeline, its bind group layout, and the params uniform.
///
/// Each storage owns one kernel; its two bind groups (one per ping-pong
/// direction) reference the kernel's `params` buffer.
pub struct LifeKernel {
    pub layout: KernelLayout,
    pub pipeline: wgpu::ComputePipeline,
    pub bgl: wgpu::BindGroupLayout,
    pub params: wgpu::Buffer,
}

impl LifeKernel {
    const ENTRY_POINT: &'static str = "step_generation";

    /// Compile the kernel for `layout`.
    ///
    /// # Errors
    /// `GolError::KernelCompile` if shader parsing, validation, or pipeline
    /// creation reports an error.
    pub fn new(gpu: &GpuDevice, layout: KernelLayout) -> GolResult<Self> {
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(layout.shader_name()),
            source: wgpu::ShaderSource::Wgsl(layout.source().into()),
        });

        let bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("life BGL"),
            entries: &layout.layout_entries(),
        });

        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("life pipeline layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(Self::ENTRY_POINT),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Self::ENTRY_POINT,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let params = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("life params"),
            size: std::mem::size_of::<LifeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        if let Some(e) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(GolError::KernelCompile {
                kernel: layout.shader_name(),
                message: e.to_string(),
            });
        }
        tracing::debug!(kernel = layout.shader_name(), "kernel compiled");

        Ok(LifeKernel { layout, pipeline, bgl, params })
    }

    pub fn entry_point(&self) -> &'static str {
        Self::ENTRY_POINT
    }
}
