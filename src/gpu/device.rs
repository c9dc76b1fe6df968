// gpu/device.rs — wgpu compute backend handle.
//
// Responsibilities:
//   - Enumerate adapters and pick one with tiered selection.
//   - Request a device whose limits are large enough for big grids.
//   - Track device loss through the device-lost callback.
//   - Implement `Accelerator`: record one Life dispatch, submit it, block
//     until the queue drains, and turn any captured wgpu error into a
//     `DeviceExecutionError`.
//   - Provide the blocking map-and-read helper both storage variants use.
//
// ADAPTER SELECTION:
// `request_adapter` uses power-preference heuristics that can return a
// software rasterizer on machines that also have real hardware. We
// enumerate explicitly and prefer anything that is not `DeviceType::Cpu`,
// falling back to the software adapter only when nothing else exists. The
// chosen adapter is logged at info level so it is always clear what ran.
//
// BACKENDS:
// `WGPU_BACKEND` (e.g. `vulkan`, `metal`, `dx12`) overrides the default of
// all primary backends.
//
// ERROR SCOPES:
// wgpu reports validation and out-of-memory errors asynchronously through
// the device's error handler, which by default panics. Wrapping each
// submission in `push_error_scope` / `pop_error_scope` captures those
// errors instead, so a failing dispatch becomes a value the stepper can
// refuse to swap on. Readback copies get the same treatment and surface
// as `GolError::Readback`.
//
// NEW RUST CONCEPTS:
// - `pollster::block_on` — runs an async fn to completion on the current
//   thread. Adapter/device requests and `pop_error_scope` are async in
//   wgpu's API because on WebGPU they map to JS Promises.
// - `Arc<AtomicBool>` — the device-lost callback runs on whatever thread
//   wgpu chooses and must be `Send + 'static`, so it shares the flag by
//   reference count rather than borrowing from `GpuDevice`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{DeviceExecutionError, GolError, GolResult};
use crate::gpu::kernel::{LifeKernel, LifeParams};
use crate::sim::{Accelerator, DispatchGeometry, StepWork};

/// Cached adapter information for logging.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

/// The GPU context: device, queue, and run-time health.
///
/// Hold one `GpuDevice` for the lifetime of a run. Storages borrow it to
/// allocate their resources and every step goes through it.
///
/// # Field drop order
/// Fields drop top to bottom. `_instance` is last so the `wgpu::Instance`
/// outlives `device` and `queue`; some Vulkan layers crash when the
/// instance is destroyed while device objects still reference it.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    lost: Arc<AtomicBool>,
    submissions: AtomicU64,
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Create a `GpuDevice` on the best available adapter.
    ///
    /// # Errors
    /// `GolError::NoAdapter` if wgpu sees no adapter at all, or
    /// `GolError::DeviceRequest` if the device request is refused.
    pub fn new() -> GolResult<Self> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> GolResult<Self> {
        let backends = wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::PRIMARY);
        let flags = if cfg!(debug_assertions) {
            wgpu::InstanceFlags::VALIDATION
        } else {
            wgpu::InstanceFlags::empty()
        };
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            flags,
            ..Default::default()
        });

        let adapters = instance.enumerate_adapters(backends);
        for a in &adapters {
            let info = a.get_info();
            debug!(name = %info.name, backend = ?info.backend, kind = ?info.device_type, "adapter found");
        }

        // Tiered: real or virtual hardware first, then anything.
        let (hardware, software): (Vec<_>, Vec<_>) = adapters
            .into_iter()
            .partition(|a| a.get_info().device_type != wgpu::DeviceType::Cpu);
        let adapter = match hardware.into_iter().next() {
            Some(a) => a,
            None => {
                let a = software.into_iter().next().ok_or(GolError::NoAdapter)?;
                warn!(adapter = %a.get_info().name, "no hardware adapter; using software renderer");
                a
            }
        };

        let raw = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw.name.clone(),
            device_type: raw.device_type,
            backend: raw.backend,
        };

        // Default limits, raised to what the adapter offers for the two
        // that bound the grid size.
        let supported = adapter.limits();
        let limits = wgpu::Limits {
            max_texture_dimension_2d: supported.max_texture_dimension_2d,
            max_storage_buffer_binding_size: supported.max_storage_buffer_binding_size,
            max_buffer_size: supported.max_buffer_size,
            ..wgpu::Limits::default()
        };

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("conway-gpu"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            flag.store(true, Ordering::SeqCst);
            error!(?reason, %message, "GPU device lost");
        });

        info!(
            adapter = %adapter_info,
            max_texture_2d = device.limits().max_texture_dimension_2d,
            max_storage_binding = device.limits().max_storage_buffer_binding_size,
            "GPU device ready"
        );

        Ok(GpuDevice {
            device,
            queue,
            adapter_info,
            lost,
            submissions: AtomicU64::new(0),
            _instance: instance,
        })
    }

    /// Whether the device-lost callback has fired.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Step submissions made so far, failed ones included.
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Record commands with `record`, submit them, block until `staging`
    /// is mapped, and hand its bytes to `extract`.
    ///
    /// `staging` must be `MAP_READ | COPY_DST` and is unmapped again before
    /// returning, so it can be reused for the next readback.
    pub(crate) fn read_back<R>(
        &self,
        staging: &wgpu::Buffer,
        record: impl FnOnce(&mut wgpu::CommandEncoder),
        extract: impl FnOnce(&[u8]) -> R,
    ) -> GolResult<R> {
        if self.is_lost() {
            return Err(GolError::Readback("device lost".into()));
        }
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("readback") });
        record(&mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));

        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        if let Some(e) = validation.or(oom) {
            return Err(GolError::Readback(e.to_string()));
        }

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| GolError::Readback("map callback never fired".into()))?
            .map_err(|e| GolError::Readback(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let out = extract(&mapped);
        drop(mapped);
        staging.unmap();
        Ok(out)
    }

    fn execution_error(&self, submission: u64, message: impl Into<String>) -> GolError {
        DeviceExecutionError::new(submission, message).into()
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuDevice {{ adapter: {} }}", self.adapter_info)
    }
}

// ---------------------------------------------------------------------------
// Step work
// ---------------------------------------------------------------------------

/// One generation's dispatch, borrowed from the storage that recorded it.
#[derive(Default)]
pub struct GpuStepWork<'a> {
    kernel: Option<&'a LifeKernel>,
    bind_group: Option<&'a wgpu::BindGroup>,
    dimensions: Option<(u32, u32)>,
    geometry: Option<DispatchGeometry>,
}

impl<'a> GpuStepWork<'a> {
    /// Use `kernel` with `bind_group` (current at binding 0, next at
    /// binding 1, params at binding 2).
    pub fn bind(&mut self, kernel: &'a LifeKernel, bind_group: &'a wgpu::BindGroup) {
        self.kernel = Some(kernel);
        self.bind_group = Some(bind_group);
    }
}

impl StepWork for GpuStepWork<'_> {
    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.dimensions = Some((width, height));
    }

    fn dispatch(&mut self, geometry: DispatchGeometry) {
        self.geometry = Some(geometry);
    }
}

impl Accelerator for GpuDevice {
    type Work<'a> = GpuStepWork<'a>;

    fn begin_step(&self) -> GpuStepWork<'_> {
        GpuStepWork::default()
    }

    fn submit_and_wait(&self, work: GpuStepWork<'_>) -> GolResult<()> {
        let (Some(kernel), Some(bind_group)) = (work.kernel, work.bind_group) else {
            return Err(GolError::IncompleteStep("storage bindings"));
        };
        let Some((width, height)) = work.dimensions else {
            return Err(GolError::IncompleteStep("grid dimensions"));
        };
        let Some(geometry) = work.geometry else {
            return Err(GolError::IncompleteStep("a dispatch"));
        };

        let submission = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.is_lost() {
            return Err(self.execution_error(submission, "device lost"));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.queue.write_buffer(&kernel.params, 0, bytemuck::bytes_of(&LifeParams::new(width, height)));
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("life step") });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(kernel.entry_point()),
                timestamp_writes: None,
            });
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(geometry.tiles_x, geometry.tiles_y, 1);
        }
        let index = self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::wait_for(index));

        // Scopes pop in reverse push order.
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        if let Some(e) = validation.or(oom) {
            return Err(self.execution_error(submission, e.to_string()));
        }
        if self.is_lost() {
            return Err(self.execution_error(submission, "device lost during dispatch"));
        }
        Ok(())
    }
}
