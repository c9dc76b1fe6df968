// gpu/mod.rs — wgpu backend.
//
// The CPU rule in `crate::life` stays the authoritative reference; every
// GPU storage is validated against it cell for cell.
//
//   GpuDevice ─── Accelerator ────┬── GpuBufferStorage  (storage buffers)
//                                 └── GpuTextureStorage (R32Uint textures)
//
// Each storage compiles its own `LifeKernel` for its layout and owns the
// bind groups that reference it, so a step borrows everything it needs
// from the storage and nothing is created per generation.

pub mod buffer;
pub mod device;
pub mod kernel;
pub mod texture;

pub use buffer::GpuBufferStorage;
pub use device::{AdapterInfo, GpuDevice, GpuStepWork};
pub use kernel::{KernelLayout, LifeKernel, LifeParams};
pub use texture::GpuTextureStorage;

// ---- GPU test isolation -----------------------------------------------------
//
// Some Vulkan layers (dzn on WSL2 in particular) crash during process exit
// once a device has been created, after every assertion has passed. GPU
// tests therefore run in a child `cargo test` process: the inner test
// prints "GPU_TEST_OK" as its last line and the outer test only checks the
// output, never the child's exit status.

/// Run one `#[ignore]`d inner test in a child process and return its
/// combined stdout and stderr.
#[cfg(test)]
pub(crate) fn run_gpu_test_in_subprocess(test_name: &str) -> String {
    let output = std::process::Command::new("cargo")
        .args(["test", "--lib", "--", test_name, "--exact", "--ignored", "--nocapture"])
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn subprocess for {test_name}: {e}"));

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    print!("{stdout}");
    eprint!("{stderr}");
    stdout + &stderr
}
