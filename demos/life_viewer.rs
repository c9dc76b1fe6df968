// demos/life_viewer.rs — Live Game of Life window.
//
// Drives the stepper one generation per frame on the chosen backend and
// draws the current grid, one square block per cell.
//
// USAGE
// ─────
//   cargo run --release --example life_viewer                     # gpu-buffer, 256×256
//   cargo run --release --example life_viewer -- gpu-texture 320 200
//   cargo run --release --example life_viewer -- host-image
//
// If no GPU adapter is available the viewer falls back to the matching
// host layout.
//
// KEYS
// ────
//   Space  pause / resume       S  single step while paused
//   R      reseed               Esc / Q  quit

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use conway_gpu::config::BackendKind;
use conway_gpu::gpu::{GpuBufferStorage, GpuDevice, GpuTextureStorage};
use conway_gpu::grid::{Grid, DEFAULT_DENSITY};
use conway_gpu::host::{HostBufferStorage, HostDevice, HostImageStorage};
use conway_gpu::sim::{CellStorage, Stepper};

const ALIVE_RGB: u32 = 0x00E0_E0E0;
const DEAD_RGB: u32 = 0x0010_1418;

fn main() {
    conway_gpu::logging::init_logging();

    let args: Vec<String> = std::env::args().collect();
    let backend: BackendKind = args
        .get(1)
        .map(|s| s.parse().expect("unknown backend"))
        .unwrap_or(BackendKind::GpuBuffer);
    let width: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(256);
    let height: u32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(256);

    let gpu = if backend.is_gpu() {
        match GpuDevice::new() {
            Ok(gpu) => {
                eprintln!("[life_viewer] GPU: {}", gpu.adapter_info);
                Some(gpu)
            }
            Err(e) => {
                eprintln!("[life_viewer] {e}; falling back to the host device");
                None
            }
        }
    } else {
        None
    };

    let host = HostDevice::new();
    match (backend, &gpu) {
        (BackendKind::GpuBuffer, Some(gpu)) => {
            animate(gpu, GpuBufferStorage::new(gpu, width, height).unwrap(), backend)
        }
        (BackendKind::GpuTexture, Some(gpu)) => {
            animate(gpu, GpuTextureStorage::new(gpu, width, height).unwrap(), backend)
        }
        (BackendKind::GpuBuffer | BackendKind::HostBuffer, _) => {
            animate(&host, HostBufferStorage::new(width, height).unwrap(), BackendKind::HostBuffer)
        }
        (BackendKind::GpuTexture | BackendKind::HostImage, _) => {
            animate(&host, HostImageStorage::new(width, height).unwrap(), BackendKind::HostImage)
        }
    }
}

fn animate<S: CellStorage>(accel: &S::Accel, mut storage: S, backend: BackendKind) {
    let (width, height) = storage.dimensions();
    let (w, h) = (width as usize, height as usize);
    let scale = (768 / w.max(h)).clamp(1, 8);
    let (win_w, win_h) = (w * scale, h * scale);

    let mut window = Window::new(
        &format!("conway-gpu — {backend} {width}×{height}"),
        win_w,
        win_h,
        WindowOptions { resize: false, ..WindowOptions::default() },
    )
    .expect("failed to create window");
    window.set_target_fps(30);

    let mut reseeds = 0u64;
    let mut reseed = |storage: &mut S| {
        reseeds += 1;
        storage.ingest(accel, &Grid::random(w, h, DEFAULT_DENSITY, 1336 + reseeds)).unwrap();
        Stepper::for_storage(storage)
    };

    let mut stepper = reseed(&mut storage);
    let mut paused = false;
    let mut fb = vec![DEAD_RGB; win_w * win_h];

    while window.is_open() && !window.is_key_down(Key::Escape) && !window.is_key_down(Key::Q) {
        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            paused = !paused;
        }
        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            stepper = reseed(&mut storage);
        }
        let single = window.is_key_pressed(Key::S, KeyRepeat::No);

        if !paused || single {
            if let Err(e) = stepper.step(accel, &mut storage) {
                eprintln!("[life_viewer] {e}");
                break;
            }
        }

        let grid = storage.read_current(accel).expect("readback failed");
        draw(&grid, scale, &mut fb, win_w);
        window.set_title(&format!(
            "conway-gpu — {backend} {width}×{height} — gen {} — pop {}{}",
            stepper.generation(),
            grid.population(),
            if paused { " (paused)" } else { "" }
        ));
        window.update_with_buffer(&fb, win_w, win_h).unwrap();
    }
}

fn draw(grid: &Grid, scale: usize, fb: &mut [u32], stride: usize) {
    for y in 0..grid.height() {
        for (x, &cell) in grid.row(y).iter().enumerate() {
            let color = if cell != 0 { ALIVE_RGB } else { DEAD_RGB };
            for dy in 0..scale {
                let start = (y * scale + dy) * stride + x * scale;
                fb[start..start + scale].fill(color);
            }
        }
    }
}
