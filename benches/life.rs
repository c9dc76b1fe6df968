// benches/life.rs — Storage layout comparison: linear buffer vs 2D image.
//
// 512×512 grid, density 0.2, seed 1337, 100 generations per iteration.
//
//   cargo bench --bench life
//
// Host layouts always run. GPU layouts run when an adapter is available and
// are skipped with a warning otherwise.
//
// Two measurements per layout:
//   step_only  — 100 stepper calls, no readback. Pure dispatch + wait.
//   run_100    — the full driver loop, including one snapshot per generation
//                (what a frame-capturing run pays).

use criterion::{criterion_group, criterion_main, Criterion};
use std::time::Duration;

use conway_gpu::gpu::{GpuBufferStorage, GpuDevice, GpuTextureStorage};
use conway_gpu::grid::Grid;
use conway_gpu::host::{HostBufferStorage, HostDevice, HostImageStorage};
use conway_gpu::sim::{CellStorage, Simulation, Stepper};

const SIZE: u32 = 512;
const GENERATIONS: u64 = 100;

fn seed() -> Grid {
    Grid::random(SIZE as usize, SIZE as usize, 0.2, 1337)
}

fn bench_layout<S: CellStorage>(c: &mut Criterion, name: &str, accel: &S::Accel, mut storage: S) {
    let seed = seed();
    let mut group = c.benchmark_group(name);
    group.warm_up_time(Duration::from_secs(2));
    group.sample_size(10);

    group.bench_function("step_only", |b| {
        b.iter(|| {
            storage.ingest(accel, &seed).unwrap();
            let mut stepper = Stepper::for_storage(&storage);
            for _ in 0..GENERATIONS {
                stepper.step(accel, &mut storage).unwrap();
            }
        })
    });

    let mut sim = Simulation::new(accel, storage);
    group.bench_function("run_100", |b| {
        b.iter(|| sim.run(&seed, GENERATIONS, |_, _| {}).unwrap())
    });

    group.finish();
}

fn bench_host(c: &mut Criterion) {
    let dev = HostDevice::new();
    bench_layout(c, "host_buffer_512", &dev, HostBufferStorage::new(SIZE, SIZE).unwrap());
    bench_layout(c, "host_image_512", &dev, HostImageStorage::new(SIZE, SIZE).unwrap());
}

fn bench_gpu(c: &mut Criterion) {
    conway_gpu::logging::init_logging();
    let gpu = match GpuDevice::new() {
        Ok(gpu) => gpu,
        Err(e) => {
            eprintln!("[bench] skipping GPU layouts: {e}");
            return;
        }
    };
    bench_layout(c, "gpu_buffer_512", &gpu, GpuBufferStorage::new(&gpu, SIZE, SIZE).unwrap());
    bench_layout(c, "gpu_texture_512", &gpu, GpuTextureStorage::new(&gpu, SIZE, SIZE).unwrap());
}

criterion_group!(benches, bench_host, bench_gpu);
criterion_main!(benches);
