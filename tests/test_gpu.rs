// tests/test_gpu.rs — The same properties on real wgpu storage.
//
// Needs an adapter, so everything is ignored by default:
//   cargo test --test test_gpu -- --include-ignored

use conway_gpu::config::BackendKind;
use conway_gpu::grid::Grid;
use conway_gpu::life;
use conway_gpu::patterns;
use conway_gpu::run::simulate_from;

fn run(backend: BackendKind, seed: &Grid, generations: u64) -> Grid {
    simulate_from(backend, seed, generations, |_, _| {}).unwrap().grid
}

#[test]
#[ignore = "requires a real GPU"]
fn gpu_identity() {
    let seed = Grid::random(40, 23, 0.2, 1337);
    assert_eq!(run(BackendKind::GpuBuffer, &seed, 0), seed);
    assert_eq!(run(BackendKind::GpuTexture, &seed, 0), seed);
}

#[test]
#[ignore = "requires a real GPU"]
fn gpu_layouts_agree_with_host() {
    let seed = Grid::random(512, 512, 0.2, 1337);
    let buffer = run(BackendKind::GpuBuffer, &seed, 100);
    let texture = run(BackendKind::GpuTexture, &seed, 100);
    assert_eq!(buffer, texture);
    assert_eq!(buffer, run(BackendKind::HostBuffer, &seed, 100));
    assert_eq!(buffer, life::run(&seed, 100));
}

#[test]
#[ignore = "requires a real GPU"]
fn gpu_odd_sizes_bounds_checked() {
    for (w, h) in [(17, 5), (100, 33), (1, 1)] {
        let seed = Grid::random(w, h, 0.4, 3);
        let expected = life::run(&seed, 5);
        assert_eq!(run(BackendKind::GpuBuffer, &seed, 5), expected, "{w}×{h}");
        assert_eq!(run(BackendKind::GpuTexture, &seed, 5), expected, "{w}×{h}");
    }
}

#[test]
#[ignore = "requires a real GPU"]
fn gpu_glider_and_block() {
    let glider = Grid::with_live_cells(8, 8, &[(2, 1), (3, 2), (1, 3), (2, 3), (3, 3)]);
    let block = patterns::BLOCK.seed(8, 8, (3, 3));
    for backend in [BackendKind::GpuBuffer, BackendKind::GpuTexture] {
        assert_eq!(run(backend, &glider, 4), life::translate(&glider, 1, 1), "{backend}");
        assert_eq!(run(backend, &block, 9), block, "{backend}");
    }
}
