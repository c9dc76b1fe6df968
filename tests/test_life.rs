// tests/test_life.rs — End-to-end properties on the host-simulated device.
//
// Every test drives the real Stepper/Driver through the `CellStorage`
// contract; only the storage type changes between the two layouts.

use conway_gpu::grid::{Cell, Grid};
use conway_gpu::host::{FaultPlan, HostBufferStorage, HostDevice, HostImageStorage, GARBAGE};
use conway_gpu::life;
use conway_gpu::patterns;
use conway_gpu::sim::{CellStorage, DispatchGeometry, Simulation, Stepper};
use conway_gpu::GolError;

fn run_buffer(seed: &Grid, generations: u64) -> Grid {
    let dev = HostDevice::new();
    let storage = HostBufferStorage::new(seed.width() as u32, seed.height() as u32).unwrap();
    Simulation::new(&dev, storage).run(seed, generations, |_, _| {}).unwrap().grid
}

fn run_image(seed: &Grid, generations: u64) -> Grid {
    let dev = HostDevice::new();
    let storage = HostImageStorage::new(seed.width() as u32, seed.height() as u32).unwrap();
    Simulation::new(&dev, storage).run(seed, generations, |_, _| {}).unwrap().grid
}

// ===== Identity =====

#[test]
fn zero_generations_returns_seed() {
    for seed_value in [0, 1, 1337, 0xDEAD] {
        let seed = Grid::random(45, 29, 0.2, seed_value);
        assert_eq!(run_buffer(&seed, 0), seed);
        assert_eq!(run_image(&seed, 0), seed);
    }
}

// ===== Cross-layout equivalence =====

#[test]
fn buffer_and_image_agree_after_one_step() {
    for (w, h, s) in [(16, 16, 1), (17, 33, 2), (100, 7, 3), (1, 1, 4), (64, 65, 5)] {
        let seed = Grid::random(w, h, 0.35, s);
        let a = run_buffer(&seed, 1);
        let b = run_image(&seed, 1);
        assert_eq!(a, b, "{w}×{h}");
        assert_eq!(a, life::step(&seed), "{w}×{h}");
    }
}

#[test]
fn buffer_and_image_agree_over_many_generations() {
    let seed = Grid::random(96, 80, 0.2, 1337);
    let a = run_buffer(&seed, 50);
    let b = run_image(&seed, 50);
    assert_eq!(a, b);
    assert_eq!(a, life::run(&seed, 50));
}

// ===== Known patterns =====

#[test]
fn glider_translates_after_one_period() {
    let seed = patterns::GLIDER.seed(20, 20, (5, 5));
    let expected = life::translate(&seed, 1, 1);
    assert_eq!(run_buffer(&seed, 4), expected);
    assert_eq!(run_image(&seed, 4), expected);
}

#[test]
fn glider_8x8_scenario() {
    let live = [(2, 1), (3, 2), (1, 3), (2, 3), (3, 3)];
    let seed = Grid::with_live_cells(8, 8, &live);
    let shifted: Vec<(usize, usize)> = live.iter().map(|&(x, y)| (x + 1, y + 1)).collect();
    let expected = Grid::with_live_cells(8, 8, &shifted);

    for grid in [run_buffer(&seed, 4), run_image(&seed, 4)] {
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(grid.get(x, y), expected.get(x, y), "cell ({x}, {y})");
            }
        }
    }
}

#[test]
fn lone_cell_dies() {
    for (x, y) in [(0, 0), (4, 4), (9, 0), (9, 9)] {
        let seed = Grid::with_live_cells(10, 10, &[(x, y)]);
        assert_eq!(run_buffer(&seed, 1).population(), 0);
        assert_eq!(run_image(&seed, 1).population(), 0);
    }
}

#[test]
fn block_is_still() {
    let seed = patterns::BLOCK.seed(12, 12, (4, 4));
    for g in [1, 2, 7, 30] {
        assert_eq!(run_buffer(&seed, g), seed, "after {g}");
        assert_eq!(run_image(&seed, g), seed, "after {g}");
    }
}

#[test]
fn oscillators_return_after_period() {
    for pattern in [patterns::BLINKER, patterns::TOAD, patterns::BEACON] {
        let seed = pattern.seed(16, 16, (5, 5));
        assert_eq!(run_buffer(&seed, pattern.period as u64), seed, "{}", pattern.name);
        assert_ne!(run_image(&seed, 1), seed, "{} is not still", pattern.name);
    }
}

// ===== Dispatch geometry =====

#[test]
fn dispatch_covers_grid_without_overrun() {
    for (w, h) in [(17u32, 5u32), (31, 47), (50, 16), (16, 50), (1, 100), (129, 3)] {
        let dev = HostDevice::new();
        let mut storage = HostImageStorage::new(w, h).unwrap();
        storage.ingest(&dev, &Grid::random(w as usize, h as usize, 0.5, 8)).unwrap();
        Stepper::new(w, h).step(&dev, &mut storage).unwrap();

        let stats = dev.last_dispatch().unwrap();
        let tiles = w.div_ceil(16) as u64 * h.div_ceil(16) as u64;
        assert_eq!(stats.tiles, tiles, "{w}×{h}");
        assert_eq!(stats.tiles, DispatchGeometry::covering(w, h).tile_count());
        assert_eq!(stats.cells_written, w as u64 * h as u64);
        assert!(stats.max_index.unwrap() < w as u64 * h as u64, "{w}×{h}");
    }
}

// ===== Failure injection =====

#[test]
fn failure_on_generation_k_reports_k_minus_one() {
    let seed = Grid::random(40, 24, 0.3, 77);
    let generations = 6;
    for k in 1..=generations {
        for layout in ["buffer", "image"] {
            let dev = HostDevice::with_fault(FaultPlan::at_submission(k));
            let (w, h) = (40, 24);
            let mut observed = Vec::new();
            let result = match layout {
                "buffer" => Simulation::new(&dev, HostBufferStorage::new(w, h).unwrap())
                    .run(&seed, generations, |_, g| observed.push(g)),
                _ => Simulation::new(&dev, HostImageStorage::new(w, h).unwrap())
                    .run(&seed, generations, |_, g| observed.push(g)),
            };
            let failure = result.unwrap_err();

            assert_eq!(failure.completed, k - 1, "{layout} k={k}");
            assert_eq!(failure.grid, life::run(&seed, k - 1), "{layout} k={k}");
            assert_eq!(observed, (1..k).collect::<Vec<_>>());
            assert!(matches!(failure.source, GolError::DeviceExecution(ref e) if e.submission == k));
            // Readback keeps raw values, so scribbled cells would show here.
            assert!(failure.grid.as_slice().iter().all(|&c| c <= 1));
        }
    }
}

#[test]
fn readback_failure_on_generation_k_reports_k_minus_one() {
    let seed = Grid::random(40, 24, 0.3, 78);
    for k in 1..=5 {
        let dev = HostDevice::with_fault(FaultPlan::at_readback(k));
        let mut sim = Simulation::new(&dev, HostBufferStorage::new(40, 24).unwrap());
        let failure = sim.run(&seed, 5, |_, _| {}).unwrap_err();

        assert_eq!(failure.completed, k - 1, "k={k}");
        assert_eq!(failure.grid, life::run(&seed, k - 1), "k={k}");
        assert!(matches!(failure.source, GolError::Readback(_)));

        // Generation k was computed; only its copy to the host was lost.
        let storage = sim.into_storage();
        assert_eq!(storage.read_current(&dev).unwrap(), life::run(&seed, k));
    }
}

#[test]
fn scribbled_plane_is_visible_if_swapped_in() {
    let seed = Grid::random(16, 8, 0.3, 5);
    let dev = HostDevice::with_fault(FaultPlan::at_submission(1));
    let mut storage = HostBufferStorage::new(16, 8).unwrap();
    storage.ingest(&dev, &seed).unwrap();
    assert!(Stepper::new(16, 8).step(&dev, &mut storage).is_err());

    storage.swap();
    let grid = storage.read_current(&dev).unwrap();
    assert!(grid.as_slice().contains(&GARBAGE));
    assert_ne!(grid, life::step(&seed));
}

#[test]
fn storage_after_failure_still_holds_last_generation() {
    let seed = patterns::R_PENTOMINO.seed(32, 32, (14, 14));
    let dev = HostDevice::with_fault(FaultPlan::at_submission(3));
    let mut sim = Simulation::new(&dev, HostBufferStorage::new(32, 32).unwrap());
    let failure = sim.run(&seed, 10, |_, _| {}).unwrap_err();
    assert_eq!(failure.completed, 2);

    let storage = sim.into_storage();
    assert_eq!(storage.read_current(&dev).unwrap(), life::run(&seed, 2));
}

#[test]
fn hook_snapshots_are_independent_copies() {
    let seed = patterns::GLIDER.seed(10, 10, (0, 0));
    let dev = HostDevice::new();
    let mut sim = Simulation::new(&dev, HostImageStorage::new(10, 10).unwrap());
    let mut kept: Vec<Grid> = Vec::new();
    sim.run(&seed, 4, |g, _| kept.push(g.clone())).unwrap();

    // Each stored snapshot still matches its own generation.
    for (i, grid) in kept.iter().enumerate() {
        assert_eq!(*grid, life::run(&seed, i as u64 + 1));
    }
    assert_eq!(kept[3].get(1, 1), Cell::Dead);
}
