//! Run a seeded Life simulation on one backend.
//!
//! Usage: `conway-gpu [--width W] [--height H] [--generations N] [--backend B]
//! [--seed S] [--density P] [--frames DIR] [--queue N] [--verify] [--compare]`

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};

use conway_gpu::config::{BackendKind, RunConfig};
use conway_gpu::frames::{FrameRecorder, DEFAULT_QUEUE_DEPTH};
use conway_gpu::grid::DEFAULT_DENSITY;
use conway_gpu::run::{seed_grid, simulate, simulate_from};
use conway_gpu::{life, logging, GolError};

#[derive(Parser, Debug)]
#[command(name = "conway-gpu")]
#[command(about = "Evolve a random Game of Life grid on the GPU or a host-simulated device")]
struct Args {
    /// Grid width in cells
    #[arg(long, default_value_t = 512)]
    width: u32,

    /// Grid height in cells
    #[arg(long, default_value_t = 512)]
    height: u32,

    /// Generations to run
    #[arg(long, default_value_t = 100)]
    generations: u64,

    /// gpu-buffer, gpu-texture, host-buffer or host-image
    #[arg(long, default_value = "gpu-buffer")]
    backend: BackendKind,

    /// Seed for the initial grid
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Probability that a cell starts alive
    #[arg(long, default_value_t = DEFAULT_DENSITY)]
    density: f64,

    /// Write every generation (including 0) as CSV into this directory
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Frame writer queue depth
    #[arg(long, default_value_t = DEFAULT_QUEUE_DEPTH)]
    queue: usize,

    /// Check the final grid against the CPU reference
    #[arg(long)]
    verify: bool,

    /// Rerun on the other storage layout and require identical results
    #[arg(long)]
    compare: bool,
}

fn main() {
    logging::init_logging();
    let args = Args::parse();

    let config = RunConfig {
        width: args.width,
        height: args.height,
        generations: args.generations,
        backend: args.backend,
        seed: args.seed,
        density: args.density,
    };
    if let Err(e) = config.validate() {
        error!("{e}");
        process::exit(1);
    }

    let recorder = match args.frames.as_ref().map(|dir| FrameRecorder::new(dir, args.queue)) {
        Some(Ok(r)) => Some(r),
        Some(Err(e)) => {
            error!(error = %e, "cannot create frame directory");
            process::exit(1);
        }
        None => None,
    };
    let seed = seed_grid(&config);
    if let Some(r) = &recorder {
        r.record(&seed, 0);
    }

    let start = Instant::now();
    let result = simulate(&config, |grid, generation| {
        if let Some(r) = &recorder {
            r.record(grid, generation);
        }
    });
    let elapsed = start.elapsed();

    if let Some(r) = recorder {
        let dir = r.dir().to_path_buf();
        let written = r.finish();
        info!(written, dir = %dir.display(), "frames written");
    }

    let report = match result {
        Ok(report) => report,
        Err(GolError::RunAborted(failure)) => {
            error!(
                completed = failure.completed,
                requested = failure.requested,
                width = failure.width,
                height = failure.height,
                "{}",
                failure.source
            );
            println!(
                "aborted after {} of {} generations ({}x{} grid)",
                failure.completed, failure.requested, failure.width, failure.height
            );
            process::exit(2);
        }
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    println!(
        "{}: {} generations of {}x{} in {:.2?} ({:.3} ms/gen), final population {}",
        config.backend,
        report.generations,
        config.width,
        config.height,
        elapsed,
        elapsed.as_secs_f64() * 1e3 / report.generations.max(1) as f64,
        report.grid.population()
    );

    let mut ok = true;

    if args.verify {
        let expected = life::run(&seed, config.generations);
        if expected == report.grid {
            println!("verify: matches CPU reference");
        } else {
            error!("final grid differs from the CPU reference");
            ok = false;
        }
    }

    if args.compare {
        let sibling = config.backend.sibling();
        match simulate_from(sibling, &seed, config.generations, |_, _| {}) {
            Ok(other) if other.grid == report.grid => {
                println!("compare: {} and {} are bit-identical", config.backend, sibling);
            }
            Ok(_) => {
                error!(%sibling, "storage layouts disagree");
                ok = false;
            }
            Err(e) => {
                error!(%sibling, "comparison run failed: {e}");
                ok = false;
            }
        }
    }

    if !ok {
        process::exit(1);
    }
}
