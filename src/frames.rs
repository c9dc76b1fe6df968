// frames.rs — CSV frame capture.
//
// One file per generation, `frame_NNNN.csv`, one line per grid row with
// comma-separated 0/1 cells:
//
//   0,1,0
//   0,1,0
//   0,1,0
//
// `FrameRecorder` moves the file I/O off the simulation thread. Snapshots
// go through a bounded channel to a single writer thread. When the queue
// is full `record` blocks, so a slow disk throttles the simulation instead
// of growing memory without bound. Write failures are logged by the writer
// and never reach the simulation.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::grid::Grid;

/// Default queue depth for the recorder (bounded channel capacity).
pub const DEFAULT_QUEUE_DEPTH: usize = 8;

/// Write `grid` to `path` as CSV.
pub fn write_csv(grid: &Grid, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for y in 0..grid.height() {
        let row = grid.row(y);
        for (x, cell) in row.iter().enumerate() {
            if x > 0 {
                out.write_all(b",")?;
            }
            out.write_all(if *cell == 0 { b"0" } else { b"1" })?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// `dir/frame_NNNN.csv`, zero-padded to four digits.
pub fn frame_path(dir: &Path, generation: u64) -> PathBuf {
    dir.join(format!("frame_{generation:04}.csv"))
}

// ============================================================================
// Recorder
// ============================================================================

struct FrameJob {
    generation: u64,
    grid: Grid,
}

/// Writes frames on a background thread.
pub struct FrameRecorder {
    dir: PathBuf,
    tx: Option<SyncSender<FrameJob>>,
    handle: Option<JoinHandle<usize>>,
}

impl FrameRecorder {
    /// Create `dir` if needed and start the writer thread.
    pub fn new(dir: impl Into<PathBuf>, queue_depth: usize) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let (tx, rx) = sync_channel(queue_depth.max(1));
        let handle = spawn_writer_thread(dir.clone(), rx)?;
        info!(dir = %dir.display(), queue_depth, "frame recorder started");
        Ok(FrameRecorder { dir, tx: Some(tx), handle: Some(handle) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Queue a copy of `grid` as frame `generation`. Blocks while the queue
    /// is full.
    pub fn record(&self, grid: &Grid, generation: u64) {
        let Some(tx) = &self.tx else { return };
        if tx.send(FrameJob { generation, grid: grid.clone() }).is_err() {
            warn!(generation, "frame writer has stopped; frame dropped");
        }
    }

    /// Flush the queue, stop the writer, and return how many frames were
    /// written successfully.
    pub fn finish(mut self) -> usize {
        self.shutdown()
    }

    fn shutdown(&mut self) -> usize {
        self.tx.take();
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(written)) => {
                debug!(written, "frame writer joined");
                written
            }
            Some(Err(e)) => {
                error!("frame writer thread panicked: {:?}", e);
                0
            }
            None => 0,
        }
    }
}

impl Drop for FrameRecorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_writer_thread(dir: PathBuf, rx: Receiver<FrameJob>) -> io::Result<JoinHandle<usize>> {
    thread::Builder::new().name("frame-writer".to_string()).spawn(move || {
        let mut written = 0;
        while let Ok(job) = rx.recv() {
            let path = frame_path(&dir, job.generation);
            match write_csv(&job.grid, &path) {
                Ok(()) => written += 1,
                Err(e) => error!(path = %path.display(), error = %e, "failed to write frame"),
            }
        }
        written
    })
}
