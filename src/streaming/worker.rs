//! Background mesh generation with priority-ordered concurrency
//!
//! Jobs are handed to a dedicated tokio runtime over a channel. The worker
//! loop keeps at most `max_concurrent` generations running on the blocking
//! pool, always starting the highest priority pending job next, and sends
//! finished buffers back over a second channel. Results arrive in
//! completion order, not submission order.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::generation::{GeneratedChunk, GenerationJob};
use crate::voxel::ChunkCoord;

/// Outcome of one background generation
#[derive(Debug)]
pub enum GenerationResult {
    /// Buffers ready to commit
    Completed(GeneratedChunk),
    /// Generation aborted; the slot should go idle untouched
    Failed {
        slot: u64,
        epoch: u64,
        coord: ChunkCoord,
        error: String,
    },
}

impl GenerationResult {
    pub fn slot(&self) -> u64 {
        match self {
            GenerationResult::Completed(chunk) => chunk.slot,
            GenerationResult::Failed { slot, .. } => *slot,
        }
    }

    pub fn epoch(&self) -> u64 {
        match self {
            GenerationResult::Completed(chunk) => chunk.epoch,
            GenerationResult::Failed { epoch, .. } => *epoch,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        match self {
            GenerationResult::Completed(chunk) => chunk.coord,
            GenerationResult::Failed { coord, .. } => *coord,
        }
    }
}

/// Run a job, turning errors and panics into a failed result
pub fn run_job(job: GenerationJob) -> GenerationResult {
    match catch_unwind(AssertUnwindSafe(|| job.run())) {
        Ok(Ok(chunk)) => GenerationResult::Completed(chunk),
        Ok(Err(e)) => GenerationResult::Failed {
            slot: job.slot,
            epoch: job.epoch,
            coord: job.coord,
            error: e.to_string(),
        },
        Err(_) => GenerationResult::Failed {
            slot: job.slot,
            epoch: job.epoch,
            coord: job.coord,
            error: "generation panicked".to_string(),
        },
    }
}

/// Concurrent mesh generator running on its own runtime
pub struct MeshWorker {
    /// Channel for sending jobs to the worker loop
    job_tx: mpsc::UnboundedSender<GenerationJob>,
    /// Channel for receiving finished generations
    result_rx: mpsc::UnboundedReceiver<GenerationResult>,
    /// Jobs submitted and not yet polled back
    in_flight: usize,
    runtime: Option<Runtime>,
}

impl MeshWorker {
    /// Create a worker running up to `max_concurrent` generations at once
    pub fn new(max_concurrent: usize) -> Result<Self> {
        let max_concurrent = max_concurrent.max(1);
        let (job_tx, job_rx) = mpsc::unbounded_channel::<GenerationJob>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<GenerationResult>();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(max_concurrent)
            .thread_name("cavern-mesh")
            .build()?;

        runtime.spawn(Self::worker_loop(max_concurrent, job_rx, result_tx));
        log::info!("Mesh worker started with {} concurrent generations", max_concurrent);

        Ok(Self {
            job_tx,
            result_rx,
            in_flight: 0,
            runtime: Some(runtime),
        })
    }

    /// Worker loop that schedules jobs with concurrency control
    async fn worker_loop(
        max_concurrent: usize,
        mut job_rx: mpsc::UnboundedReceiver<GenerationJob>,
        result_tx: mpsc::UnboundedSender<GenerationResult>,
    ) {
        let mut active: JoinSet<GenerationResult> = JoinSet::new();
        let mut pending: Vec<GenerationJob> = Vec::new();
        let mut closed = false;

        loop {
            tokio::select! {
                job = job_rx.recv(), if !closed => {
                    match job {
                        Some(job) => pending.push(job),
                        None => closed = true,
                    }
                }

                Some(joined) = active.join_next(), if !active.is_empty() => {
                    match joined {
                        Ok(result) => {
                            let _ = result_tx.send(result);
                        }
                        Err(e) => log::error!("Mesh task failed to join: {}", e),
                    }
                }

                else => break,
            }

            if closed && pending.is_empty() && active.is_empty() {
                break;
            }

            while active.len() < max_concurrent && !pending.is_empty() {
                let best = pending
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.priority.total_cmp(&b.1.priority).then(b.0.cmp(&a.0)))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                let job = pending.remove(best);
                active.spawn_blocking(move || run_job(job));
            }
        }
    }

    /// Queue a job for background generation
    pub fn submit(&mut self, job: GenerationJob) -> Result<()> {
        self.job_tx
            .send(job)
            .map_err(|_| Error::Streaming("mesh worker stopped".to_string()))?;
        self.in_flight += 1;
        Ok(())
    }

    /// Poll for finished generations (non-blocking)
    pub fn poll_results(&mut self) -> Vec<GenerationResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            results.push(result);
        }
        results
    }

    /// Jobs submitted whose results have not been polled yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for MeshWorker {
    fn drop(&mut self) {
        // Running generations finish on their own threads; results are dropped
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::MeshingConfig;
    use crate::terrain::DensityParams;
    use crate::voxel::ChunkExtent;
    use std::time::{Duration, Instant};

    fn job(x: i32, chunk_size: u32, priority: f32) -> GenerationJob {
        let extent = ChunkExtent::new(1.0, chunk_size);
        let coord = ChunkCoord::new(x, 0, 0);
        GenerationJob {
            slot: x as u64,
            epoch: 1,
            coord,
            priority,
            origin: coord.world_origin(extent.world_size()),
            extent,
            density: DensityParams::default(),
            edits: Vec::new(),
            meshing: MeshingConfig::default(),
            average_normals: false,
        }
    }

    fn collect(worker: &mut MeshWorker, expected: usize) -> Vec<GenerationResult> {
        let deadline = Instant::now() + Duration::from_secs(30);
        let mut results = Vec::new();
        while results.len() < expected && Instant::now() < deadline {
            results.extend(worker.poll_results());
            std::thread::sleep(Duration::from_millis(5));
        }
        results
    }

    #[test]
    fn test_run_job_reports_invalid_extent() {
        match run_job(job(0, 0, 1.0)) {
            GenerationResult::Failed { coord, error, .. } => {
                assert_eq!(coord, ChunkCoord::new(0, 0, 0));
                assert!(error.contains("chunk size"));
            }
            other => panic!("unexpected {:?}", other.coord()),
        }
    }

    #[test]
    fn test_worker_completes_all_jobs() {
        let mut worker = MeshWorker::new(2).unwrap();
        for x in 0..4 {
            worker.submit(job(x, 8, x as f32)).unwrap();
        }
        assert_eq!(worker.in_flight(), 4);

        let results = collect(&mut worker, 4);
        assert_eq!(results.len(), 4);
        assert_eq!(worker.in_flight(), 0);

        let mut coords: Vec<i32> = results.iter().map(|r| r.coord().x).collect();
        coords.sort();
        assert_eq!(coords, vec![0, 1, 2, 3]);
        assert!(results.iter().all(|r| matches!(r, GenerationResult::Completed(_))));
    }

    #[test]
    fn test_worker_reports_failures() {
        let mut worker = MeshWorker::new(1).unwrap();
        worker.submit(job(3, 200, 1.0)).unwrap();
        let results = collect(&mut worker, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].slot(), 3);
        assert_eq!(results[0].epoch(), 1);
        assert!(matches!(results[0], GenerationResult::Failed { .. }));
    }
}
