use std::fs::File;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

use clientela_core::{ReferenceData, ReferenceSources};

use crate::errors::GenerationError;
use crate::model::{GenerateOptions, GenerationJob, RunSummary, Termination};
use crate::output::csv::RowWriter;
use crate::signal::{CancelHandle, GenerationEvent, ProgressSender, progress_channel};
use crate::synth::synthesize;

/// Drives a generation run: loads reference data, opens the sink, and
/// streams records until the target is reached, the run is cancelled, or a
/// write fails.
#[derive(Debug, Clone, Default)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

/// A run executing on a background worker thread.
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancelHandle,
    events: Receiver<GenerationEvent>,
    worker: JoinHandle<RunSummary>,
}

impl RunHandle {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Events in production order. Iteration ends once the worker exits.
    pub fn events(&self) -> &Receiver<GenerationEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and return its summary. Undelivered events are
    /// discarded and the receiver is closed first, so the worker never
    /// blocks on a full channel while being joined.
    pub fn join(self) -> Result<RunSummary, GenerationError> {
        let RunHandle { events, worker, .. } = self;
        drop(events);
        worker.join().map_err(|_| GenerationError::WorkerPanicked)
    }
}

struct Sink {
    writer: RowWriter<File>,
    destination: PathBuf,
    produced: u64,
}

#[derive(Default)]
struct Counters {
    produced: u64,
    bytes_written: u64,
    destination: Option<PathBuf>,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Start the run on a dedicated worker thread. Options are validated
    /// before anything is spawned.
    pub fn spawn(
        self,
        sources: ReferenceSources,
        job: GenerationJob,
    ) -> Result<RunHandle, GenerationError> {
        self.options.validate()?;

        let cancel = CancelHandle::new();
        let (progress, events) = progress_channel(self.options.channel_capacity);
        let worker_cancel = cancel.clone();
        let worker = thread::Builder::new()
            .name("clientela-generate".to_string())
            .spawn(move || self.run(&sources, &job, &worker_cancel, &progress))
            .map_err(GenerationError::Spawn)?;

        Ok(RunHandle {
            cancel,
            events,
            worker,
        })
    }

    /// Execute a run on the current thread. Failures end up in the summary,
    /// which is also sent as the final [`GenerationEvent::Finished`].
    pub fn run(
        &self,
        sources: &ReferenceSources,
        job: &GenerationJob,
        cancel: &CancelHandle,
        progress: &ProgressSender,
    ) -> RunSummary {
        let start = Instant::now();
        let started_at = chrono::Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let seed = self.options.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        info!(
            run_id = %run_id,
            target = %job.target,
            domain = %job.domain,
            destination = %job.destination.display(),
            seed,
            "generation started"
        );
        progress.send(GenerationEvent::Started {
            run_id: run_id.clone(),
            target: job.target.limit(),
            destination: job.destination.clone(),
            seed,
        });

        let mut counters = Counters::default();
        let outcome = self
            .validate_then_execute(sources, job, cancel, progress, &mut rng, &mut counters);

        let (termination, failure) = match outcome {
            Ok(termination) => (termination, None),
            Err(err) => (Termination::Failed, Some(err)),
        };
        let summary = RunSummary {
            run_id: run_id.clone(),
            started_at,
            final_count: counters.produced,
            termination,
            destination: counters.destination,
            seed,
            bytes_written: counters.bytes_written,
            duration_ms: whole_millis(start.elapsed()),
            failure: failure.as_ref().map(GenerationError::kind),
            error: failure.as_ref().map(ToString::to_string),
        };

        match (&summary.termination, &failure) {
            (_, Some(err)) => error!(
                run_id = %run_id,
                produced = summary.final_count,
                error = %err,
                "generation failed"
            ),
            (Termination::Cancelled, None) => warn!(
                run_id = %run_id,
                produced = summary.final_count,
                duration_ms = summary.duration_ms,
                "generation cancelled"
            ),
            _ => info!(
                run_id = %run_id,
                produced = summary.final_count,
                bytes_written = summary.bytes_written,
                duration_ms = summary.duration_ms,
                "generation completed"
            ),
        }

        progress.send(GenerationEvent::Finished(summary.clone()));
        summary
    }

    fn validate_then_execute(
        &self,
        sources: &ReferenceSources,
        job: &GenerationJob,
        cancel: &CancelHandle,
        progress: &ProgressSender,
        rng: &mut ChaCha8Rng,
        counters: &mut Counters,
    ) -> Result<Termination, GenerationError> {
        self.options.validate()?;

        // Reference data first: a bad input must not leave an output file.
        let reference = ReferenceData::load(sources)?;
        let mut sink = open_sink(job)?;
        counters.destination = Some(sink.destination.clone());

        let streamed = self.stream(&reference, job, cancel, progress, rng, &mut sink);
        let flushed = sink.writer.flush().map_err(GenerationError::WriteFailure);
        counters.produced = sink.produced;
        counters.bytes_written = sink.writer.bytes_written();

        let termination = streamed?;
        flushed?;
        Ok(termination)
    }

    fn stream(
        &self,
        reference: &ReferenceData,
        job: &GenerationJob,
        cancel: &CancelHandle,
        progress: &ProgressSender,
        rng: &mut ChaCha8Rng,
        sink: &mut Sink,
    ) -> Result<Termination, GenerationError> {
        sink.writer.write_header()?;
        let target = job.target.limit();

        loop {
            if cancel.is_cancelled() {
                return Ok(Termination::Cancelled);
            }

            let record = synthesize(reference, &job.domain, rng);
            debug_assert!(record.check().is_ok(), "invalid record: {record:?}");
            sink.writer.write_record(&record)?;
            sink.produced += 1;
            let produced = sink.produced;

            if produced % self.options.progress_every == 0 {
                info!(produced, "generation progress");
                progress.send(GenerationEvent::Progress { produced });
            }

            if let Some(target) = target {
                progress.hint(GenerationEvent::Tick { produced, target });
                if produced >= target {
                    return Ok(Termination::Completed);
                }
            }
        }
    }
}

fn open_sink(job: &GenerationJob) -> Result<Sink, GenerationError> {
    let file = File::create(&job.destination).map_err(|source| GenerationError::SinkUnavailable {
        path: job.destination.clone(),
        source,
    })?;
    let destination =
        std::path::absolute(&job.destination).unwrap_or_else(|_| job.destination.clone());
    Ok(Sink {
        writer: RowWriter::new(file),
        destination,
        produced: 0,
    })
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
