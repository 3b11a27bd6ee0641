use clientela_generate::{
    GenerationEngine, GenerationError, GenerationEvent, RunHandle, RunSummary, Termination,
};

use crate::CliError;
use crate::GenerateArgs;
use crate::config::{FileConfig, resolve_generate};

/// Foreground side of a run: start the worker, forward Ctrl-C as a
/// cancellation request, print events until the summary arrives.
pub async fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = resolve_generate(&args, file)?;

    tracing::info!(
        event = "run_requested",
        target = %settings.job.target,
        domain = %settings.job.domain,
        out = %settings.job.destination.display()
    );

    let engine = GenerationEngine::new(settings.options);
    let handle = engine.spawn(settings.sources, settings.job)?;

    let cancel = handle.cancel_handle();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(event = "cancel_requested");
            cancel.cancel();
        }
    });

    let summary = tokio::task::spawn_blocking(move || drain(handle)).await??;
    signal.abort();

    if let Some(path) = &settings.report {
        summary.write_json(path)?;
        tracing::info!(event = "report_written", path = %path.display());
    }

    match summary.termination {
        Termination::Failed => Err(CliError::RunFailed(summary.message())),
        Termination::Completed | Termination::Cancelled => Ok(()),
    }
}

fn drain(handle: RunHandle) -> Result<RunSummary, GenerationError> {
    let mut display = PercentDisplay::default();
    for event in handle.events() {
        match event {
            GenerationEvent::Tick { produced, target } => {
                if let Some(percent) = display.update(produced, target) {
                    println!("progress: {percent}%");
                }
            }
            other => {
                if let Some(line) = other.message() {
                    println!("{line}");
                }
            }
        }
    }
    handle.join()
}

/// Coalesces per-record ticks into whole-percent steps.
#[derive(Debug, Default)]
struct PercentDisplay {
    last: Option<u64>,
}

impl PercentDisplay {
    fn update(&mut self, produced: u64, target: u64) -> Option<u64> {
        if target == 0 {
            return None;
        }
        let percent = produced.saturating_mul(100) / target;
        if self.last.is_some_and(|last| percent <= last) {
            return None;
        }
        self.last = Some(percent);
        Some(percent)
    }
}
