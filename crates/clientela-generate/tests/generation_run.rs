use std::fs;
use std::path::{Path, PathBuf};

use clientela_core::{Cedula, ReferenceSources};
use clientela_generate::{
    CancelHandle, DomainPolicy, FailureKind, GenerateOptions, GenerationEngine, GenerationEvent,
    GenerationJob, HEADER, RunSummary, TargetCount, Termination, progress_channel,
};

fn temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("clientela_generate_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_reference(dir: &Path, male: &str, female: &str, surnames: &str, locations: &str) {
    let sources = ReferenceSources::in_dir(dir);
    fs::write(&sources.male_names, male).expect("write male names");
    fs::write(&sources.female_names, female).expect("write female names");
    fs::write(&sources.surnames, surnames).expect("write surnames");
    fs::write(&sources.locations, locations).expect("write locations");
}

fn scenario_reference(dir: &Path) -> ReferenceSources {
    write_reference(
        dir,
        "Juan\n",
        "Maria\n",
        "Perez\nLopez\n",
        "provincia,canton,parroquia\nPichincha,Quito,Iñaquito\n",
    );
    ReferenceSources::in_dir(dir)
}

fn job(target: u64, domain: DomainPolicy, destination: PathBuf) -> GenerationJob {
    GenerationJob {
        target: TargetCount::from_count(target),
        domain,
        destination,
    }
}

fn seeded(seed: u64) -> GenerateOptions {
    GenerateOptions {
        seed: Some(seed),
        ..GenerateOptions::default()
    }
}

/// Run on the current thread and collect every authoritative event.
fn run_collecting(
    engine: &GenerationEngine,
    sources: &ReferenceSources,
    job: &GenerationJob,
    cancel: &CancelHandle,
) -> (RunSummary, Vec<GenerationEvent>) {
    let (progress, events) = progress_channel(4096);
    let summary = engine.run(sources, job, cancel, &progress);
    drop(progress);
    let events = events
        .iter()
        .filter(|event| !matches!(event, GenerationEvent::Tick { .. }))
        .collect();
    (summary, events)
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("open output");
    let header = reader
        .headers()
        .expect("header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|row| row.expect("row").iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

#[test]
fn single_record_scenario_matches_reference_data() {
    let dir = temp_dir("scenario");
    let sources = scenario_reference(&dir);
    let out = dir.join("clientes.csv");

    let engine = GenerationEngine::new(seeded(1));
    let (summary, _) = run_collecting(
        &engine,
        &sources,
        &job(1, DomainPolicy::Random, out.clone()),
        &CancelHandle::new(),
    );

    assert_eq!(summary.termination, Termination::Completed);
    assert_eq!(summary.final_count, 1);
    assert!(summary.error.is_none());

    let (header, rows) = read_rows(&out);
    assert_eq!(header, HEADER);
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert!(Cedula::is_valid(&row[0]), "invalid cedula {}", row[0]);
    match row[5].as_str() {
        "Masculino" => {
            assert_eq!(row[1], "Juan");
            assert_eq!(row[2], "Juan");
        }
        "Femenino" => {
            assert_eq!(row[1], "Maria");
            assert_eq!(row[2], "Maria");
        }
        other => panic!("unexpected sex label {other}"),
    }
    for surname in [&row[3], &row[4]] {
        assert!(surname == "Perez" || surname == "Lopez", "{surname}");
    }
    assert_eq!(&row[6..9], ["Pichincha", "Quito", "Iñaquito"]);
    let age: u8 = row[9].parse().expect("age");
    assert!((18..=80).contains(&age));
    assert!(row[10].contains('@'));

    let contents = fs::read_to_string(&out).expect("read output");
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.ends_with('\n'));
    assert_eq!(summary.bytes_written, contents.len() as u64);
}

#[test]
fn fixed_domain_applies_to_every_email() {
    let dir = temp_dir("domain");
    let sources = scenario_reference(&dir);
    let out = dir.join("clientes.csv");

    let engine = GenerationEngine::new(seeded(2));
    let (summary, _) = run_collecting(
        &engine,
        &sources,
        &job(250, DomainPolicy::parse("example.org").expect("domain"), out.clone()),
        &CancelHandle::new(),
    );
    assert_eq!(summary.final_count, 250);

    let (_, rows) = read_rows(&out);
    assert_eq!(rows.len(), 250);
    for row in rows {
        assert!(row[10].ends_with("@example.org"), "{}", row[10]);
        assert!(Cedula::is_valid(&row[0]));
    }
}

#[test]
fn empty_reference_fails_before_creating_output() {
    let dir = temp_dir("empty");
    write_reference(
        &dir,
        "Juan\n",
        "Maria\n",
        "\n\n",
        "provincia,canton,parroquia\nPichincha,Quito,Iñaquito\n",
    );
    let out = dir.join("clientes.csv");

    let engine = GenerationEngine::new(seeded(3));
    let (summary, events) = run_collecting(
        &engine,
        &ReferenceSources::in_dir(&dir),
        &job(10, DomainPolicy::Random, out.clone()),
        &CancelHandle::new(),
    );

    assert_eq!(summary.termination, Termination::Failed);
    assert_eq!(summary.failure, Some(FailureKind::MissingOrEmptySource));
    assert_eq!(summary.final_count, 0);
    assert_eq!(summary.destination, None);
    assert!(summary.error.as_deref().is_some_and(|err| err.contains("surnames")));
    assert!(!out.exists(), "no output file may be created");
    assert!(matches!(events.last(), Some(GenerationEvent::Finished(_))));
}

#[test]
fn unopenable_destination_is_sink_unavailable() {
    let dir = temp_dir("sink");
    let sources = scenario_reference(&dir);
    let out = dir.join("missing").join("clientes.csv");

    let engine = GenerationEngine::new(seeded(4));
    let (summary, _) = run_collecting(
        &engine,
        &sources,
        &job(5, DomainPolicy::Random, out),
        &CancelHandle::new(),
    );

    assert_eq!(summary.termination, Termination::Failed);
    assert_eq!(summary.failure, Some(FailureKind::SinkUnavailable));
    assert_eq!(summary.final_count, 0);
}

#[test]
fn cancellation_before_first_record_writes_only_the_header() {
    let dir = temp_dir("precancel");
    let sources = scenario_reference(&dir);
    let out = dir.join("clientes.csv");

    let cancel = CancelHandle::new();
    cancel.cancel();
    let engine = GenerationEngine::new(seeded(5));
    let (summary, _) = run_collecting(
        &engine,
        &sources,
        &job(0, DomainPolicy::Random, out.clone()),
        &cancel,
    );

    assert_eq!(summary.termination, Termination::Cancelled);
    assert_eq!(summary.final_count, 0);
    let contents = fs::read_to_string(&out).expect("read output");
    assert_eq!(contents, format!("{}\n", HEADER.join(",")));
}

#[test]
fn unbounded_run_stops_within_one_record_of_cancellation() {
    let dir = temp_dir("unbounded");
    let sources = scenario_reference(&dir);
    let out = dir.join("clientes.csv");

    // Rendezvous channel: the worker cannot get ahead of the reader by more
    // than the record it is currently writing.
    let engine = GenerationEngine::new(GenerateOptions {
        progress_every: 1,
        channel_capacity: 0,
        seed: Some(6),
    });
    let handle = engine
        .spawn(sources, job(0, DomainPolicy::Random, out.clone()))
        .expect("spawn worker");

    let mut cancelled_at = None;
    let mut finished = None;
    for event in handle.events() {
        match event {
            GenerationEvent::Progress { produced } if produced == 50 => {
                handle.cancel();
                cancelled_at = Some(produced);
            }
            GenerationEvent::Finished(summary) => finished = Some(summary),
            _ => {}
        }
    }

    let summary = handle.join().expect("join worker");
    assert_eq!(finished.as_ref(), Some(&summary));
    assert_eq!(summary.termination, Termination::Cancelled);

    let cancelled_at = cancelled_at.expect("cancelled after 50 records");
    assert!(
        summary.final_count <= cancelled_at + 1,
        "{} records after cancelling at {cancelled_at}",
        summary.final_count
    );

    let (_, rows) = read_rows(&out);
    assert_eq!(rows.len() as u64, summary.final_count);
}

#[test]
fn events_arrive_in_production_order() {
    let dir = temp_dir("events");
    let sources = scenario_reference(&dir);
    let out = dir.join("clientes.csv");

    let engine = GenerationEngine::new(GenerateOptions {
        progress_every: 10,
        ..seeded(7)
    });
    let (summary, events) = run_collecting(
        &engine,
        &sources,
        &job(35, DomainPolicy::Random, out),
        &CancelHandle::new(),
    );

    assert!(matches!(
        events.first(),
        Some(GenerationEvent::Started { target: Some(35), seed: 7, .. })
    ));
    let progress: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            GenerationEvent::Progress { produced } => Some(*produced),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![10, 20, 30]);
    assert_eq!(events.last(), Some(&GenerationEvent::Finished(summary)));
}

#[test]
fn ticks_track_bounded_runs() {
    let dir = temp_dir("ticks");
    let sources = scenario_reference(&dir);
    let out = dir.join("clientes.csv");

    let engine = GenerationEngine::new(seeded(8));
    let (progress, events) = progress_channel(4096);
    engine.run(
        &sources,
        &job(20, DomainPolicy::Random, out),
        &CancelHandle::new(),
        &progress,
    );
    drop(progress);

    let ticks: Vec<(u64, u64)> = events
        .iter()
        .filter_map(|event| match event {
            GenerationEvent::Tick { produced, target } => Some((produced, target)),
            _ => None,
        })
        .collect();
    assert_eq!(ticks.len(), 20);
    assert_eq!(ticks.last(), Some(&(20, 20)));
}

#[test]
fn same_seed_produces_identical_files() {
    let dir = temp_dir("determinism");
    let sources = scenario_reference(&dir);
    let first = dir.join("a.csv");
    let second = dir.join("b.csv");

    for out in [&first, &second] {
        let engine = GenerationEngine::new(seeded(42));
        let (summary, _) = run_collecting(
            &engine,
            &sources,
            &job(500, DomainPolicy::Random, out.clone()),
            &CancelHandle::new(),
        );
        assert_eq!(summary.seed, 42);
    }

    assert_eq!(
        fs::read(&first).expect("read a"),
        fs::read(&second).expect("read b")
    );
}

#[test]
fn invalid_options_are_rejected_before_spawning() {
    let dir = temp_dir("options");
    let engine = GenerationEngine::new(GenerateOptions {
        progress_every: 0,
        ..GenerateOptions::default()
    });
    let err = engine
        .spawn(
            ReferenceSources::in_dir(&dir),
            job(1, DomainPolicy::Random, dir.join("out.csv")),
        )
        .expect_err("zero progress interval");
    assert!(matches!(
        err,
        clientela_generate::GenerationError::InvalidConfiguration(_)
    ));
    assert!(!dir.join("out.csv").exists());
}

#[test]
fn join_returns_without_reading_events() {
    let dir = temp_dir("join");
    let sources = scenario_reference(&dir);
    let out = dir.join("clientes.csv");

    let engine = GenerationEngine::new(seeded(21));
    let handle = engine
        .spawn(sources, job(5_000, DomainPolicy::Random, out.clone()))
        .expect("spawn worker");

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = done_tx.send(handle.join());
    });
    let summary = done_rx
        .recv_timeout(std::time::Duration::from_secs(60))
        .expect("join finished")
        .expect("join worker");

    assert_eq!(summary.termination, Termination::Completed);
    assert_eq!(summary.final_count, 5_000);
    let (_, rows) = read_rows(&out);
    assert_eq!(rows.len(), 5_000);
}

#[cfg(target_os = "linux")]
#[test]
fn write_errors_end_the_run_as_failed() {
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    let dir = temp_dir("full");
    let sources = scenario_reference(&dir);

    let engine = GenerationEngine::new(seeded(9));
    let (summary, _) = run_collecting(
        &engine,
        &sources,
        &job(0, DomainPolicy::Random, full.to_path_buf()),
        &CancelHandle::new(),
    );

    assert_eq!(summary.termination, Termination::Failed);
    assert_eq!(summary.failure, Some(FailureKind::WriteFailure));
}
