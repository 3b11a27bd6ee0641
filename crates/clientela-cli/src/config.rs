use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use clientela_core::ReferenceSources;
use clientela_generate::{
    DomainPolicy, GenerateOptions, GenerationError, GenerationJob, TargetCount,
};

use crate::GenerateArgs;

pub const DEFAULT_COUNT: u64 = 100_000;
pub const DEFAULT_OUT: &str = "clientes.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Defaults read from a TOML file. Command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub count: Option<u64>,
    pub domain: Option<String>,
    pub out: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub progress_every: Option<u64>,
    pub report: Option<PathBuf>,
    #[serde(default)]
    pub sources: SourceOverrides,
}

/// Per-file overrides of the conventional names inside `data_dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceOverrides {
    pub male_names: Option<PathBuf>,
    pub female_names: Option<PathBuf>,
    pub surnames: Option<PathBuf>,
    pub locations: Option<PathBuf>,
}

impl FileConfig {
    /// Parse `path`; relative paths inside it are taken relative to the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.rebase(base))
    }

    fn rebase(self, base: &Path) -> Self {
        let join = |path: Option<PathBuf>| path.map(|path| base.join(path));
        Self {
            out: join(self.out),
            data_dir: join(self.data_dir),
            report: join(self.report),
            sources: SourceOverrides {
                male_names: join(self.sources.male_names),
                female_names: join(self.sources.female_names),
                surnames: join(self.sources.surnames),
                locations: join(self.sources.locations),
            },
            ..self
        }
    }
}

/// Everything needed to start one run.
#[derive(Debug, Clone)]
pub struct GenerateSettings {
    pub job: GenerationJob,
    pub sources: ReferenceSources,
    pub options: GenerateOptions,
    pub report: Option<PathBuf>,
}

/// Merge flags over file values over defaults. Rejects bad values before
/// any file is touched.
pub fn resolve_generate(
    args: &GenerateArgs,
    file: FileConfig,
) -> Result<GenerateSettings, GenerationError> {
    let target = match (&args.count, file.count) {
        (Some(count), _) => TargetCount::parse(count)?,
        (None, Some(count)) => TargetCount::from_count(count),
        (None, None) => TargetCount::from_count(DEFAULT_COUNT),
    };

    let domain = match args.domain.as_deref().or(file.domain.as_deref()) {
        Some(value) => DomainPolicy::parse(value)?,
        None => DomainPolicy::Random,
    };

    let destination = args
        .out
        .clone()
        .or(file.out)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT));

    let data_dir = args
        .data_dir
        .clone()
        .or(file.data_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let defaults = ReferenceSources::in_dir(&data_dir);
    let pick = |flag: &Option<PathBuf>, from_file: Option<PathBuf>, default: PathBuf| {
        flag.clone().or(from_file).unwrap_or(default)
    };
    let sources = ReferenceSources {
        male_names: pick(&args.male_names, file.sources.male_names, defaults.male_names),
        female_names: pick(
            &args.female_names,
            file.sources.female_names,
            defaults.female_names,
        ),
        surnames: pick(&args.surnames, file.sources.surnames, defaults.surnames),
        locations: pick(&args.locations, file.sources.locations, defaults.locations),
    };

    let mut options = GenerateOptions {
        seed: args.seed.or(file.seed),
        ..GenerateOptions::default()
    };
    if let Some(every) = args.progress_every.or(file.progress_every) {
        options.progress_every = every;
    }
    options.validate()?;

    Ok(GenerateSettings {
        job: GenerationJob {
            target,
            domain,
            destination,
        },
        sources,
        options,
        report: args.report.clone().or(file.report),
    })
}
