use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cbir_fast_descriptors::{DescriptorConfig, ExecutionMode};
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources, Command, FingerprintArgs};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    log_level: Option<String>,
    output: Option<OutputFileConfig>,
    descriptors: Option<DescriptorFileConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputFileConfig {
    artifact_dir: Option<String>,
    static_prefix: Option<String>,
    pretty: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DescriptorFileConfig {
    clusters: Option<usize>,
    seed: Option<u64>,
    threshold: Option<String>,
    shape_source: Option<String>,
    edge_mode: Option<String>,
    glcm: Option<bool>,
    texture_overlay: Option<bool>,
    shape_overlay: Option<bool>,
    parallel: Option<bool>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub descriptors: DescriptorConfig,
    pub output: OutputSettings,
    pub log_level: Option<String>,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    /// JSON destination; stdout when absent.
    pub path: Option<PathBuf>,
    pub pretty: bool,
    /// Overlays are only persisted when a directory is configured.
    pub artifacts: Option<ArtifactSettings>,
}

#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    pub dir: PathBuf,
    pub static_prefix: String,
}

const CONFIG_FILE_NAME: &str = "cbir-fast.toml";
pub const DEFAULT_STATIC_PREFIX: &str = "/static/artifacts";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

/// Lookup order: `--config`, `./cbir-fast.toml`, then the platform config
/// directory. Only an explicit `--config` must exist.
fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let config = read_config(&path)?;
        return Ok((config, Some(path)));
    }

    let candidates = [project_config_path(), default_config_path()];
    for path in candidates.into_iter().flatten() {
        if path.exists() {
            let config = read_config(&path)?;
            return Ok((config, Some(path)));
        }
    }
    Ok((FileConfig::default(), None))
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));

    let FileConfig {
        log_level: file_log_level,
        output: file_output,
        descriptors: file_descriptors,
    } = file;
    let file_output = file_output.unwrap_or_default();

    let fingerprint = match &cli.command {
        Command::Fingerprint(args) => Some(args),
        Command::Refine(_) => None,
    };

    let descriptors = descriptor_config(
        fingerprint,
        sources,
        file_descriptors.unwrap_or_default(),
        config_path.as_ref(),
    )?;

    let log_level =
        normalize_string(cli.log_level.clone()).or_else(|| normalize_string(file_log_level));

    let pretty = cli.pretty || file_output.pretty.unwrap_or(false);

    let artifact_dir = match fingerprint.and_then(|args| args.artifact_dir.clone()) {
        Some(dir) => Some(expand_pathbuf(dir)),
        None => normalize_string(file_output.artifact_dir)
            .and_then(|dir| resolve_path_from_config(dir, config_dir.as_deref())),
    };
    let static_prefix = fingerprint
        .and_then(|args| normalize_string(args.static_prefix.clone()))
        .or_else(|| normalize_string(file_output.static_prefix))
        .unwrap_or_else(|| DEFAULT_STATIC_PREFIX.to_string());
    let artifacts = artifact_dir.map(|dir| ArtifactSettings {
        dir,
        static_prefix: static_prefix.trim_end_matches('/').to_string(),
    });

    Ok(EffectiveSettings {
        descriptors,
        output: OutputSettings {
            path: cli.output.clone().map(expand_pathbuf),
            pretty,
            artifacts,
        },
        log_level,
        config_path,
    })
}

fn descriptor_config(
    cli: Option<&FingerprintArgs>,
    sources: &CliSources,
    file: DescriptorFileConfig,
    path: Option<&PathBuf>,
) -> Result<DescriptorConfig, ConfigError> {
    let mut config = DescriptorConfig::default();

    if let Some(clusters) = file.clusters {
        if clusters == 0 {
            return Err(ConfigError::InvalidValue {
                path: path.cloned(),
                field: "descriptors.clusters",
                value: clusters.to_string(),
            });
        }
        config.dominant_colors.k = clusters;
    }
    if let Some(seed) = file.seed {
        config.dominant_colors.seed = seed;
    }
    if let Some(value) = normalize_string(file.threshold) {
        config.shape.threshold = parse_value(&value, "descriptors.threshold", path)?;
    }
    if let Some(value) = normalize_string(file.shape_source) {
        config.shape.source = parse_value(&value, "descriptors.shape_source", path)?;
    }
    if let Some(value) = normalize_string(file.edge_mode) {
        config.edge.mode = parse_value(&value, "descriptors.edge_mode", path)?;
    }
    if let Some(enabled) = file.glcm {
        config.glcm.enabled = enabled;
    }
    if let Some(enabled) = file.texture_overlay {
        config.texture.overlay = enabled;
    }
    if let Some(enabled) = file.shape_overlay {
        config.shape.overlay = enabled;
    }
    if let Some(parallel) = file.parallel {
        config.execution = if parallel {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        };
    }

    let Some(args) = cli else {
        return Ok(config);
    };
    if sources.clusters_from_cli {
        config.dominant_colors.k = args.clusters;
    }
    if sources.threshold_from_cli {
        config.shape.threshold = args.threshold;
    }
    if sources.shape_source_from_cli {
        config.shape.source = args.shape_source;
    }
    if sources.edge_mode_from_cli {
        config.edge.mode = args.edge_mode;
    }
    if args.no_glcm {
        config.glcm.enabled = false;
    }
    if args.no_texture_overlay {
        config.texture.overlay = false;
    }
    if args.no_shape_overlay {
        config.shape.overlay = false;
    }
    if args.sequential {
        config.execution = ExecutionMode::Sequential;
    }
    Ok(config)
}

fn parse_value<T: FromStr>(
    value: &str,
    field: &'static str,
    path: Option<&PathBuf>,
) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        path: path.cloned(),
        field,
        value: value.to_string(),
    })
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "cbir-fast", "cbir-fast")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir().ok().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    match base {
        Some(base) if !expanded.is_absolute() => Some(base.join(expanded)),
        _ => Some(expanded),
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_cli_from;
    use cbir_fast_descriptors::{EdgeMode, ShapeSource, ThresholdStrategy};

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, contents).unwrap();
        path
    }

    fn resolve(args: &[&str]) -> Result<EffectiveSettings, ConfigError> {
        let (cli, sources) = parse_cli_from(args.iter().copied()).unwrap();
        resolve_settings(&cli, &sources)
    }

    const SAMPLE: &str = r#"
log_level = "debug"

[output]
artifact_dir = "overlays"
static_prefix = "/static/"
pretty = true

[descriptors]
clusters = 3
seed = 7
threshold = "fixed:100"
shape_source = "whole-image"
edge_mode = "density"
glcm = false
parallel = false
"#;

    #[test]
    fn file_values_apply_without_cli_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), SAMPLE);
        let config_arg = config.to_string_lossy().into_owned();
        let settings = resolve(&["cbir-fast", "--config", &config_arg, "fingerprint", "a.png"])
            .unwrap();

        let descriptors = &settings.descriptors;
        assert_eq!(descriptors.dominant_colors.k, 3);
        assert_eq!(descriptors.dominant_colors.seed, 7);
        assert_eq!(descriptors.shape.threshold, ThresholdStrategy::Fixed(100));
        assert_eq!(descriptors.shape.source, ShapeSource::WholeImage);
        assert_eq!(descriptors.edge.mode, EdgeMode::Density);
        assert!(!descriptors.glcm.enabled);
        assert_eq!(descriptors.execution, ExecutionMode::Sequential);

        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert!(settings.output.pretty);
        let artifacts = settings.output.artifacts.unwrap();
        assert_eq!(artifacts.dir, dir.path().join("overlays"));
        assert_eq!(artifacts.static_prefix, "/static");
    }

    #[test]
    fn explicit_cli_values_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), SAMPLE);
        let config_arg = config.to_string_lossy().into_owned();
        let settings = resolve(&[
            "cbir-fast",
            "--config",
            &config_arg,
            "--log-level",
            "warn",
            "fingerprint",
            "-k",
            "8",
            "--edge-mode",
            "histogram",
            "--artifact-dir",
            "/tmp/cbir-out",
            "--no-shape-overlay",
            "a.png",
        ])
        .unwrap();

        assert_eq!(settings.descriptors.dominant_colors.k, 8);
        assert_eq!(settings.descriptors.edge.mode, EdgeMode::Histogram);
        // Left at its default on the command line, so the file value stays.
        assert_eq!(
            settings.descriptors.shape.threshold,
            ThresholdStrategy::Fixed(100)
        );
        assert!(!settings.descriptors.shape.overlay);
        assert_eq!(settings.log_level.as_deref(), Some("warn"));
        let artifacts = settings.output.artifacts.unwrap();
        assert_eq!(artifacts.dir, PathBuf::from("/tmp/cbir-out"));
    }

    #[test]
    fn invalid_file_value_names_the_field() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "[descriptors]\nedge_mode = \"sparse\"\n");
        let config_arg = config.to_string_lossy().into_owned();
        let err = resolve(&["cbir-fast", "--config", &config_arg, "fingerprint", "a.png"])
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { field, value, .. } => {
                assert_eq!(field, "descriptors.edge_mode");
                assert_eq!(value, "sparse");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_clusters_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "[descriptors]\nclusters = 0\n");
        let config_arg = config.to_string_lossy().into_owned();
        let err = resolve(&["cbir-fast", "--config", &config_arg, "fingerprint", "a.png"])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "descriptors.clusters",
                ..
            }
        ));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let missing_arg = missing.to_string_lossy().into_owned();
        let err = resolve(&["cbir-fast", "--config", &missing_arg, "refine", "req.json"])
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "[descriptors\nclusters = 3");
        let config_arg = config.to_string_lossy().into_owned();
        let err = resolve(&["cbir-fast", "--config", &config_arg, "refine", "req.json"])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn refine_keeps_file_output_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), SAMPLE);
        let config_arg = config.to_string_lossy().into_owned();
        let settings =
            resolve(&["cbir-fast", "--config", &config_arg, "refine", "req.json"]).unwrap();
        // The file still configures an artifact directory for fingerprint runs.
        assert!(settings.output.artifacts.is_some());
        assert!(settings.output.path.is_none());
    }
}
