use std::ffi::OsString;
use std::path::PathBuf;

use cbir_fast_descriptors::{DEFAULT_DOMINANT_COLORS, EdgeMode, ShapeSource, ThresholdStrategy};
use clap::builder::TypedValueParser;
use clap::parser::ValueSource;
use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};

/// Records which defaulted options were typed on the command line, so
/// config file values only yield to explicit flags.
#[derive(Debug, Default)]
pub struct CliSources {
    pub clusters_from_cli: bool,
    pub threshold_from_cli: bool,
    pub edge_mode_from_cli: bool,
    pub shape_source_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        let Some(fingerprint) = matches.subcommand_matches("fingerprint") else {
            return Self::default();
        };
        Self {
            clusters_from_cli: value_from_cli(fingerprint, "clusters"),
            threshold_from_cli: value_from_cli(fingerprint, "threshold"),
            edge_mode_from_cli: value_from_cli(fingerprint, "edge_mode"),
            shape_source_from_cli: value_from_cli(fingerprint, "shape_source"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    match parse_cli_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(err) => err.exit(),
    }
}

pub fn parse_cli_from<I, T>(args: I) -> Result<(CliArgs, CliSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = CliArgs::command().try_get_matches_from(args)?;
    let cli = CliArgs::from_arg_matches(&matches)?;
    let sources = CliSources::from_matches(&matches);
    Ok((cli, sources))
}

#[derive(Debug, Parser)]
#[command(
    name = "cbir-fast",
    about = "Compute image retrieval fingerprints and refine queries",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Override the configuration file path
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Write JSON results to this file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long = "pretty", global = true)]
    pub pretty: bool,

    /// Log filter directive, e.g. `debug` or `cbir_fast_descriptors=trace`
    #[arg(long = "log-level", value_name = "FILTER", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute the fingerprint of one or more images
    Fingerprint(FingerprintArgs),
    /// Apply relevance feedback to a query vector
    Refine(RefineArgs),
}

#[derive(Debug, Args)]
pub struct FingerprintArgs {
    /// Encoded input images
    #[arg(required = true, value_name = "IMAGE")]
    pub images: Vec<PathBuf>,

    /// Directory receiving PNG overlays
    #[arg(long = "artifact-dir", value_name = "DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// URL prefix under which artifacts are referenced in the output
    #[arg(long = "static-prefix", value_name = "PREFIX")]
    pub static_prefix: Option<String>,

    /// Number of dominant colors
    #[arg(
        short = 'k',
        long = "clusters",
        id = "clusters",
        default_value_t = DEFAULT_DOMINANT_COLORS,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from)
    )]
    pub clusters: usize,

    /// Shape binarization: `otsu`, `fixed` or `fixed:<0-255>`
    #[arg(long = "threshold", id = "threshold", default_value = "otsu")]
    pub threshold: ThresholdStrategy,

    /// Edge statistic: `histogram` or `density`
    #[arg(long = "edge-mode", id = "edge_mode", default_value = "histogram")]
    pub edge_mode: EdgeMode,

    /// Shape moments source: `contour` or `whole-image`
    #[arg(long = "shape-source", id = "shape_source", default_value = "contour")]
    pub shape_source: ShapeSource,

    /// Skip the GLCM statistics
    #[arg(long = "no-glcm")]
    pub no_glcm: bool,

    /// Skip the Gabor contour overlay
    #[arg(long = "no-texture-overlay")]
    pub no_texture_overlay: bool,

    /// Skip the shape contour overlay
    #[arg(long = "no-shape-overlay")]
    pub no_shape_overlay: bool,

    /// Run the extractors of one image on the calling thread
    #[arg(long = "sequential")]
    pub sequential: bool,
}

#[derive(Debug, Args)]
pub struct RefineArgs {
    /// JSON relevance feedback request
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_not_reported_as_cli_values() {
        let (cli, sources) = parse_cli_from(["cbir-fast", "fingerprint", "a.png"]).unwrap();
        let Command::Fingerprint(args) = cli.command else {
            panic!("expected fingerprint command");
        };
        assert_eq!(args.clusters, 5);
        assert_eq!(args.threshold, ThresholdStrategy::Otsu);
        assert!(!sources.clusters_from_cli);
        assert!(!sources.threshold_from_cli);
    }

    #[test]
    fn explicit_values_are_tracked() {
        let (cli, sources) = parse_cli_from([
            "cbir-fast",
            "--pretty",
            "fingerprint",
            "-k",
            "3",
            "--threshold",
            "fixed:90",
            "--edge-mode",
            "density",
            "a.png",
            "b.jpg",
        ])
        .unwrap();
        assert!(cli.pretty);
        let Command::Fingerprint(args) = cli.command else {
            panic!("expected fingerprint command");
        };
        assert_eq!(args.images.len(), 2);
        assert_eq!(args.clusters, 3);
        assert_eq!(args.threshold, ThresholdStrategy::Fixed(90));
        assert_eq!(args.edge_mode, EdgeMode::Density);
        assert!(sources.clusters_from_cli);
        assert!(sources.threshold_from_cli);
        assert!(sources.edge_mode_from_cli);
        assert!(!sources.shape_source_from_cli);
    }

    #[test]
    fn zero_clusters_and_unknown_modes_are_rejected() {
        assert!(parse_cli_from(["cbir-fast", "fingerprint", "-k", "0", "a.png"]).is_err());
        let unknown_mode = ["cbir-fast", "fingerprint", "--edge-mode", "x", "a.png"];
        assert!(parse_cli_from(unknown_mode).is_err());
        assert!(parse_cli_from(["cbir-fast", "fingerprint"]).is_err());
    }
}
