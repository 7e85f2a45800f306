use std::process::ExitCode;

use cbir_fast::cli::parse_cli;
use cbir_fast::logging;
use cbir_fast::run;
use cbir_fast::settings::resolve_settings;
use tracing::debug;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let (cli, sources) = parse_cli();
    let settings = match resolve_settings(&cli, &sources) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    logging::init(settings.log_level.as_deref());
    if let Some(path) = settings.config_path.as_ref() {
        debug!(config = %path.display(), "loaded config file");
    }

    match run(cli.command, &settings).await {
        Ok(summary) if summary.failed == 0 => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!(
                "{} of {} images could not be fingerprinted",
                summary.failed, summary.processed
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
