use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use release_tagger::adapter::inbound::cli::command::Cli;
use release_tagger::adapter::inbound::cli::diagnostic::{config_parse_error, CommandError};
use release_tagger::adapter::inbound::cli::output::{self, OutputConfig};
use release_tagger::adapter::inbound::cli::{self, paths};
use release_tagger::error::Error;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let args = Cli::parse();
    output::configure(OutputConfig::new(args.json, args.quiet, args.verbose, args.color));

    let mut config = match cli::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let path = args.config.clone().unwrap_or_else(paths::default_config);
            report_config_error(&path, &e);
            return ExitCode::FAILURE;
        }
    };
    cli::apply_log_flags(&args, &mut config);
    config.init_logging();

    match cli::dispatch(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &Error) {
    if output::is_json() {
        output::error(&err.to_string());
    } else {
        eprintln!("{:?}", miette::Report::new(CommandError::from(err)));
    }
}

fn report_config_error(path: &Path, err: &Error) {
    if !output::is_json() {
        if let Error::Config(config_err) = err {
            let content = std::fs::read_to_string(path).unwrap_or_default();
            let name = path.display().to_string();
            if let Some(diag) = config_parse_error(&name, &content, config_err) {
                eprintln!("{:?}", miette::Report::new(diag));
                return;
            }
        }
    }
    report(err);
}
