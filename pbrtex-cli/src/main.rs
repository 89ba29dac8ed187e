//! pbrtex CLI - command-line front end of the texture compiler.
//!
//! ```text
//! pbrtex --albedo-roughness --production --input bricks.png --output bricks.dds
//! pbrtex --cube-map --development --input sky.exr --output sky.dds \
//!        --output-size 1024 --irradiance sky_irr.dds --irradiance-size 32 \
//!        --prefilter sky_pre.dds --prefilter-size 256
//! ```

mod error;
mod options;
mod progress;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use pbrtex::config::ConfigFile;
use pbrtex::logging::init_logging;
use pbrtex::{BackendKind, Compiler, CompilerSettings};
use tracing::debug;

use error::CliError;
use options::Args;
use progress::StageProgress;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", CliError::Arguments(parse_error_reason(&e)));
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    // CLI takes precedence, then config
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let log_file = args.log_file.clone().or_else(|| config.logging.file.clone());
    let _logging = init_logging(&level, log_file.as_deref())?;

    let request = args.to_request(&config)?;
    let backend = args
        .backend
        .map(BackendKind::from)
        .unwrap_or(config.render.backend);
    debug!(backend = %backend, "Resolved render backend");

    let mut settings = CompilerSettings::new().with_backend(backend);
    let bars = (!args.quiet).then(StageProgress::new);
    if let Some(bars) = &bars {
        settings = settings.with_progress(bars.callback());
    }

    let result = Compiler::new(settings).compile(&request);
    if let Some(bars) = &bars {
        bars.finish();
    }

    for stage in &result?.stages {
        println!("{}", stage);
    }
    Ok(())
}

/// First line of a clap error without its `error: ` prefix.
fn parse_error_reason(e: &clap::Error) -> String {
    let rendered = e.render().to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}
