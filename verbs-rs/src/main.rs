use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use verbs::cli::{self, Cli, ConfigSource};
use verbs::config::Config;
use verbs::delay::DelayMode;
use verbs::script::Runner;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Load rc file ──────────────────────────────────────────────────────────
    let path = match args.config_source() {
        ConfigSource::Skip => None,
        ConfigSource::Explicit(path) => Some(path),
        ConfigSource::Search => cli::find_user_config(),
    };
    let mut config = Config::new();
    if let Some(path) = path {
        match Config::load_file(&path) {
            Ok((loaded, errors)) => {
                for e in errors {
                    eprintln!("verbs: {}: {e}", path.display());
                }
                info!(path = %path.display(), vars = loaded.vars.len(), "loaded config");
                config = loaded;
            }
            Err(e) => eprintln!("verbs: warning: {}: {e}", path.display()),
        }
    }
    if args.blocking_wait {
        config.delay_mode = DelayMode::Blocking;
    }

    let ctx = match config.build_context() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("verbs: {e}");
            return ExitCode::FAILURE;
        }
    };
    debug!(delay_mode = ?ctx.delay_mode(), "starting run");
    if ctx.delay_mode() == DelayMode::Blocking {
        warn!("blocking wait enabled: `wait` stalls the whole runtime");
    }
    let mut runner = Runner::new(ctx);

    // ── Commands (-c), then the script ────────────────────────────────────────
    let mut sources: Vec<(String, String)> = args
        .commands
        .iter()
        .map(|cmd| ("-c".to_owned(), cmd.clone()))
        .collect();
    match &args.script {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => sources.push((path.display().to_string(), text)),
            Err(e) => {
                eprintln!("verbs: {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None if args.commands.is_empty() => {
            let mut text = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut text) {
                eprintln!("verbs: stdin: {e}");
                return ExitCode::FAILURE;
            }
            sources.push(("<stdin>".to_owned(), text));
        }
        None => {}
    }

    let mut status = ExitCode::SUCCESS;
    for (origin, text) in &sources {
        let outcome = runner.exec_script(text).await;
        for line in runner.context_mut().take_output() {
            println!("{line}");
        }
        if let Err(e) = outcome {
            eprintln!("verbs: {origin}: {e}");
            status = ExitCode::FAILURE;
            break;
        }
    }

    if args.print_result {
        println!("{}", runner.context().last_result());
    }
    status
}
