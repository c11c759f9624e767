//! Replays a recorded study session and prints the outcome as JSON lines

use std::process::ExitCode;

use arpen_core::EngineConfig;
use arpen_engine::replay::{self, ReplayScript};

const USAGE: &str = "usage: arpen-replay <script.ron> [--config <engine.ron>]";

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arpen_engine=debug,arpen_view=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (script_path, config_path) = match args.as_slice() {
        [script] => (script, None),
        [script, flag, config] if flag == "--config" => (script, Some(config)),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let mut script = match ReplayScript::load(script_path) {
        Ok(script) => script,
        Err(e) => {
            tracing::error!("Failed to load {}: {}", script_path, e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = config_path {
        match EngineConfig::load(path) {
            Ok(config) => script.config = config,
            Err(e) => {
                tracing::error!("Failed to load config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    }

    let report = replay::run(script);
    match report.to_json_lines() {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
