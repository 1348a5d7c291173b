use std::path::PathBuf;
use std::process::ExitCode;

use pionier_lib::command::execute_json_batch;
use pionier_lib::error::{EditorError, Result};
use pionier_lib::harness::TestHarness;
use pionier_lib::state::{EditorSettings, Inventory};

const USAGE: &str = "usage: pionier --script <file> [--scene <file>] [--fresh]";

struct Args {
    script: PathBuf,
    scene: Option<PathBuf>,
    /// Neither resume from nor write the autosave
    fresh: bool,
}

fn parse_args() -> Result<Args> {
    let mut script = None;
    let mut scene = None;
    let mut fresh = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--script" => script = args.next().map(PathBuf::from),
            "--scene" => scene = args.next().map(PathBuf::from),
            "--fresh" => fresh = true,
            other => {
                return Err(EditorError::InvalidCommand(format!("unexpected argument {other}")));
            }
        }
    }
    let script = script.ok_or_else(|| EditorError::InvalidCommand(USAGE.to_string()))?;
    Ok(Args { script, scene, fresh })
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let mut harness = TestHarness::with_settings(EditorSettings::load());

    if let Some(path) = &args.scene {
        let json = std::fs::read_to_string(path)?;
        let report = harness.load_scene_json(&json)?;
        tracing::info!(
            "Loaded scene from {} ({} poles, {} lashings)",
            path.display(),
            report.poles,
            report.lashings
        );
    } else if !args.fresh {
        if let Some(record) = Inventory::load_autosave() {
            let report = harness.load_scene(&record);
            tracing::info!("Loaded autosave scene ({} poles, {} lashings)", report.poles, report.lashings);
        }
    }
    let loaded_version = harness.inventory.version();

    let script = std::fs::read_to_string(&args.script)?;
    let responses = execute_json_batch(&mut harness, &script)?;
    let failed = responses.iter().filter(|r| !r.success).count();
    for response in &responses {
        println!("{}", serde_json::to_string(response)?);
    }
    tracing::info!(commands = responses.len(), failed, "script finished");

    if !args.fresh && harness.inventory.version() != loaded_version {
        harness.inventory.autosave()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pionier=info,pionier_lib=info".into()),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
