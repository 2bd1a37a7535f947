use std::path::Path;
use std::process::ExitCode;

use tokio::io::AsyncReadExt;
use tree_spotter::config::{self, PipelineSettings};
use tree_spotter::manifest::Manifest;

/// Reads a submission manifest on stdin, prints the batch result as JSON.
///
/// Relative image paths resolve against the current directory.
#[tokio::main]
async fn main() -> ExitCode {
    tree_spotter::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!(error = %message, "Submission not processed");
            eprintln!("{}: {message}", config::APP_NAME);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let settings = PipelineSettings::from_env().map_err(|e| e.to_string())?;

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .map_err(|e| format!("Cannot read manifest from stdin: {e}"))?;

    let submission = Manifest::from_json(&input)
        .map_err(|e| e.to_string())?
        .into_submission(Path::new("."))
        .await
        .map_err(|e| e.to_string())?;

    let result = tree_spotter::run_submission(&settings, submission)
        .await
        .map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
