use std::path::PathBuf;
use std::process;

use async_trait::async_trait;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use yarnlift::client::{ApplicationId, LocalFs, ResourceManager, Submission, SubmitFault};
use yarnlift::error::LaunchError;
use yarnlift::launch::{Archive, LaunchSpec};
use yarnlift::submit::JobSubmitter;

/// Exit code reported when a configuration artifact is missing.
const MISSING_ARTIFACT_EXIT: i32 = -1;

#[derive(Parser, Debug)]
#[command(name = "submit-pyjob")]
#[command(about = "Submit a Python analytics job to the cluster")]
struct Args {
    /// Cluster (storage and connectivity) property file
    #[arg(long, default_value = "conf/cluster.properties")]
    cluster_conf: PathBuf,

    /// Execution-engine property file
    #[arg(long, default_value = "conf/engine.properties")]
    engine_conf: PathBuf,

    /// Local path of the Python payload
    #[arg(long)]
    payload: PathBuf,

    /// Entry-point class of the remote runner
    #[arg(long, default_value = "org.apache.spark.deploy.PythonRunner")]
    runner_class: String,

    /// Archive bundle as uri#alias, e.g. a packaged interpreter (repeatable)
    #[arg(long = "archive", value_parser = parse_archive)]
    archives: Vec<Archive>,

    /// Auxiliary file reference (repeatable)
    #[arg(long = "file")]
    files: Vec<String>,

    /// Secondary library reference (repeatable)
    #[arg(long = "py-file")]
    py_files: Vec<String>,

    /// Input table for the payload
    #[arg(long)]
    input: String,

    /// Model output root on the distributed filesystem
    #[arg(long)]
    model_root: Option<String>,

    /// Payload mode, e.g. train
    #[arg(long, default_value = "train")]
    mode: String,
}

fn parse_archive(raw: &str) -> Result<Archive, String> {
    let (uri, alias) = raw
        .split_once('#')
        .ok_or_else(|| format!("expected uri#alias, got {raw}"))?;
    Ok(Archive::new(uri, alias))
}

/// Stand-in resource manager: logs the submission instead of talking to
/// a cluster. Replace with a real client implementation to go live.
struct DryRunManager;

#[async_trait]
impl ResourceManager for DryRunManager {
    async fn submit_application(
        &self,
        submission: &Submission,
    ) -> Result<ApplicationId, SubmitFault> {
        for (key, value) in submission.engine.iter() {
            tracing::debug!(key, value, "engine property");
        }
        tracing::info!(
            payload = %submission.client_args.primary_py_file,
            runner_class = %submission.client_args.runner_class,
            executor_memory = %submission.client_args.executor_memory,
            executor_cores = submission.client_args.executor_cores,
            app_args = ?submission.client_args.app_args,
            "Dry run, application not sent to a cluster"
        );
        Ok(ApplicationId::new(format!(
            "application_{}_0001",
            chrono::Utc::now().timestamp()
        )))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut spec = LaunchSpec::new(&args.payload, &args.runner_class);
    spec.archives = args.archives.clone();
    spec.files = args.files.clone();
    spec.py_files = args.py_files.clone();

    let mut app_args = vec!["--input".to_string(), args.input.clone()];
    if let Some(root) = &args.model_root {
        app_args.push("--model".to_string());
        app_args.push(format!("{root}/{}", chrono::Utc::now().timestamp_millis()));
    }
    app_args.push("--mode".to_string());
    app_args.push(args.mode.clone());
    let spec = spec.with_app_args(app_args);

    let submitter = JobSubmitter::new(DryRunManager, LocalFs);
    match submitter
        .run(&args.cluster_conf, &args.engine_conf, &spec)
        .await
    {
        Ok(app_id) => {
            println!(
                "{}",
                serde_json::json!({ "app_id": app_id, "submitted": true })
            );
        }
        Err(LaunchError::ArtifactMissing(path)) => {
            eprintln!("configuration artifact missing: {}", path.display());
            process::exit(MISSING_ARTIFACT_EXIT);
        }
        Err(err) => {
            // Submission was attempted; the failure is already logged.
            eprintln!("submission failed: {err}");
        }
    }
}
