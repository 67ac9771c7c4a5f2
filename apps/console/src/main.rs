mod legacy;
mod scenario;

use std::path::PathBuf;

use agent_workspace::{load_settings, Workspace};
use anyhow::{Context, Result};
use clap::Parser;
use host::{Document, GlobalScope};
use legacy_runtime::SharedState;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{legacy::LegacyBundle, scenario::Scenario};

#[derive(Parser, Debug)]
#[command(name = "agent_console", about = "Replays agent workspace scenarios")]
struct Args {
    /// Settings file; `agent_workspace.toml` is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "apps/console/scenarios/demo.toml")]
    scenario: PathBuf,
    /// Used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Reject the legacy bundle instead of loading it.
    #[arg(long)]
    fail_legacy_load: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let settings = load_settings(args.config.as_deref()).context("loading settings")?;
    let scenario = Scenario::from_path(&args.scenario)?;

    let document = Document::new();
    let nodes = scenario.build(&document)?;
    let scope = GlobalScope::with_document(document.clone());
    let workspace = Workspace::compose(settings.clone(), scope.clone(), SharedState::new())
        .context("composing workspace")?;
    info!(
        actions = workspace.state().registered_actions().len(),
        elements = nodes.len(),
        "console: workspace ready"
    );

    let bundle = LegacyBundle::new();
    let (loaded, settled) = tokio::join!(workspace.bootstrap_legacy(), async {
        tokio::task::yield_now().await;
        bundle.settle(&document, &scope, &settings, args.fail_legacy_load)
    });
    debug!(settled, "console: legacy resources settled");
    if loaded.is_err() {
        warn!("console: continuing with migrated slices only");
    }

    for (index, step) in scenario.events.iter().enumerate() {
        let event = step.to_event(&nodes)?;
        let not_canceled = document.dispatch_event(&event);
        info!(
            index,
            kind = %step.kind,
            target = step.target.as_deref().unwrap_or("-"),
            default_prevented = !not_canceled,
            "console: event replayed"
        );
        // Let handlers that spawned async legacy work finish.
        tokio::task::yield_now().await;
    }

    let snapshot = workspace.state().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!(
        "legacy calls: {}",
        serde_json::to_string(&*bundle.journal().lock())?
    );
    println!(
        "delivery remarks: {:?}",
        bundle.customer().lock().delivery_remarks.default
    );
    workspace.shutdown();
    Ok(())
}
