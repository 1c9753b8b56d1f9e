//! Wires a recorded deployment into the progress tree and drives it.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{Cli, Command};
use crate::config::{AppConfig, ConfigManager};
use crate::error::{Result, StackwatchError};
use crate::progress::{
    drive, DynamicRenderer, LineComponent, RenderOptions, Renderer, ResourceComponent,
    ServiceDeploymentComponent, StackComponent, Tree,
};
use crate::stack::replay::{DeploymentHeader, Recording, ReplayRollouts, Replayer};
use crate::stack::{EventFanout, RolloutStreams, StackEvent, TaskGroup};

/// Applies command-line overrides on top of the loaded config.
pub fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(interval) = cli.interval_ms {
        config.render.interval_ms = interval;
    }
    if cli.no_color {
        config.render.color = false;
    }
    if let Command::Replay {
        speed: Some(speed), ..
    } = cli.command
    {
        config.replay.speed = speed;
    }
}

pub async fn run(cli: Cli, manager: ConfigManager) -> Result<()> {
    match &cli.command {
        Command::InitConfig => {
            let path = manager.write_default_config()?;
            println!("Config written to {}", path.display());
            Ok(())
        }
        Command::Replay { file, .. } => {
            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted by user");
                    interrupt.cancel();
                }
            });

            let mut stdout = std::io::stdout();
            let result = replay(file, manager.app_config(), &cancel, &mut stdout).await;
            let _ = stdout.flush();
            result
        }
    }
}

/// Builds the render tree for `header`. Every component subscribes to
/// `stack_events` here, so this must run before anything is published.
pub fn build_tree(
    header: &DeploymentHeader,
    stack_events: &EventFanout<StackEvent>,
    rollouts: Arc<dyn RolloutStreams>,
    tasks: &TaskGroup,
    opts: RenderOptions,
    footer: Vec<Arc<dyn Renderer>>,
) -> Tree {
    let nested = opts.nested();
    let resources: Vec<Arc<dyn DynamicRenderer>> = header
        .resources
        .iter()
        .map(|resource| -> Arc<dyn DynamicRenderer> {
            if resource.service {
                Arc::new(ServiceDeploymentComponent::new(
                    resource.logical_id.clone(),
                    resource.description.clone(),
                    stack_events.subscribe(),
                    stack_events.subscribe(),
                    Arc::clone(&rollouts),
                    tasks.clone(),
                    nested,
                ))
            } else {
                Arc::new(ResourceComponent::new(
                    resource.logical_id.clone(),
                    resource.description.clone(),
                    stack_events.subscribe(),
                    nested,
                ))
            }
        })
        .collect();

    let description = header
        .description
        .clone()
        .unwrap_or_else(|| format!("Deploy stack {}", header.stack_name));
    let root = StackComponent::new(
        header.stack_name.clone(),
        description,
        stack_events.subscribe(),
        resources,
        opts,
    );
    Tree::compose(Arc::new(root), footer)
}

/// Replays the recording at `path` to `out` until it ends or `cancel` fires.
pub async fn replay<W: Write>(
    path: &Path,
    config: &AppConfig,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<()> {
    let recording = Recording::load(path)?;
    info!(
        stack = %recording.header.stack_name,
        resources = recording.header.resources.len(),
        events = recording.items.len(),
        "Replaying recorded deployment"
    );

    let tasks = TaskGroup::new(cancel);
    let stack_events = Arc::new(EventFanout::new());
    let rollouts = Arc::new(ReplayRollouts::new());
    let opts = config.render.render_options();

    let footer: Vec<Arc<dyn Renderer>> = vec![Arc::new(LineComponent::new(
        format!("Replaying {} at {}x", path.display(), config.replay.speed),
        opts,
    ))];
    let tree = build_tree(
        &recording.header,
        &stack_events,
        Arc::clone(&rollouts) as Arc<dyn RolloutStreams>,
        &tasks,
        opts,
        footer,
    );

    let replayer = Replayer::new(
        recording,
        stack_events,
        rollouts,
        config.replay.replay_options(),
    );
    tasks.spawn("replay", replayer.run(tasks.token().clone()));

    let drive_result = drive(tasks.token(), out, &tree, config.render.drive_options()).await;
    if drive_result.is_err() {
        tasks.token().cancel();
    }
    let tasks_result = tasks.wait().await;

    match (drive_result, tasks_result) {
        (Err(StackwatchError::Cancelled), Err(task_err)) => Err(task_err),
        (Err(err), _) => {
            if !err.is_cancelled() {
                warn!(error = %err, "Progress rendering failed");
            }
            Err(err)
        }
        (Ok(()), result) => result,
    }
}
