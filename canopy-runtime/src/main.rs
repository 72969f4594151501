mod host;
mod scene;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow};
use canopy_types::{LayoutConstraints, LayoutContext, Size, SurfaceId, Tag};
use canopy_ui::{
    MountingCoordinator, Scheduler, SchedulerConfig, SchedulerDelegate, SchedulerToolbox,
    ShadowNode, ShadowNodePtr, ShadowView, StateUpdate,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, info};

use host::{Output, PrintingHost};
use scene::{Scene, Step};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(version, about = "Replay UI scenes through the commit pipeline", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scene and print every mounted transaction
    Play {
        /// Path to the JSON scene
        scene: PathBuf,
        /// Fold everything queued since the last beat into one transaction
        #[arg(short, long)]
        coalesce: bool,
        /// Print mutations as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Parse and validate a scene without running it
    Check {
        /// Path to the JSON scene
        scene: PathBuf,
    },
}

/// Raised by the scheduler whenever a visible surface has something to mount.
#[derive(Default)]
struct Beat {
    ready: AtomicBool,
}

impl Beat {
    fn take(&self) -> bool {
        self.ready.swap(false, Ordering::SeqCst)
    }
}

impl SchedulerDelegate for Beat {
    fn scheduler_did_finish_transaction(&self, mounting_coordinator: &Arc<MountingCoordinator>) {
        debug!(surface_id = mounting_coordinator.surface_id(), "transaction ready");
        self.ready.store(true, Ordering::SeqCst);
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded .env file from: {:?}", path),
        Err(e) => debug!("No .env file found: {}", e),
    }

    match cli.command {
        Commands::Check { scene } => {
            let loaded = Scene::load(&scene)?;
            println!(
                "{} {} ({} steps)",
                "ok".green().bold(),
                scene.display(),
                loaded.steps.len()
            );
            Ok(())
        }
        Commands::Play {
            scene,
            coalesce,
            json,
        } => {
            let output = if json { Output::Json } else { Output::Pretty };
            play(Scene::load(&scene)?, coalesce, output)
        }
    }
}

fn find_by_tag(node: &ShadowNode, tag: Tag) -> Option<&ShadowNodePtr> {
    node.children().iter().find_map(|child| {
        if child.tag() == tag {
            Some(child)
        } else {
            find_by_tag(child, tag)
        }
    })
}

fn constraints(width: f32, height: f32) -> LayoutConstraints {
    LayoutConstraints::exact(Size::new(width, height))
}

fn play(scene: Scene, coalesce: bool, output: Output) -> Result<()> {
    let beat = Arc::new(Beat::default());
    let toolbox = SchedulerToolbox {
        delegate: Some(beat.clone() as Arc<dyn SchedulerDelegate>),
        ..SchedulerToolbox::default()
    };
    let scheduler = Scheduler::new(toolbox, SchedulerConfig::from_env());
    let surface_id = scene.surface_id;

    let coordinator = scheduler.start_surface(
        surface_id,
        constraints(scene.width, scene.height),
        LayoutContext::default(),
    )?;
    let mut host = PrintingHost::new(
        &ShadowView::new(coordinator.base_revision().root().node()),
        output,
    );

    for (index, step) in scene.steps.iter().enumerate() {
        info!(step = index, op = step.name(), "running step");
        run_step(&scheduler, surface_id, step)?;

        for event in scheduler.drain_events() {
            if output == Output::Pretty {
                println!("  {} {} from [{}]", "event".magenta(), event.name, event.tag);
            }
        }

        if beat.take() {
            mount(&coordinator, &mut host, coalesce)?;
        }
    }

    if output == Output::Pretty {
        println!(
            "{} {} views mounted, {} transactions",
            "done".green().bold(),
            host.mirror().len(),
            coordinator.mounted_transactions()
        );
    }
    Ok(())
}

fn run_step(scheduler: &Scheduler, surface_id: SurfaceId, step: &Step) -> Result<()> {
    match step {
        Step::Render { elements } => {
            scheduler.render(surface_id, elements)?;
        }
        Step::SetState { tag, state } => {
            let revision = scheduler.current_revision(surface_id)?;
            let node = find_by_tag(revision.root().node(), *tag)
                .ok_or_else(|| anyhow!("no node with tag {tag} is mounted"))?;
            let update = StateUpdate::replace(node.family().clone(), state.clone());
            scheduler.update_state(&update)?;
        }
        Step::Resize { width, height } => {
            scheduler.constrain_surface_layout(
                surface_id,
                constraints(*width, *height),
                LayoutContext::default(),
            )?;
        }
        Step::DisplayMode { mode } => {
            scheduler.set_display_mode(surface_id, *mode)?;
        }
        Step::Event { tag, name, payload } => {
            let revision = scheduler.current_revision(surface_id)?;
            let node = find_by_tag(revision.root().node(), *tag)
                .ok_or_else(|| anyhow!("no node with tag {tag} is mounted"))?;
            if !node.event_emitter().dispatch(name, payload.clone()) {
                debug!(tag, event = %name, "event dropped, no dispatcher attached");
            }
        }
        Step::Stop => {
            scheduler.stop_surface(surface_id)?;
        }
    }
    Ok(())
}

fn mount(coordinator: &MountingCoordinator, host: &mut PrintingHost, coalesce: bool) -> Result<()> {
    loop {
        let mounted = if coalesce {
            coordinator.mount_coalesced_into(host)
        } else {
            coordinator.mount_into(host)
        };
        match mounted.context("host rejected a transaction")? {
            Some(revision) => host.print_revision(revision),
            None => return Ok(()),
        }
    }
}
