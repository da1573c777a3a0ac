#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Deep Woods experience.

mod host;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use deep_woods_core::Timestamp;
use deep_woods_rendering::{Color, Presentation, RenderingBackend, Scene};
use deep_woods_rendering_macroquad::MacroquadBackend;
use deep_woods_world::{query, World};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    host::{describe_outcome, populate_scene, Autopilot, FramePacer, Session, FRAME_TARGET},
    settings::Settings,
};

/// Walk through the dark woods and find the chalice before the flashlight dies.
#[derive(Debug, Parser)]
#[command(name = "deep-woods", version)]
struct Args {
    /// TOML settings file overriding the built-in tuning.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the scenery layout and flashlight flicker; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Run without a window, steering the player automatically.
    #[arg(long)]
    headless: bool,
    /// Maximum number of frames a headless run may take.
    #[arg(long, default_value_t = 20_000)]
    frames: u64,
    /// Advance a synthetic clock instead of pacing headless frames in real time.
    #[arg(long)]
    fast: bool,
    /// Log filter directive, for example `info` or `deep_woods_world=debug`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
    /// Log the frame rate of the windowed renderer once per second.
    #[arg(long)]
    show_fps: bool,
}

/// Entry point for the Deep Woods command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let seed = args
        .seed
        .or(settings.world.seed)
        .unwrap_or_else(|| rand::thread_rng().gen());

    let world = World::generate(settings.world_config()?, seed, Timestamp::from_millis(0))
        .context("failed to place the scenery")?;
    println!("{}", query::welcome_banner(&world));
    info!(seed, "entering the woods");

    let session = Session::new(world, settings.progress_config());
    if args.headless {
        run_headless(session, args.frames, args.fast);
        Ok(())
    } else {
        run_windowed(session, args.show_fps)
    }
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn run_headless(mut session: Session, frame_limit: u64, fast: bool) {
    let mut pacer = FramePacer::new(FRAME_TARGET, fast);
    let mut autopilot = Autopilot::default();

    while !session.is_finished() && pacer.frames() < frame_limit {
        let now = pacer.begin_frame();
        let intents = autopilot.intents(session.world());
        session.step(&intents, now);
        pacer.end_frame();
    }

    let outcome = query::outcome(session.world());
    info!(
        frames = pacer.frames(),
        won = session.won(),
        batteries_left = query::batteries(session.world()).len(),
        "headless run finished: {}",
        describe_outcome(outcome)
    );
}

fn run_windowed(mut session: Session, show_fps: bool) -> Result<()> {
    let mut scene = Scene::default();
    populate_scene(session.world(), &mut scene);
    let presentation = Presentation::new(
        query::welcome_banner(session.world()),
        Color::from_rgb_u8(4, 6, 10),
        scene,
    );

    MacroquadBackend::new()
        .with_vsync(true)
        .with_show_fps(show_fps)
        .run(presentation, move |input, scene| {
            session.step(&input.intents, input.now);
            populate_scene(session.world(), scene);
            if session.is_finished() && !scene.exit_requested {
                scene.exit_requested = true;
                info!(
                    won = session.won(),
                    "run finished: {}",
                    describe_outcome(query::outcome(session.world()))
                );
            }
        })
}
