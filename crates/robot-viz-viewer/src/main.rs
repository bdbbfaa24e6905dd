//! robot-viz command-line viewer

use std::path::PathBuf;

use clap::Parser as _;
use robot_viz::scene::Scene;
use robot_viz_core::LoadOptions;
use robot_viz_viewer::{ConfigManager, RobotSession, ViewerError, ViewerOptions};

/// View a URDF robot, pose it with joint sliders and play back trajectories.
#[derive(Debug, clap::Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the URDF file
    urdf: PathBuf,

    /// Initial joint values in radians (or meters), one per actuated joint
    #[arg(long, num_args = 1.., allow_negative_numbers = true)]
    q: Vec<f64>,

    /// End-effector link for markers and paths
    #[arg(long, value_name = "LINK")]
    ee: Option<String>,

    /// JSON trajectory to play back on start
    #[arg(long, value_name = "FILE")]
    trajectory: Option<PathBuf>,

    /// RON configuration file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Additional directories searched for `package://` meshes
    #[arg(long = "package-path", value_name = "DIR")]
    package_paths: Vec<PathBuf>,

    /// Hide the world axes
    #[arg(long = "no-axes", default_value_t = false)]
    no_axes: bool,
}

fn main() -> Result<(), ViewerError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "robot_viz=info,robot_viz_viewer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!("Starting robot-viz");

    let manager = match &args.config {
        Some(path) => ConfigManager::open(path),
        None => ConfigManager::new(),
    };
    let mut config = manager.config().clone();
    if args.ee.is_some() {
        config.ee_link = args.ee.clone();
    }
    if args.no_axes {
        config.show_world_axes = false;
    }

    let load = LoadOptions {
        package_paths: args.package_paths.clone(),
        ..Default::default()
    };

    let mut scene = Scene::new();
    let options = ViewerOptions {
        title: format!("robot-viz - {}", args.urdf.display()),
        ..ViewerOptions::from(&config)
    };
    let mut session = RobotSession::new(&mut scene, &args.urdf, config, load)?;

    if !args.q.is_empty() {
        session.set_configuration(&mut scene, &args.q)?;
    }
    if let Some(path) = &args.trajectory {
        session.load_trajectory(path)?;
    }

    robot_viz_viewer::run(scene, session, options)
}
