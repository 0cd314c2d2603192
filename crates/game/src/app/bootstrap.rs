use engine::{resolve_app_paths, AssetStore, LoopConfig, MetricsHandle, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_config, ConfigError};
use super::gameplay::{ArtError, Bastion, FRAME_HEIGHT, FRAME_WIDTH};
use super::scores::ScoreBoard;

const CONFIG_FILE: &str = "game.json";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to prepare art: {0}")]
    Art(#[from] ArtError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) game: Bastion,
    pub(crate) metrics: MetricsHandle,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Bastion Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        assets = %paths.assets_dir.display(),
        "app_paths_resolved"
    );
    let rules = load_config(&paths.assets_dir.join(CONFIG_FILE))?;

    let mut store = AssetStore::new(&paths.assets_dir);
    let scores = ScoreBoard::new(&paths.cache_dir);
    let metrics = MetricsHandle::default();
    let game = Bastion::new(rules, &mut store, scores, metrics.clone())?;

    let config = LoopConfig {
        framebuffer_width: FRAME_WIDTH,
        framebuffer_height: FRAME_HEIGHT,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        game,
        metrics,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
