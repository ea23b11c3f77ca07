use quizfield_engine::{
    resolve_app_paths, AppPaths, AudioService, ImageStore, LoopConfig, Scene, SilentAudio,
    StartupError,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::data::Registries;
use crate::field::FieldController;
use crate::orchestrator::SceneOrchestrator;
use crate::save::JsonSaveStore;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) audio: Box<dyn AudioService>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Quizfield Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "project_root_resolved");

    let registries = Registries::load(&paths.data_dir);
    let config = LoopConfig {
        window_title: registries.game.title.clone(),
        ..LoopConfig::default()
    };
    let mut images = ImageStore::new(paths.image_dir.clone());
    FieldController::install_sprite_fallbacks(&mut images);
    let save_store = JsonSaveStore::new(paths.save_path.clone());
    let scene = SceneOrchestrator::new(
        registries,
        images,
        save_store,
        config.logical_width,
        config.logical_height,
    );

    Ok(AppWiring {
        config,
        scene: Box::new(scene),
        audio: build_audio(&paths),
    })
}

#[cfg(feature = "audio")]
fn build_audio(paths: &AppPaths) -> Box<dyn AudioService> {
    match quizfield_engine::RodioAudio::new(paths.sounds_dir.clone()) {
        Some(audio) => Box::new(audio),
        None => Box::new(SilentAudio::new()),
    }
}

#[cfg(not(feature = "audio"))]
fn build_audio(paths: &AppPaths) -> Box<dyn AudioService> {
    info!(sounds_dir = %paths.sounds_dir.display(), "audio_disabled_silent_backend");
    Box::new(SilentAudio::new())
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
