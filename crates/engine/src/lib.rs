use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;

pub use app::{
    run_app, AppError, AudioService, Canvas, FrameCanvas, InputAction, InputSampler,
    InputSnapshot, LoopConfig, PixelImage, Renderer, Rgba, Scene, SceneCommand, ScreenRect,
    SilentAudio, TextStyle, DEFAULT_TEXT_SCALE, GLYPH_ADVANCE, LINE_ADVANCE, TEXT_BLOCK_PADDING,
};
#[cfg(feature = "audio")]
pub use app::RodioAudio;
pub use content::{
    load_json_document, load_json_document_or_default, parse_json_document, write_text_atomic,
    ContentErrorCode, ContentLoadError, ImageStore,
};

pub const ROOT_ENV_VAR: &str = "QUIZFIELD_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub data_dir: PathBuf,
    pub image_dir: PathBuf,
    pub sounds_dir: PathBuf,
    pub save_path: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets_dir = root.join("assets");
        let data_dir = assets_dir.join("data");
        let image_dir = assets_dir.join("img");
        let sounds_dir = assets_dir.join("sounds");
        let save_path = root.join("saves").join("save.json");
        Self {
            root,
            assets_dir,
            data_dir,
            image_dir,
            sounds_dir,
            save_path,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "QUIZFIELD_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/quizfield\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    resolve_root().map(AppPaths::from_root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn repo_marker_accepts_cargo_toml_with_assets() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        assert!(!is_repo_marker(temp.path()));
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn derived_paths_hang_off_root() {
        let paths = AppPaths::from_root(PathBuf::from("/tmp/qf"));
        assert_eq!(paths.assets_dir, PathBuf::from("/tmp/qf/assets"));
        assert_eq!(paths.data_dir, PathBuf::from("/tmp/qf/assets/data"));
        assert_eq!(paths.image_dir, PathBuf::from("/tmp/qf/assets/img"));
        assert_eq!(paths.save_path, PathBuf::from("/tmp/qf/saves/save.json"));
    }
}
