use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `text` next to `path` first and renames it into place, so a crash
/// mid-write never leaves a truncated file behind.
pub fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path_for(path);
    if let Err(error) = fs::write(&staging, text.as_bytes()) {
        discard(&staging);
        return Err(error);
    }
    fs::rename(&staging, path).inspect_err(|_| discard(&staging))
}

fn discard(staging: &Path) {
    match fs::remove_file(staging) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            tracing::warn!(path = %staging.display(), error = %error, "staging_cleanup_failed");
        }
    }
}

fn staging_path_for(path: &Path) -> PathBuf {
    let mut staged_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "document".into());
    staged_name.push(".tmp");
    path.with_file_name(staged_name)
}
