use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use tracing::{debug, warn};

/// Plays the configured detail-entry sound through the platform audio
/// player. Fire and forget: spawns a detached thread, never blocks the UI,
/// and only logs on failure.
pub fn play_entry_sound(path: Option<&Path>) {
    let Some(path) = path else {
        debug!("no entry sound configured");
        return;
    };
    let path = path.to_path_buf();

    thread::spawn(move || {
        if let Err(err) = spawn_player(&path) {
            warn!("failed to play entry sound '{}': {err}", path.display());
        }
    });
}

#[cfg(target_os = "windows")]
fn spawn_player(path: &PathBuf) -> std::io::Result<()> {
    Command::new("cmd")
        .args(["/C", "start", "", &path.to_string_lossy()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn spawn_player(path: &PathBuf) -> std::io::Result<()> {
    Command::new("afplay")
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn spawn_player(path: &PathBuf) -> std::io::Result<()> {
    Command::new("paplay")
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}
