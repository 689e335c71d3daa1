use std::{
    path::Path,
    process::{Command, Stdio},
};

use crate::prelude::*;

/// Open the image with the platform viewer.
///
/// The image is already saved, so a missing or failing viewer is only a warning.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn open(path: &Path) {
    println!("Opening graph for display...");
    let Some(mut command) = viewer(path) else {
        warn!(os = std::env::consts::OS, "no viewer is known for this platform");
        return;
    };
    match command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped()).output() {
        Ok(output) if output.status.success() => {
            debug!("opened");
        }
        Ok(output) => {
            warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "the viewer failed",
            );
        }
        Err(error) => {
            warn!("failed to start the viewer: {error:#}");
        }
    }
}

fn viewer(path: &Path) -> Option<Command> {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        Some(command)
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        Some(command)
    } else if cfg!(unix) {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        Some(command)
    } else {
        None
    }
}
