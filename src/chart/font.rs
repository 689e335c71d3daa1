use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use plotters::style::{FontStyle, register_font};

use crate::prelude::*;

pub const FAMILY: &str = "sans-serif";

const WELL_KNOWN_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<bool> = OnceLock::new();

/// Register the chart font once per process.
///
/// Returns whether text can be rendered.
pub fn try_register(explicit: Option<&Path>) -> bool {
    *REGISTERED.get_or_init(|| match register(explicit) {
        Ok(path) => {
            debug!(path = %path.display(), "registered the chart font");
            true
        }
        Err(error) => {
            warn!("rendering the charts without text: {error:#}");
            false
        }
    })
}

fn register(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => WELL_KNOWN_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
            .context("no system font found, set `--chart-font` to a TrueType font")?,
    };
    let bytes = fs::read(&path)
        .with_context(|| format!("failed to read the font `{}`", path.display()))?;

    // Registered fonts must outlive every chart.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    for style in [FontStyle::Normal, FontStyle::Bold] {
        register_font(FAMILY, style, bytes)
            .map_err(|_| anyhow!("invalid font `{}`", path.display()))?;
    }
    Ok(path)
}
