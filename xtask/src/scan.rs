//! xtask scan: list the tracks the player would find on a folder.
//!
//! Runs the firmware's own catalog scan over a local directory, so the play
//! order, the skipped entries and the limits match what the device does with
//! the same files on a USB stick.

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use library::{Catalog, LocalVolume, ScanSummary, TrackId};
use platform::MediaVolume;

pub fn run(music_dir: &Path) -> Result<()> {
    println!("Scanning: {}", music_dir.display());
    let (catalog, summary) = scan(music_dir)?;

    for line in listing(&catalog)? {
        println!("{line}");
    }
    println!();
    println!(
        "{}",
        format!(
            "{} tracks in {} folders",
            summary.tracks, summary.folders
        )
        .green()
        .bold()
    );
    if summary.skipped > 0 {
        println!(
            "{}",
            format!("⚠ {} entries over the catalog limits were skipped", summary.skipped).yellow()
        );
    }
    if summary.unreadable > 0 {
        println!(
            "{}",
            format!("⚠ {} folders could not be listed", summary.unreadable).yellow()
        );
    }
    Ok(())
}

/// Scan `music_dir` the way the player scans attached media.
pub(crate) fn scan(music_dir: &Path) -> Result<(Box<Catalog>, ScanSummary)> {
    let mut volume = LocalVolume::new(music_dir);
    if !volume.connect() {
        bail!("{} is not a directory", music_dir.display());
    }
    let mut catalog = Box::new(Catalog::new());
    let summary = catalog.scan(&mut volume);
    Ok((catalog, summary))
}

/// One line per track in play order: display number, then path.
pub(crate) fn listing(catalog: &Catalog) -> Result<Vec<String>> {
    (0..catalog.track_count())
        .filter_map(TrackId::new)
        .map(|id| {
            let path = catalog
                .track_path(id)
                .map_err(|e| anyhow::anyhow!("track {}: {e}", id.index()))?;
            Ok(format!("{:>4}  {}", id.index().saturating_add(1), path.as_str()))
        })
        .collect()
}
