use anyhow::{Context, Result};
use log::{error, info};
use std::path::Path;

use crate::config::Config;
use crate::error::GenerateError;
use crate::generator::Generator;
use crate::metadata::LoftyTagEditor;
use crate::models::{Manifest, PlaylistId};
use crate::tag_text::{encode_record, tag_text, to_hex};
use crate::verify::verify_playlist;

/// How a command ended, mapped to the process exit code by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    /// The playlist was written but some tracks were skipped.
    Partial,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Failed => 1,
            Outcome::Partial => 2,
        }
    }
}

pub fn generate(
    config: &Config,
    source_folder: &Path,
    playlist_id: &str,
    start_offset: u32,
    dry_run: bool,
) -> Result<Outcome> {
    let editor = LoftyTagEditor;
    let generator = Generator::new(&editor, config.extension.clone());

    let run = match generator.validate(source_folder, playlist_id, start_offset) {
        Ok(run) => run,
        Err(e) => {
            error!("{}", e);
            return Ok(Outcome::Failed);
        }
    };

    if dry_run {
        println!("Dry run, nothing will be written.");
        println!(
            "Target: {} (characterDir {})",
            run.playlist.directory.display(),
            run.playlist.character_dir()
        );
        for planned in generator.plan(&run) {
            println!(
                "  {} -> {} (title {})",
                planned.track.file_name(),
                planned.entry.file_name,
                planned.entry.embedded_title
            );
        }
        let total = run.existing_tracks + run.sources.len() as u32;
        let manifest = Manifest::new(&run.playlist.id, total);
        println!("  info: {}", serde_json::to_string(&manifest)?);
        return Ok(Outcome::Success);
    }

    let report = match generator.execute(run) {
        Ok(report) => report,
        Err(e @ GenerateError::ManifestWrite { .. }) => {
            error!("{}", e);
            error!("The playlist directory has no valid manifest and will not play; fix the cause and re-run with the current track count as offset.");
            return Ok(Outcome::Failed);
        }
        Err(e) => {
            error!("{}", e);
            return Ok(Outcome::Failed);
        }
    };

    println!(
        "Playlist {} in {} ({} existing, {} added)",
        report.playlist.id,
        report.playlist.directory.display(),
        report.existing_tracks,
        report.added().len()
    );
    for entry in report.added() {
        println!("  {} ({})", entry.file_name, entry.embedded_title);
    }
    println!("  info: {}", serde_json::to_string(&report.manifest)?);

    if report.is_complete() {
        info!("Added {} track(s)", report.added().len());
        Ok(Outcome::Success)
    } else {
        for failure in &report.skipped {
            println!("  skipped {}: {}", failure.source_path.display(), failure.error);
        }
        Ok(Outcome::Partial)
    }
}

pub fn verify(dir: &Path) -> Result<Outcome> {
    let report = verify_playlist(&LoftyTagEditor, dir)
        .with_context(|| format!("Failed to verify {}", dir.display()))?;

    for track in &report.tracks {
        println!(
            "  {} title {}",
            track.entry.file_name,
            track.title.as_deref().unwrap_or("<none>")
        );
    }
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for problem in &report.problems {
        println!("problem: {}", problem);
    }

    if report.is_ok() {
        println!("{} is a valid playlist ({} tracks)", dir.display(), report.tracks.len());
        Ok(Outcome::Success)
    } else {
        Ok(Outcome::Failed)
    }
}

pub fn show_tag_text(playlist_id: &str) -> Result<Outcome> {
    let id = PlaylistId::parse(playlist_id)?;
    println!("text:   {}", tag_text(&id));
    println!("record: {}", to_hex(&encode_record(&id)));
    Ok(Outcome::Success)
}
