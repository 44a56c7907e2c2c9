//! Turns a folder of audio files into a `K{id}` playlist directory.
//!
//! A run goes through four stages: validation (read only), staging copies
//! into the target directory, normalizing and renaming each copy to
//! `NN.faba`, and finally rewriting the `info` manifest from what is
//! actually on disk. Once staging starts, a failing track is skipped and
//! reported rather than aborting the run.

use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GenerateError, Result};
use crate::manifest::write_manifest;
use crate::metadata::TagEditor;
use crate::models::{parse_faba_file_name, Manifest, Playlist, PlaylistEntry, PlaylistId, Track, FABA_EXTENSION, MAX_TRACKS};

/// Everything validation learned before touching the disk.
#[derive(Debug, Clone)]
pub struct ValidatedRun {
    pub playlist: Playlist,
    pub sources: Vec<Track>,
    pub existing_tracks: u32,
}

/// A source file and the slot it will take if it succeeds.
#[derive(Debug, Clone)]
pub struct PlannedTrack {
    pub track: Track,
    pub entry: PlaylistEntry,
}

#[derive(Debug)]
pub struct TrackFailure {
    pub source_path: PathBuf,
    pub error: GenerateError,
}

#[derive(Debug)]
pub struct GenerateReport {
    pub playlist: Playlist,
    pub existing_tracks: u32,
    pub skipped: Vec<TrackFailure>,
    pub manifest: Manifest,
}

impl GenerateReport {
    /// Entries added by this run, in sequence order.
    pub fn added(&self) -> &[PlaylistEntry] {
        &self.playlist.tracks
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub struct Generator<'a, E: TagEditor> {
    editor: &'a E,
    extension: String,
}

impl<'a, E: TagEditor> Generator<'a, E> {
    pub fn new(editor: &'a E, extension: impl Into<String>) -> Self {
        Self {
            editor,
            extension: extension.into(),
        }
    }

    /// Checks every precondition of a run. Never writes to disk.
    pub fn validate(&self, source_folder: &Path, id: &str, start_offset: u32) -> Result<ValidatedRun> {
        let id = PlaylistId::parse(id)?;

        self.editor
            .check_support(&self.extension)
            .map_err(|e| GenerateError::MissingDependency {
                extension: self.extension.clone(),
                reason: format!("{:#}", e),
            })?;

        let sources = list_sources(source_folder, &self.extension)?;
        if sources.is_empty() {
            return Err(GenerateError::EmptySource {
                folder: source_folder.to_path_buf(),
                extension: self.extension.clone(),
            });
        }

        let playlist = Playlist::new(source_folder, id);
        let existing_tracks = count_tracks(&playlist.directory)?;
        if existing_tracks != start_offset {
            return Err(GenerateError::OffsetMismatch {
                dir: playlist.directory.clone(),
                requested: start_offset,
                on_disk: existing_tracks,
            });
        }

        let new = sources.len() as u32;
        if existing_tracks + new > MAX_TRACKS {
            return Err(GenerateError::TooManyTracks {
                existing: existing_tracks,
                new,
                max: MAX_TRACKS,
            });
        }

        Ok(ValidatedRun {
            playlist,
            sources,
            existing_tracks,
        })
    }

    /// The renumbering a run would perform if every track succeeds.
    pub fn plan(&self, run: &ValidatedRun) -> Vec<PlannedTrack> {
        run.sources
            .iter()
            .enumerate()
            .map(|(i, track)| PlannedTrack {
                track: track.clone(),
                entry: PlaylistEntry::new(&run.playlist.id, run.existing_tracks + i as u32),
            })
            .collect()
    }

    pub fn generate(&self, source_folder: &Path, id: &str, start_offset: u32) -> Result<GenerateReport> {
        let run = self.validate(source_folder, id, start_offset)?;
        self.execute(run)
    }

    /// Stages, normalizes and renames every source, then rewrites the manifest.
    pub fn execute(&self, run: ValidatedRun) -> Result<GenerateReport> {
        let ValidatedRun {
            mut playlist,
            sources,
            existing_tracks,
        } = run;
        let dir = playlist.directory.clone();

        fs::create_dir_all(&dir).map_err(|e| GenerateError::io(&dir, e))?;
        info!(
            "{} playlist {} in {} ({} existing track(s), {} new)",
            if existing_tracks == 0 { "Creating" } else { "Appending to" },
            playlist.id,
            dir.display(),
            existing_tracks,
            sources.len()
        );

        let mut skipped = Vec::new();
        let staged = stage(&dir, &sources, &mut skipped);

        let mut next = existing_tracks;
        for (track, staged_path) in staged {
            let entry = PlaylistEntry::new(&playlist.id, next);
            match self.finalize(&dir, &staged_path, &entry) {
                Ok(()) => {
                    info!(
                        "{} -> {} (title {})",
                        track.file_name(),
                        entry.file_name,
                        entry.embedded_title
                    );
                    playlist.tracks.push(entry);
                    next += 1;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", track.file_name(), e);
                    discard(&staged_path);
                    skipped.push(TrackFailure {
                        source_path: track.source_path,
                        error: e,
                    });
                }
            }
        }

        let total_tracks = count_faba_files(&dir)?;
        let manifest = Manifest::new(&playlist.id, total_tracks);
        let manifest_path = write_manifest(&dir, &manifest).inspect_err(|e| error!("{}", e))?;
        info!(
            "Wrote {}: totalTracks={} characterDir={}",
            manifest_path.display(),
            manifest.total_tracks,
            manifest.character_dir
        );

        Ok(GenerateReport {
            playlist,
            existing_tracks,
            skipped,
            manifest,
        })
    }

    /// Normalizes one staged copy in place and moves it to its `NN.faba` slot.
    pub fn finalize(&self, dir: &Path, staged_path: &Path, entry: &PlaylistEntry) -> Result<()> {
        self.editor
            .normalize(staged_path, &entry.embedded_title)
            .map_err(|source| GenerateError::Metadata {
                path: staged_path.to_path_buf(),
                source,
            })?;

        let target = dir.join(&entry.file_name);
        if staged_path != target.as_path() {
            fs::rename(staged_path, &target).map_err(|e| GenerateError::io(&target, e))?;
        }
        Ok(())
    }
}

/// Regular files in `folder` with `extension`, in lexicographic name order.
pub fn list_sources(folder: &Path, extension: &str) -> Result<Vec<Track>> {
    let entries = fs::read_dir(folder).map_err(|e| GenerateError::io(folder, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| GenerateError::io(folder, e))?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(ordinal, source_path)| Track { source_path, ordinal })
        .collect())
}

/// Counts the tracks already in `dir`, which must be exactly `00.faba..NN.faba`.
///
/// A missing directory holds zero tracks.
pub fn count_tracks(dir: &Path) -> Result<u32> {
    if !dir.exists() {
        return Ok(0);
    }

    let corrupt = |reason: String| GenerateError::CorruptPlaylist {
        dir: dir.to_path_buf(),
        reason,
    };

    let mut numbers = Vec::new();
    for name in faba_names(dir)? {
        match parse_faba_file_name(&name) {
            Some(n) => numbers.push(n),
            None => return Err(corrupt(format!("unexpected track file {}", name))),
        }
    }
    numbers.sort_unstable();

    for (expected, found) in numbers.iter().enumerate() {
        if *found != expected as u32 {
            return Err(corrupt(format!("{:02}.{} is missing", expected, FABA_EXTENSION)));
        }
    }

    Ok(numbers.len() as u32)
}

fn count_faba_files(dir: &Path) -> Result<u32> {
    Ok(faba_names(dir)?.len() as u32)
}

fn faba_names(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| GenerateError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| GenerateError::io(dir, e))?.path();
        let is_faba = path.extension().is_some_and(|ext| ext == FABA_EXTENSION);
        if is_faba && path.is_file() {
            if let Some(name) = path.file_name() {
                names.push(name.to_string_lossy().to_string());
            }
        }
    }
    Ok(names)
}

/// Copies every source into `dir` under its original name.
///
/// Copies that fail are recorded in `skipped` and left out of the result.
fn stage(dir: &Path, sources: &[Track], skipped: &mut Vec<TrackFailure>) -> Vec<(Track, PathBuf)> {
    let mut staged = Vec::with_capacity(sources.len());
    for track in sources {
        let target = dir.join(track.file_name());
        match fs::copy(&track.source_path, &target) {
            Ok(bytes) => {
                debug!("Staged {} ({} bytes)", target.display(), bytes);
                staged.push((track.clone(), target));
            }
            Err(e) => {
                warn!("Failed to copy {}: {}", track.source_path.display(), e);
                discard(&target);
                skipped.push(TrackFailure {
                    source_path: track.source_path.clone(),
                    error: GenerateError::io(&target, e),
                });
            }
        }
    }
    staged
}

fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove leftover {}: {}", path.display(), e);
        }
    }
}
