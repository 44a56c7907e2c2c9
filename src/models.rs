use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::GenerateError;

/// Fixed prefix of the firmware-facing directory key.
pub const CHARACTER_DIR_PREFIX: &str = "02190530";
/// Fixed suffix of the firmware-facing directory key.
pub const CHARACTER_DIR_SUFFIX: &str = "00";
/// Extension of a playable unit on the device.
pub const FABA_EXTENSION: &str = "faba";
/// Name of the manifest file inside a playlist directory.
pub const MANIFEST_FILE: &str = "info";
/// Two-digit sequence numbers cap a playlist at 100 tracks.
pub const MAX_TRACKS: u32 = 100;

/// A four-digit playlist identifier. Kept as a string, `0190` and `190` differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn parse(raw: &str) -> Result<Self, GenerateError> {
        if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(GenerateError::InvalidId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `K{id}`, the playlist directory name.
    pub fn directory_name(&self) -> String {
        format!("K{}", self.0)
    }

    /// `02190530{id}00`, opaque key the firmware matches against the tag.
    pub fn character_dir(&self) -> String {
        format!("{}{}{}", CHARACTER_DIR_PREFIX, self.0, CHARACTER_DIR_SUFFIX)
    }

    /// Recovers the id from a `K{id}` directory name.
    pub fn from_directory_name(name: &str) -> Result<Self, GenerateError> {
        match name.strip_prefix('K') {
            Some(rest) => Self::parse(rest),
            None => Err(GenerateError::InvalidId(name.to_string())),
        }
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlaylistId {
    type Error = GenerateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlaylistId> for String {
    fn from(id: PlaylistId) -> Self {
        id.0
    }
}

/// One input audio file, positioned by the lexicographic order of its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub source_path: PathBuf,
    pub ordinal: usize,
}

impl Track {
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// A finalized track inside the playlist directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistEntry {
    pub sequence_number: u32,
    pub file_name: String,
    pub embedded_title: String,
}

impl PlaylistEntry {
    pub fn new(id: &PlaylistId, sequence_number: u32) -> Self {
        Self {
            sequence_number,
            file_name: faba_file_name(sequence_number),
            embedded_title: embedded_title(id, sequence_number),
        }
    }
}

/// `NN.faba` for a zero-based sequence number.
pub fn faba_file_name(sequence_number: u32) -> String {
    format!("{:02}.{}", sequence_number, FABA_EXTENSION)
}

/// `K{id}CP{NN}` where `NN` is the one-based track number.
pub fn embedded_title(id: &PlaylistId, sequence_number: u32) -> String {
    format!("K{}CP{:02}", id, sequence_number + 1)
}

/// Parses `NN.faba` back into its sequence number. Anything else is not a track.
pub fn parse_faba_file_name(name: &str) -> Option<u32> {
    let stem = name.strip_suffix(".faba")?;
    if stem.len() == 2 && stem.bytes().all(|b| b.is_ascii_digit()) {
        stem.parse().ok()
    } else {
        None
    }
}

/// What the firmware reads from `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub total_tracks: u32,
    pub character_dir: String,
}

impl Manifest {
    pub fn new(id: &PlaylistId, total_tracks: u32) -> Self {
        Self {
            total_tracks,
            character_dir: id.character_dir(),
        }
    }
}

/// A playlist as laid out under `<source_folder>/K{id}`.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: PlaylistId,
    pub directory: PathBuf,
    pub tracks: Vec<PlaylistEntry>,
}

impl Playlist {
    pub fn new(source_folder: &Path, id: PlaylistId) -> Self {
        let directory = source_folder.join(id.directory_name());
        Self {
            id,
            directory,
            tracks: Vec::new(),
        }
    }

    pub fn character_dir(&self) -> String {
        self.id.character_dir()
    }
}
