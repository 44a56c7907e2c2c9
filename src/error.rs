use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid playlist id {0:?}: expected exactly 4 digits")]
    InvalidId(String),

    #[error("no .{extension} files found in {}", folder.display())]
    EmptySource { folder: PathBuf, extension: String },

    #[error("cannot edit tags of .{extension} files: {reason}")]
    MissingDependency { extension: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rewrite metadata of {}: {source:#}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write manifest {}: {reason}", path.display())]
    ManifestWrite { path: PathBuf, reason: String },

    #[error("start offset {requested} does not match the {on_disk} track(s) already in {}", dir.display())]
    OffsetMismatch {
        dir: PathBuf,
        requested: u32,
        on_disk: u32,
    },

    #[error("{} is not a contiguous playlist: {reason}", dir.display())]
    CorruptPlaylist { dir: PathBuf, reason: String },

    #[error("{existing} existing + {new} new tracks exceeds the {max} track limit")]
    TooManyTracks { existing: u32, new: u32, max: u32 },
}

impl GenerateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Validation errors are raised before anything on disk is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidId(_)
                | Self::EmptySource { .. }
                | Self::MissingDependency { .. }
                | Self::OffsetMismatch { .. }
                | Self::CorruptPlaylist { .. }
                | Self::TooManyTracks { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
