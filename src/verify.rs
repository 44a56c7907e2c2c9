use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GenerateError, Result};
use crate::generator::count_tracks;
use crate::manifest::read_manifest;
use crate::metadata::TagEditor;
use crate::models::{PlaylistEntry, PlaylistId};

#[derive(Debug, Clone)]
pub struct VerifiedTrack {
    pub entry: PlaylistEntry,
    pub title: Option<String>,
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub dir: PathBuf,
    pub id: Option<PlaylistId>,
    pub tracks: Vec<VerifiedTrack>,
    /// Anything the firmware would trip over.
    pub problems: Vec<String>,
    /// Cosmetic issues, such as a stale embedded title.
    pub warnings: Vec<String>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Checks a `K{id}` directory the way the device will read it.
pub fn verify_playlist<E: TagEditor>(editor: &E, dir: &Path) -> Result<VerifyReport> {
    if !dir.is_dir() {
        return Err(GenerateError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut report = VerifyReport {
        dir: dir.to_path_buf(),
        ..Default::default()
    };

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    report.id = match PlaylistId::from_directory_name(&name) {
        Ok(id) => Some(id),
        Err(_) => {
            report.problems.push(format!("{name:?} is not a K<4 digits> directory name"));
            None
        }
    };

    let count = match count_tracks(dir) {
        Ok(count) => Some(count),
        Err(e @ GenerateError::CorruptPlaylist { .. }) => {
            report.problems.push(e.to_string());
            None
        }
        Err(e) => return Err(e),
    };

    match read_manifest(dir) {
        Ok(manifest) => {
            debug!("Manifest: {:?}", manifest);
            if let Some(count) = count {
                if manifest.total_tracks != count {
                    report.problems.push(format!(
                        "manifest says totalTracks={} but {} track file(s) exist",
                        manifest.total_tracks, count
                    ));
                }
            }
            if let Some(id) = &report.id {
                if manifest.character_dir != id.character_dir() {
                    report.problems.push(format!(
                        "manifest characterDir {} does not match {}",
                        manifest.character_dir,
                        id.character_dir()
                    ));
                }
            }
        }
        Err(e) => report.problems.push(format!("{:#}", e)),
    }

    if let (Some(id), Some(count)) = (report.id.clone(), count) {
        for n in 0..count {
            let entry = PlaylistEntry::new(&id, n);
            let path = dir.join(&entry.file_name);
            let title = match editor.read_title(&path) {
                Ok(title) => title,
                Err(e) => {
                    report.warnings.push(format!("{}: {:#}", entry.file_name, e));
                    None
                }
            };
            if let Ok(tags) = editor.tag_count(&path) {
                if tags > 1 {
                    report.warnings.push(format!(
                        "{} carries {} tags, expected only the title tag",
                        entry.file_name, tags
                    ));
                }
            }
            if title.as_deref() != Some(entry.embedded_title.as_str()) {
                report.warnings.push(format!(
                    "{} has title {:?}, expected {}",
                    entry.file_name, title, entry.embedded_title
                ));
            }
            report.tracks.push(VerifiedTrack { entry, title });
        }
    }

    let leftovers = stray_files(dir)?;
    for name in leftovers {
        report.warnings.push(format!("unexpected file {}", name));
    }

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    Ok(report)
}

/// Files other than tracks and the manifest, e.g. staged copies left by an interrupted run.
fn stray_files(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| GenerateError::io(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GenerateError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name != crate::models::MANIFEST_FILE && crate::models::parse_faba_file_name(&name).is_none() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::tests::FakeEditor;
    use crate::generator::Generator;
    use crate::manifest::write_manifest;
    use crate::models::Manifest;
    use anyhow::Result as AnyResult;
    use tempfile::TempDir;

    /// Reports the title each track would have had if it was normalized correctly.
    struct NamingEditor;

    impl TagEditor for NamingEditor {
        fn check_support(&self, _extension: &str) -> AnyResult<()> {
            Ok(())
        }

        fn normalize(&self, _path: &Path, _title: &str) -> AnyResult<()> {
            Ok(())
        }

        fn read_title(&self, path: &Path) -> AnyResult<Option<String>> {
            let dir = path.parent().unwrap().file_name().unwrap().to_string_lossy().to_string();
            let id = PlaylistId::from_directory_name(&dir)?;
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let n = crate::models::parse_faba_file_name(&name).unwrap();
            Ok(Some(crate::models::embedded_title(&id, n)))
        }

        fn tag_count(&self, path: &Path) -> AnyResult<usize> {
            // K0042/01.faba pretends to have a leftover tag.
            Ok(if path.ends_with("K0042/01.faba") { 2 } else { 1 })
        }
    }

    #[test]
    fn generated_playlist_verifies() {
        let src = TempDir::new().unwrap();
        for name in ["a.mp3", "b.mp3"] {
            fs::write(src.path().join(name), "x").unwrap();
        }
        Generator::new(&FakeEditor::default(), "mp3")
            .generate(src.path(), "1234", 0)
            .unwrap();

        let report = verify_playlist(&NamingEditor, &src.path().join("K1234")).unwrap();
        assert!(report.is_ok(), "{:?}", report.problems);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.tracks.len(), 2);
    }

    #[test]
    fn extra_tags_are_warned_about() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("K0042");
        fs::create_dir(&dir).unwrap();
        for i in 0..2 {
            fs::write(dir.join(format!("{i:02}.faba")), "").unwrap();
        }
        let id = PlaylistId::parse("0042").unwrap();
        write_manifest(&dir, &Manifest::new(&id, 2)).unwrap();

        let report = verify_playlist(&NamingEditor, &dir).unwrap();
        assert!(report.is_ok(), "{:?}", report.problems);
        assert_eq!(report.warnings, ["01.faba carries 2 tags, expected only the title tag"]);
    }

    #[test]
    fn stale_manifest_is_a_problem() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("K0190");
        fs::create_dir(&dir).unwrap();
        for i in 0..3 {
            fs::write(dir.join(format!("{i:02}.faba")), "").unwrap();
        }
        let id = PlaylistId::parse("0190").unwrap();
        write_manifest(&dir, &Manifest::new(&id, 2)).unwrap();

        let report = verify_playlist(&NamingEditor, &dir).unwrap();
        assert!(!report.is_ok());
        assert!(report.problems[0].contains("totalTracks=2"));
    }

    #[test]
    fn wrong_character_dir_and_missing_titles() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("K0190");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("00.faba"), "").unwrap();
        fs::write(dir.join("info"), r#"{"totalTracks":1,"characterDir":"02190530999900"}"#).unwrap();

        let report = verify_playlist(&FakeEditor::default(), &dir).unwrap();
        assert_eq!(report.problems.len(), 1);
        assert!(report.problems[0].contains("02190530999900"));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn bad_directory_name_and_leftovers() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("playlist");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("00.faba"), "").unwrap();
        fs::write(dir.join("song.mp3"), "").unwrap();

        let report = verify_playlist(&NamingEditor, &dir).unwrap();
        assert!(report.id.is_none());
        // Bad name plus missing manifest.
        assert_eq!(report.problems.len(), 2);
        assert_eq!(report.warnings, ["unexpected file song.mp3"]);
    }
}
