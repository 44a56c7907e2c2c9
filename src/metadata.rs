use anyhow::{bail, Context, Result};
use lofty::config::WriteOptions;
use lofty::file::{FileType, TaggedFile};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::path::Path;

/// Tag editing capability the generator depends on.
pub trait TagEditor {
    /// Fails when this editor cannot handle files with `extension`.
    fn check_support(&self, extension: &str) -> Result<()>;

    /// Removes every embedded tag, then writes `title` as the only field.
    fn normalize(&self, path: &Path, title: &str) -> Result<()>;

    /// Reads back the embedded title, if any.
    fn read_title(&self, path: &Path) -> Result<Option<String>>;

    /// Number of tags embedded in the file.
    fn tag_count(&self, path: &Path) -> Result<usize>;
}

/// [`TagEditor`] backed by lofty.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagEditor;

impl TagEditor for LoftyTagEditor {
    fn check_support(&self, extension: &str) -> Result<()> {
        match FileType::from_ext(extension) {
            Some(_) => Ok(()),
            None => bail!("lofty has no reader for .{extension} files"),
        }
    }

    fn normalize(&self, path: &Path, title: &str) -> Result<()> {
        strip_tags(path)?;
        write_title(path, title)
    }

    fn read_title(&self, path: &Path) -> Result<Option<String>> {
        read_title(path)
    }

    fn tag_count(&self, path: &Path) -> Result<usize> {
        tag_count(path)
    }
}

/// Opens `path` by sniffing its content. `NN.faba` carries no usable extension.
fn read_tagged(path: &Path) -> Result<TaggedFile> {
    Probe::open(path)
        .context("Failed to open file")?
        .guess_file_type()
        .context("Failed to read file")?
        .read()
        .context("Failed to read file")
}

/// Drops all tags (including artwork and comments) from the file.
pub fn strip_tags<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let tagged_file = read_tagged(path)?;

    for tag in tagged_file.tags() {
        tag.tag_type()
            .remove_from_path(path)
            .with_context(|| format!("Failed to remove {:?} tag", tag.tag_type()))?;
    }

    Ok(())
}

/// Writes a fresh primary tag holding only the title.
pub fn write_title<P: AsRef<Path>>(path: P, title: &str) -> Result<()> {
    let path = path.as_ref();
    let tagged_file = read_tagged(path).context("Failed to read file for writing")?;

    let mut tag = Tag::new(tagged_file.primary_tag_type());
    tag.set_title(title.to_string());

    tag.save_to_path(path, WriteOptions::default())
        .context("Failed to save tags to disk")?;

    Ok(())
}

/// Reads the title from the primary tag, falling back to the first tag found.
pub fn read_title<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let tagged_file = read_tagged(path.as_ref())?;
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    Ok(tag.and_then(|t| t.title().map(|title| title.to_string())))
}

/// Number of tags currently embedded in the file.
pub fn tag_count<P: AsRef<Path>>(path: P) -> Result<usize> {
    let tagged_file = read_tagged(path.as_ref())?;
    Ok(tagged_file.tags().len())
}
