//! Document sources and `.desc` descriptor files.
//!
//! A `.desc` file holds a little-endian `u64` descriptor count followed by
//! that many descriptors of `DESCRIPTOR_DIM` little-endian `f32` each. The
//! descriptor files of a source live next to the list or scene file.
use std::fs;
use std::path::{Path, PathBuf};

use voctree_core::error::{Error, Result};
use voctree_core::types::{Descriptor, DESCRIPTOR_DIM};

use crate::scene::SceneDescription;

const DESCRIPTOR_BYTES: usize = DESCRIPTOR_DIM * 4;

/// How a document source lists its images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain text, one image per line (bundler style `list.txt`).
    ImageList,
    /// `sfm_data.json` scene description.
    SceneDescription,
}

impl SourceKind {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::SceneDescription,
            _ => Self::ImageList,
        }
    }
}

/// The ordered descriptor files of a corpus or query set.
///
/// Position in `files` is the document id.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub path: PathBuf,
    pub kind: SourceKind,
    files: Vec<PathBuf>,
}

impl DocumentSource {
    pub fn open(path: &Path) -> Result<Self> {
        let kind = SourceKind::of(path);
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let files = match kind {
            SourceKind::ImageList => {
                let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                list_descriptor_files(&base, &content)
            }
            SourceKind::SceneDescription => SceneDescription::load(path)?
                .views()
                .map(|v| base.join(format!("{}.desc", v.id)))
                .collect(),
        };
        tracing::debug!(source = %path.display(), documents = files.len(), "document source opened");
        Ok(Self { path: path.to_path_buf(), kind, files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn descriptor_files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Descriptor sets in document order, read lazily one file at a time.
    pub fn documents(&self) -> impl Iterator<Item = Result<Vec<Descriptor>>> + '_ {
        self.files.iter().map(|f| read_descriptors(f))
    }
}

fn list_descriptor_files(base: &Path, content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(|image| {
            let stem = Path::new(image).file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            base.join(format!("{}.desc", stem))
        })
        .collect()
}

pub fn read_descriptors(path: &Path) -> Result<Vec<Descriptor>> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    if bytes.len() < 8 {
        return Err(Error::parse(path, "missing descriptor count header"));
    }
    let (header, body) = bytes.split_at(8);
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(header);
    let count = u64::from_le_bytes(count_bytes);
    let expected = usize::try_from(count).ok().and_then(|c| c.checked_mul(DESCRIPTOR_BYTES));
    if expected != Some(body.len()) {
        return Err(Error::parse(
            path,
            format!("header announces {} descriptors but {} bytes follow", count, body.len()),
        ));
    }
    Ok(body
        .chunks_exact(DESCRIPTOR_BYTES)
        .map(|chunk| {
            let mut descriptor = [0f32; DESCRIPTOR_DIM];
            for (value, b) in descriptor.iter_mut().zip(chunk.chunks_exact(4)) {
                *value = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
            }
            descriptor
        })
        .collect())
}

pub fn write_descriptors(path: &Path, descriptors: &[Descriptor]) -> Result<()> {
    let mut bytes = Vec::with_capacity(8 + descriptors.len() * DESCRIPTOR_BYTES);
    bytes.extend_from_slice(&(descriptors.len() as u64).to_le_bytes());
    for descriptor in descriptors {
        for value in descriptor {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    fs::write(path, bytes).map_err(|e| Error::io(path, e))
}
