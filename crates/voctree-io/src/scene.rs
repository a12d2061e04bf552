//! Scene descriptions in the `sfm_data.json` layout.
//!
//! Only the parts a retrieval run needs are read: the root directory and,
//! per view, the image path relative to it. Everything else in the file
//! (intrinsics, poses, structure) is ignored.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use voctree_core::error::{Error, Result};
use voctree_core::types::DocId;

/// One image of the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub id: DocId,
    /// Image path relative to the scene root.
    pub path: PathBuf,
}

impl View {
    /// File name of the image, extension included.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneDescription {
    pub root_path: PathBuf,
    views: BTreeMap<DocId, View>,
}

#[derive(Deserialize)]
struct RawScene {
    #[serde(default)]
    root_path: String,
    #[serde(default)]
    views: Vec<RawView>,
}

#[derive(Deserialize)]
struct RawView {
    key: DocId,
    value: RawViewValue,
}

#[derive(Deserialize)]
struct RawViewValue {
    ptr_wrapper: RawPtrWrapper,
}

#[derive(Deserialize)]
struct RawPtrWrapper {
    data: RawViewData,
}

#[derive(Deserialize)]
struct RawViewData {
    #[serde(default)]
    local_path: String,
    filename: String,
}

impl SceneDescription {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self { root_path: root_path.into(), views: BTreeMap::new() }
    }

    pub fn with_view(mut self, id: DocId, path: impl Into<PathBuf>) -> Self {
        self.views.insert(id, View { id, path: path.into() });
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&content).map_err(|e| Error::parse(path, e.to_string()))
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let raw: RawScene = serde_json::from_str(content)?;
        let views = raw
            .views
            .into_iter()
            .map(|v| {
                let data = v.value.ptr_wrapper.data;
                let path = Path::new(&data.local_path).join(data.filename);
                (v.key, View { id: v.key, path })
            })
            .collect();
        Ok(Self { root_path: PathBuf::from(raw.root_path), views })
    }

    pub fn view(&self, id: DocId) -> Option<&View> {
        self.views.get(&id)
    }

    /// Views in ascending id order.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Absolute image path of a view: the scene root joined with its relative path.
    pub fn image_path(&self, id: DocId) -> Option<PathBuf> {
        self.view(id).map(|v| self.root_path.join(&v.path))
    }
}
