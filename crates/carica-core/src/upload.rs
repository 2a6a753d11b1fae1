//! Uploaded files and the nested tree the request keeps them in.
//!
//! Multipart forms name their fields with nested keys (`files[bar][baz]`),
//! so uploads are stored as a tree. Actions declare the path of segments
//! that leads to the file they want.

use bytes::Bytes;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A single uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadedFile {
    client_filename: Option<String>,
    media_type: Option<String>,
    contents: Bytes,
}

impl UploadedFile {
    /// Creates a file from its contents.
    #[must_use]
    pub fn new(contents: impl Into<Bytes>) -> Self {
        Self {
            client_filename: None,
            media_type: None,
            contents: contents.into(),
        }
    }

    /// Sets the filename reported by the client.
    #[must_use]
    pub fn with_client_filename(mut self, filename: impl Into<String>) -> Self {
        self.client_filename = Some(filename.into());
        self
    }

    /// Sets the media type reported by the client.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Returns the filename reported by the client.
    #[must_use]
    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    /// Returns the media type reported by the client.
    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Returns the file contents.
    #[must_use]
    pub fn contents(&self) -> &Bytes {
        &self.contents
    }

    /// Returns the size of the file in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.contents.len()
    }
}

// Contents are left out; a rendered file is described, not echoed.
impl Serialize for UploadedFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UploadedFile", 3)?;
        state.serialize_field("client_filename", &self.client_filename)?;
        state.serialize_field("media_type", &self.media_type)?;
        state.serialize_field("size", &self.contents.len())?;
        state.end()
    }
}

/// A node in an [`UploadedFileTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadedFileNode {
    /// A file at this position.
    File(UploadedFile),
    /// Further nested entries.
    Branch(UploadedFileTree),
}

/// Uploaded files keyed by nested field paths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadedFileTree {
    entries: BTreeMap<String, UploadedFileNode>,
}

impl UploadedFileTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the tree holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the node stored directly under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UploadedFileNode> {
        self.entries.get(name)
    }

    /// Stores a file at `path`, creating intermediate branches.
    ///
    /// A file already sitting where a branch is needed is replaced. An empty
    /// path stores nothing.
    pub fn insert<S: AsRef<str>>(&mut self, path: &[S], file: UploadedFile) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut tree = self;
        for segment in parents {
            let node = tree
                .entries
                .entry(segment.as_ref().to_string())
                .or_insert_with(|| UploadedFileNode::Branch(Self::new()));
            if matches!(node, UploadedFileNode::File(_)) {
                *node = UploadedFileNode::Branch(Self::new());
            }
            let UploadedFileNode::Branch(branch) = node else {
                return;
            };
            tree = branch;
        }
        tree.entries
            .insert(last.as_ref().to_string(), UploadedFileNode::File(file));
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_file<S: AsRef<str>>(mut self, path: &[S], file: UploadedFile) -> Self {
        self.insert(path, file);
        self
    }

    /// Descends `path` and returns the file at its end.
    ///
    /// Any missing segment, a file in the middle of the path, or a branch
    /// at its end resolves to `None`.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&UploadedFile> {
        let (last, parents) = path.split_last()?;
        let mut tree = self;
        for segment in parents {
            match tree.entries.get(segment.as_ref())? {
                UploadedFileNode::Branch(branch) => tree = branch,
                UploadedFileNode::File(_) => return None,
            }
        }
        match tree.entries.get(last.as_ref())? {
            UploadedFileNode::File(file) => Some(file),
            UploadedFileNode::Branch(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UploadedFileTree {
        UploadedFileTree::new()
            .with_file(&["avatar"], UploadedFile::new("png").with_client_filename("me.png"))
            .with_file(&["files", "bar", "baz"], UploadedFile::new("nested"))
    }

    #[test]
    fn test_resolve_single_segment() {
        let tree = sample();
        let file = tree.resolve(&["avatar"]).expect("present");
        assert_eq!(file.client_filename(), Some("me.png"));
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn test_resolve_exact_nested_path_only() {
        let tree = sample();
        assert_eq!(
            tree.resolve(&["files", "bar", "baz"]).map(UploadedFile::contents),
            Some(&Bytes::from("nested"))
        );
        assert!(tree.resolve(&["files", "bar"]).is_none());
        assert!(tree.resolve(&["files", "baz"]).is_none());
        assert!(tree.resolve(&["bar", "baz"]).is_none());
        assert!(tree.resolve(&["files", "bar", "baz", "deeper"]).is_none());
        assert!(tree.resolve::<&str>(&[]).is_none());
    }

    #[test]
    fn test_insert_replaces_file_with_branch() {
        let mut tree = UploadedFileTree::new().with_file(&["doc"], UploadedFile::new("a"));
        tree.insert(&["doc", "page"], UploadedFile::new("b"));

        assert!(tree.resolve(&["doc"]).is_none());
        assert!(tree.resolve(&["doc", "page"]).is_some());
    }

    #[test]
    fn test_serialized_form_omits_contents() {
        let file = UploadedFile::new("hello").with_media_type("text/plain");
        let document = serde_json::to_value(&file).expect("serializable");
        assert_eq!(
            document,
            serde_json::json!({"client_filename": null, "media_type": "text/plain", "size": 5})
        );
    }
}
