//! Remote folder listing types
//!
//! [`RemoteFolder`] values are only produced from folder-listing responses.
//! The listing's self-entry is dropped and the remaining children are kept
//! sorted by name.

use serde::{Deserialize, Serialize};

/// A single child of a remote folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteElement {
    /// Last path segment of the element's reference
    pub name: String,
    /// Whether the element is a collection (folder)
    pub is_folder: bool,
}

impl RemoteElement {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: true,
        }
    }
}

/// Contents of a remote folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolder {
    path: String,
    elements: Vec<RemoteElement>,
}

impl RemoteFolder {
    /// The result substituted when a listing cannot be obtained
    ///
    /// Callers cannot distinguish "unreachable" from "truly empty".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a folder from the raw entries of a depth-1 listing
    ///
    /// The first entry is taken as the folder's own reference and discarded.
    /// Use [`RemoteFolder::from_children`] when the self-entry has already
    /// been identified and removed.
    pub fn from_listing(path: impl Into<String>, mut entries: Vec<RemoteElement>) -> Self {
        if !entries.is_empty() {
            entries.remove(0);
        }
        Self::from_children(path, entries)
    }

    /// Builds a folder from its children only, sorted by name
    pub fn from_children(path: impl Into<String>, mut children: Vec<RemoteElement>) -> Self {
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            path: path.into(),
            elements: children,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn elements(&self) -> &[RemoteElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn files(&self) -> impl Iterator<Item = &RemoteElement> {
        self.elements.iter().filter(|e| !e.is_folder)
    }

    pub fn folders(&self) -> impl Iterator<Item = &RemoteElement> {
        self.elements.iter().filter(|e| e.is_folder)
    }
}

/// Ensures a folder path ends with exactly one trailing `/`
pub fn normalize_folder_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    format!("{trimmed}/")
}
