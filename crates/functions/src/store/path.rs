//! Slash-separated document and collection paths.
//!
//! A collection path has an odd number of segments (`menu/u1/items`), a
//! document path an even number (`menu/u1/items/margherita`). Segments are
//! never empty and never contain `/`, so a caller-supplied id cannot escape
//! the collection it is placed in.

use std::fmt;

use thiserror::Error;

/// Errors produced when building a path from untrusted input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment was empty.
    #[error("path segment cannot be empty")]
    EmptySegment,
    /// A segment contained a `/`.
    #[error("path segment cannot contain '/': {0:?}")]
    Separator(String),
    /// The path did not have the expected parity of segments.
    #[error("not a document path: {0:?}")]
    NotADocument(String),
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if segment.contains('/') {
        return Err(PathError::Separator(segment.to_owned()));
    }
    Ok(())
}

/// Path of a collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A top-level collection. `name` must be a valid segment.
    #[must_use]
    pub fn root(name: &'static str) -> Self {
        debug_assert!(check_segment(name).is_ok());
        Self(name.to_owned())
    }

    /// The document `id` inside this collection.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if `id` is empty or contains `/`.
    pub fn doc(&self, id: &str) -> Result<DocPath, PathError> {
        check_segment(id)?;
        Ok(DocPath(format!("{}/{id}", self.0)))
    }

    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl DocPath {
    /// Parse a stored document path.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if a segment is empty or the segment count is odd.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let segments: Vec<&str> = s.split('/').collect();
        for segment in &segments {
            check_segment(segment)?;
        }
        if segments.len() % 2 != 0 {
            return Err(PathError::NotADocument(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// A sub-collection nested under this document.
    #[must_use]
    pub fn collection(&self, name: &'static str) -> CollectionPath {
        debug_assert!(check_segment(name).is_ok());
        CollectionPath(format!("{}/{name}", self.0))
    }

    /// The collection this document lives in.
    #[must_use]
    pub fn parent(&self) -> CollectionPath {
        let parent = self.0.rsplit_once('/').map_or("", |(parent, _)| parent);
        CollectionPath(parent.to_owned())
    }

    /// The document's own id (last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.rsplit_once('/').map_or(&self.0, |(_, id)| id)
    }

    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
