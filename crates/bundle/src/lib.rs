//! Upload repackaging for GameDock.
//!
//! Uploads arrive as a mix of loose files and ZIP archives. This crate
//! normalizes them into a [`GameBundle`]: a flat, ordered map of
//! repository-relative paths to file contents, ready to be published.
//!
//! Normalization rules:
//!
//! - Loose files keep their submitted names.
//! - Archives are expanded in place; directory entries are dropped.
//! - When every file in an archive sits under one root directory (the usual
//!   "zipped a folder" shape), that root prefix is stripped so `index.html`
//!   lands at the site root.
//! - Entry paths are sanitized: absolute paths and `..` components are
//!   rejected, backslashes become `/`.
//! - A bundle without an `index.html` (at any depth) is rejected — the host
//!   would serve a 404 front page.
//!
//! ## Architectural Layer
//!
//! **Business logic.** Pure transformation over bytes; no network I/O. The
//! publisher uploads straight from the resulting map.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use thiserror::Error;
use tracing::debug;

/// One part of a multipart upload: the submitted file name and its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    /// File name as submitted (may contain `/` separators for nested files).
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Why an upload could not be turned into a publishable bundle.
///
/// All variants map to a client error at the HTTP surface.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The upload contained no files (or only empty archives).
    #[error("no files uploaded")]
    EmptyUpload,

    /// Neither the loose files nor any archive contained an `index.html`.
    #[error("upload must include an index.html file or a ZIP archive containing one")]
    MissingIndex,

    /// An uploaded archive could not be read.
    #[error("failed to process ZIP file '{name}': {message}")]
    UnreadableArchive {
        /// Submitted name of the offending archive.
        name: String,
        /// Description of the parse failure.
        message: String,
    },

    /// A file path tried to escape the bundle root.
    #[error("unsafe file path in upload: {path}")]
    UnsafePath {
        /// The offending path as submitted.
        path: String,
    },
}

/// A normalized, validated set of site files.
///
/// Paths are forward-slash separated and relative. Iteration order is
/// deterministic (lexicographic). When the same path is supplied twice the
/// later part wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl GameBundle {
    /// Builds a bundle from the parts of one upload.
    pub fn from_parts(parts: Vec<UploadPart>) -> Result<Self, BundleError> {
        if parts.is_empty() {
            return Err(BundleError::EmptyUpload);
        }

        let mut files = BTreeMap::new();
        for part in parts {
            if part.name.to_ascii_lowercase().ends_with(".zip") {
                expand_archive(&mut files, &part)?;
            } else {
                let path = sanitize_entry_path(&part.name)?;
                files.insert(path, part.bytes);
            }
        }

        if files.is_empty() {
            return Err(BundleError::EmptyUpload);
        }
        if !files.keys().any(|path| is_index(path)) {
            return Err(BundleError::MissingIndex);
        }

        debug!(files = files.len(), "bundle normalized");
        Ok(Self { files })
    }

    /// Iterates over `(path, contents)` pairs in lexicographic path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(p, b)| (p.as_str(), b.as_slice()))
    }

    /// Number of files in the bundle.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the bundle holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Looks up one file's contents by its bundle path.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }
}

fn is_index(path: &str) -> bool {
    path == "index.html" || path.ends_with("/index.html")
}

// Size declarations in archive headers are untrusted; preallocate at most
// this much and let the buffer grow as real bytes arrive.
const MAX_ENTRY_PREALLOC: u64 = 1 << 20;

fn entry_capacity(declared: u64) -> usize {
    declared.min(MAX_ENTRY_PREALLOC) as usize
}

fn expand_archive(
    files: &mut BTreeMap<String, Vec<u8>>,
    part: &UploadPart,
) -> Result<(), BundleError> {
    let unreadable = |message: String| BundleError::UnreadableArchive {
        name: part.name.clone(),
        message,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(&part.bytes[..])).map_err(|e| unreadable(e.to_string()))?;

    // Root-prefix detection works on names only; contents are read afterwards.
    let entry_names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    let prefix = common_root(entry_names.iter().filter(|n| !n.ends_with('/')));
    if let Some(prefix) = &prefix {
        debug!(archive = %part.name, %prefix, "stripping archive root directory");
    }

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| unreadable(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }

        let raw = entry.name().to_owned();
        let stripped = match &prefix {
            Some(p) if raw.starts_with(p.as_str()) => &raw[p.len()..],
            _ => raw.as_str(),
        };
        let path = sanitize_entry_path(stripped)?;

        let mut contents = Vec::with_capacity(entry_capacity(entry.size()));
        entry
            .read_to_end(&mut contents)
            .map_err(|e| unreadable(e.to_string()))?;
        files.insert(path, contents);
    }

    Ok(())
}

/// Returns `"<root>/"` when every file entry lives under the same single
/// root directory, `None` otherwise (including when any file sits at the
/// archive's top level).
fn common_root<'a>(file_names: impl Iterator<Item = &'a String>) -> Option<String> {
    let mut root: Option<&str> = None;
    for name in file_names {
        let (first, _) = name.split_once('/')?;
        match root {
            None => root = Some(first),
            Some(r) if r == first => {}
            Some(_) => return None,
        }
    }
    root.map(|r| format!("{r}/"))
}

/// Normalizes one entry path and rejects traversal attempts.
fn sanitize_entry_path(raw: &str) -> Result<String, BundleError> {
    let unsafe_path = || BundleError::UnsafePath {
        path: raw.to_owned(),
    };

    let normalized = raw.replace('\\', "/");
    if normalized.starts_with('/') {
        return Err(unsafe_path());
    }

    let mut parts = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => continue,
            ".." => return Err(unsafe_path()),
            c => parts.push(c),
        }
    }
    if parts.is_empty() {
        return Err(unsafe_path());
    }
    Ok(parts.join("/"))
}
