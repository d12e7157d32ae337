//! Typed entry and pattern shapes, in place of a heterogeneous
//! `(path, stem, bitmap)` tuple threaded through every call site.

use crate::bitmap::Bitmap64;

/// The sentinel extension bucket for a directory entry.
pub const FOLDER_EXT: &str = "Folder";
/// The sentinel extension bucket for an extensionless file.
pub const FILE_EXT: &str = "File";
/// The stem directories are indexed under.
pub const FOLDER_STEM: &str = "Folder";

/// One indexed filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Normalised absolute path (trailing `/` for directories).
    pub path: String,
    /// The filename with its extension stripped (and lowercased), or one
    /// of the `"File"`/`"Folder"` sentinels.
    pub lowercased_stem: String,
    pub bitmap: Bitmap64,
}

impl Entry {
    #[must_use]
    pub fn new(path: String, stem: &str) -> Self {
        let lowercased_stem = stem.to_lowercase();
        let bitmap = Bitmap64::encode(stem);
        Self {
            path,
            lowercased_stem,
            bitmap,
        }
    }
}

/// A derived, reusable view of a user's search needle.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub bitmap: Bitmap64,
    pub extensions: Vec<String>,
    pub length: usize,
    pub lowercased_needle: String,
}

impl Pattern {
    /// Normalise the caller-supplied extension filter per §4.F: drop empty
    /// strings, canonicalise `"file"`/`"folder"` casing, and prepend a
    /// leading dot to anything else that's missing one.
    #[must_use]
    pub fn new(needle: &str, extensions: &[String]) -> Self {
        let extensions = extensions
            .iter()
            .filter(|e| !e.is_empty())
            .map(|e| normalize_extension(e))
            .collect();

        Self {
            bitmap: Bitmap64::encode(needle),
            extensions,
            length: needle.chars().count(),
            lowercased_needle: needle.to_lowercase(),
        }
    }

    #[must_use]
    pub fn extension_admitted(&self, ext: &str) -> bool {
        self.extensions.is_empty() || self.extensions.iter().any(|e| e == ext)
    }
}

fn normalize_extension(raw: &str) -> String {
    match raw.to_ascii_lowercase().as_str() {
        "file" => FILE_EXT.to_string(),
        "folder" => FOLDER_EXT.to_string(),
        _ if raw == FILE_EXT || raw == FOLDER_EXT => raw.to_string(),
        _ if raw.starts_with('.') => raw.to_string(),
        _ => format!(".{raw}"),
    }
}

/// A search hit carrying its computed relevance score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedHit {
    pub path: String,
    pub score: i64,
}
