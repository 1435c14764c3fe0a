//! In-memory model of one uploaded creative package
//!
//! A [`Bundle`] is the decoded byte map handed over by whatever reads the
//! archive. It is built once and never mutated; every analysis stage reads
//! from it through shared references.

pub mod loader;

pub use loader::BundleLoader;

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

/// Decoded creative package: canonical path → bytes, plus a lowercase index
///
/// # Examples
///
/// ```
/// use h5_audit::bundle::Bundle;
///
/// let bundle = Bundle::from_files(
///     "leaderboard",
///     vec![
///         ("index.html".to_string(), b"<html></html>".to_vec()),
///         ("img/Logo.PNG".to_string(), vec![0u8; 16]),
///     ],
/// );
///
/// assert_eq!(bundle.len(), 2);
/// assert_eq!(bundle.canonical("IMG/logo.png"), Some("img/Logo.PNG"));
/// ```
#[derive(Debug, Clone)]
pub struct Bundle {
    id: String,
    name: String,
    bytes: u64,
    files: BTreeMap<String, Vec<u8>>,
    lower_case_index: HashMap<String, String>,
}

impl Bundle {
    /// Build a bundle from decoded entries
    ///
    /// Paths are normalized to `/` separators without a leading slash. The
    /// archive length defaults to the sum of entry sizes; readers that know
    /// the real archive length set it with [`Bundle::with_archive_bytes`].
    pub fn from_files<I>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let files: BTreeMap<String, Vec<u8>> = entries
            .into_iter()
            .map(|(path, content)| (normalize_entry_path(&path), content))
            .filter(|(path, _)| !path.is_empty())
            .collect();

        // BTreeMap iteration is sorted, so the first spelling of a path wins
        let mut lower_case_index = HashMap::with_capacity(files.len());
        for path in files.keys() {
            lower_case_index
                .entry(path.to_lowercase())
                .or_insert_with(|| path.clone());
        }

        let bytes = files.values().map(|c| c.len() as u64).sum();

        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            bytes,
            files,
            lower_case_index,
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the whole-archive byte length
    pub fn with_archive_bytes(mut self, bytes: u64) -> Self {
        self.bytes = bytes;
        self
    }

    /// Opaque bundle identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared creative name (usually the archive or directory name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whole-archive byte length
    pub fn archive_bytes(&self) -> u64 {
        self.bytes
    }

    /// Number of files in the bundle
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the bundle has no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Canonical paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Canonical path → content pairs in sorted order
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_slice()))
    }

    /// Content of a file by exact canonical path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Resolve any casing of a path to its canonical spelling
    pub fn canonical(&self, path: &str) -> Option<&str> {
        if let Some((key, _)) = self.files.get_key_value(path) {
            return Some(key.as_str());
        }
        self.lower_case_index
            .get(&path.to_lowercase())
            .map(String::as_str)
    }

    /// Whether a path exists, ignoring case
    pub fn contains(&self, path: &str) -> bool {
        self.canonical(path).is_some()
    }

    /// File content as text, replacing invalid UTF-8 sequences
    pub fn text(&self, path: &str) -> Option<Cow<'_, str>> {
        self.get(path).map(String::from_utf8_lossy)
    }
}

/// Normalize an archive entry name to the canonical `a/b/c` form
fn normalize_entry_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}
