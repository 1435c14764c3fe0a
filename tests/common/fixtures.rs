//! Creative fixtures for integration tests
//!
//! Writes small but realistic creatives to temporary directories so the
//! directory loader, the pipeline and the binary can be exercised end to end.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use h5_audit::bundle::Bundle;
use tempfile::TempDir;

/// Meta-tagged 300x250 creative with a stylesheet and a background image
pub const META_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta name="ad.size" content="width=300,height=250">
<link rel="stylesheet" href="style.css">
</head>
<body><div id="stage"></div></body>
</html>"#;

/// Stylesheet referencing an image through `url()`
pub const META_STYLE: &str = "#stage { background:url(img/bg.png); }";

/// Builder for a creative directory inside a temp dir
///
/// The creative lives at `<tmp>/<name>` so the bundle name is predictable.
pub struct CreativeDir {
    name: String,
    files: Vec<(String, Vec<u8>)>,
}

/// A built creative; the temp dir is removed on drop
pub struct Creative {
    _tmp: TempDir,
    root: PathBuf,
}

impl Creative {
    /// Creative directory path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Temp dir holding the creative (handy as a working directory)
    pub fn parent(&self) -> &Path {
        self._tmp.path()
    }
}

impl CreativeDir {
    /// Start an empty creative
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Vec::new(),
        }
    }

    /// Add a text file
    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.files.push((path.to_string(), contents.as_bytes().to_vec()));
        self
    }

    /// Add a binary file
    pub fn bytes(mut self, path: &str, contents: Vec<u8>) -> Self {
        self.files.push((path.to_string(), contents));
        self
    }

    /// Write everything to disk
    pub fn build(self) -> Creative {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let root = tmp.path().join(&self.name);
        fs::create_dir_all(&root).expect("Failed to create creative dir");
        for (path, contents) in &self.files {
            let target = root.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).expect("Failed to create asset dir");
            }
            fs::write(&target, contents).expect("Failed to write asset");
        }
        Creative { _tmp: tmp, root }
    }

    /// Build an in-memory bundle instead
    pub fn bundle(self) -> Bundle {
        Bundle::from_files(self.name, self.files)
    }
}

/// The meta-tagged creative from [`META_INDEX`]
pub fn meta_creative() -> CreativeDir {
    CreativeDir::new("300x250")
        .file("index.html", META_INDEX)
        .file("style.css", META_STYLE)
        .bytes("img/bg.png", vec![0x89, b'P', b'N', b'G', 0, 0, 0, 0])
}

/// A creative whose only reference is missing
pub fn broken_creative() -> CreativeDir {
    CreativeDir::new("broken")
        .file(
            "index.html",
            r#"<meta name="ad.size" content="width=728,height=90"><img src="img/logo.png">"#,
        )
}

/// Deterministic pseudo-random bytes that gzip poorly
pub fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect()
}
