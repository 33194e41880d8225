//! Translation of streaming-server paths onto shared storage.

use std::path::{Path, PathBuf};

/// Maps the streaming server's in-container paths onto this node's disk.
///
/// The streaming server reports DVR files as it sees them, e.g.
/// `/usr/local/srs/objs/nginx/html/live/app/key.1700.flv`. The same
/// directory is mounted at `<storage root>/<mount>` here.
#[derive(Debug, Clone)]
pub struct SandboxPathMapper {
    prefix: String,
    replacement: PathBuf,
}

impl SandboxPathMapper {
    /// Map paths under `prefix` onto `replacement`.
    pub fn new(prefix: impl Into<String>, replacement: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }

    /// Translate a reported path. Paths outside the prefix are returned
    /// unchanged and treated as already valid on this node.
    pub fn translate(&self, reported: &str) -> PathBuf {
        let prefix = self.prefix.trim_end_matches('/');
        match reported.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                self.replacement.join(rest.trim_start_matches('/'))
            }
            _ => PathBuf::from(reported),
        }
    }

    /// Paths to try, in order: the translated path, then the reported path
    /// as-is when translation changed it.
    pub fn candidates(&self, reported: &str) -> Vec<PathBuf> {
        let translated = self.translate(reported);
        let raw = PathBuf::from(reported);
        if translated == raw {
            vec![raw]
        } else {
            vec![translated, raw]
        }
    }
}

/// File name component of a reported path.
pub fn reported_file_name(reported: &str) -> Option<String> {
    Path::new(reported)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}
