//! Durable file-per-key document cache.
//!
//! [`FileCache`] maps a [`CacheKey`] to the JSON document a previous call
//! retrieved, persisted under a configurable root directory (default
//! `~/.cache/roshan`). There is no expiry logic: entries live until they are
//! overwritten by a refetch or removed with [`FileCache::clear`], so the
//! cache grows unbounded until the operator clears it.
//!
//! # On-disk layout
//!
//! Keys are path-like (`players/111620041/matches?date=180`); each `/`
//! separated segment becomes a directory level and the final segment a
//! `.json` file, so the tree under the root mirrors the remote API:
//!
//! ```text
//! ~/.cache/roshan/
//! ├── heroes.json
//! ├── players/
//! │   └── 111620041.json
//! └── explorer%3Fsql%3Dselect%20....json
//! ```
//!
//! Every segment is escaped before touching the filesystem (see
//! [`sanitize_segment`]), so a key can never address a path outside the
//! root, two distinct keys can never map to the same file, and keys stay
//! distinct on case-insensitive filesystems.
//!
//! # Crash safety
//!
//! Writes go to a temp file first and are renamed into place, so a crash
//! mid-write never leaves a partially-written entry behind: concurrent and
//! subsequent readers see either the old document or the new one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::debug;

use crate::endpoint::CacheKey;
use crate::{Result, RoshanError};

/// Segments longer than this are split across directory levels; most
/// filesystems cap a single name at 255 bytes and escaped explorer SQL
/// easily exceeds that.
const MAX_SEGMENT_LEN: usize = 180;

/// Distinguishes concurrent temp files within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Durable key → document store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open a cache rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The well-known default root, `~/.cache/roshan` (or the platform
    /// equivalent).
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("roshan")
    }

    /// The configured root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up the stored document for `key`.
    ///
    /// Absence is not an error: returns `Ok(None)` when no entry exists.
    /// An entry that exists but cannot be deserialized fails with
    /// [`RoshanError::CacheCorruption`] — surfaced, never treated as a
    /// miss, so the caller can decide to clear and refetch rather than
    /// mask data corruption.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Value>> {
        let path = self.entry_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, "loaded previously fetched document");
                Ok(Some(value))
            }
            Err(e) => Err(RoshanError::CacheCorruption {
                key: key.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    /// Persist `document` at `key`, overwriting any existing entry.
    ///
    /// Writes to a temp file and renames into place, so readers never
    /// observe a partially-written document.
    pub fn put(&self, key: &CacheKey, document: &Value) -> Result<()> {
        let path = self.entry_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Unique temp name per write, so concurrent puts to the same key
        // each rename a complete document into place.
        let tmp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&tmp_path, &json)?;
        fs::rename(&tmp_path, &path)?;
        debug!(key = %key, path = %path.display(), "stored document");
        Ok(())
    }

    /// Remove one entry (`Some(key)`) or every entry (`None`).
    ///
    /// Clearing a key that has no entry is a no-op.
    pub fn clear(&self, key: Option<&CacheKey>) -> Result<()> {
        match key {
            Some(key) => match fs::remove_file(self.entry_path(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            None => match fs::remove_dir_all(&self.root) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Filesystem location of `key`'s entry.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.as_str().split('/') {
            push_segment(&mut path, &sanitize_segment(segment));
        }
        // Appended, not set_extension(): an escaped segment may itself
        // contain dots, and replacing after the last one would collide.
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".json");
        path.set_file_name(name);
        path
    }
}

/// Escape one key segment into a filesystem-safe name.
///
/// Lowercase ASCII alphanumerics plus `.`, `_`, `-` pass through; every
/// other byte becomes `%XX`. Uppercase is escaped too, so keys differing
/// only in case stay distinct on case-insensitive filesystems. Segments
/// that are empty or all dots (`.`, `..`) are escaped entirely, so a key
/// can never produce a relative path component.
fn sanitize_segment(segment: &str) -> String {
    if segment.is_empty() {
        // A lone '%' cannot be produced by escaping (escapes are '%XX'),
        // so the empty segment keeps its own distinct name.
        return "%".into();
    }
    let escape_all = segment.bytes().all(|b| b == b'.');
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        let plain = matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-');
        if plain && !escape_all {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&format!("{b:02X}"));
        }
    }
    out
}

/// Push an escaped segment, splitting it across directory levels when it
/// exceeds what a filesystem accepts in one name.
///
/// Continuation chunks carry a `+` suffix — a byte the escaper never
/// emits — so a chunked segment can never alias a path built from
/// ordinary `/`-separated segments.
fn push_segment(path: &mut PathBuf, escaped: &str) {
    let mut rest = escaped;
    while rest.len() > MAX_SEGMENT_LEN {
        let (head, tail) = rest.split_at(MAX_SEGMENT_LEN);
        path.push(format!("{head}+"));
        rest = tail;
    }
    path.push(rest);
}
