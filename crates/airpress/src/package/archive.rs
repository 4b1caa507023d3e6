//! `.pkpass` archive creation.
//!
//! A pass archive is a flat zip: every asset at its own name, plus
//! `manifest.json` and `signature` at the root. Entries are always deflated,
//! zip64 is never used, and timestamps and permissions are fixed, so the same
//! inputs always give the same archive bytes.
//!
//! # Examples
//!
//! ```
//! use airpress::package::archive::{pass_package, write_archive, CompressionLevel};
//! use airpress::AssetStore;
//!
//! let mut store = AssetStore::new();
//! store.upsert("pass.json", b"{}".to_vec(), true)?;
//!
//! let contents = pass_package(&store, b"{}", Some(&b"signature-der"[..]))?;
//! let archive = write_archive(&contents, CompressionLevel::DEFAULT)?;
//! assert!(archive.starts_with(b"PK"));
//! # Ok::<(), airpress::Error>(())
//! ```

use crate::assets::{AssetStore, MANIFEST_NAME, SIGNATURE_NAME};
use crate::{Error, Result};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Largest archive a zip without zip64 extensions can describe.
const ZIP32_LIMIT: u64 = u32::MAX as u64;

/// Permissions recorded for every entry.
const ENTRY_PERMISSIONS: u32 = 0o644;

/// Deflate compression level for pass archives.
///
/// # Examples
///
/// ```
/// use airpress::CompressionLevel;
///
/// let fast = CompressionLevel::FAST;        // Level 1
/// let balanced = CompressionLevel::DEFAULT; // Level 6
/// let small = CompressionLevel::MAX;        // Level 9
///
/// // Custom levels are clamped to 1-9
/// assert_eq!(CompressionLevel::new(0).level(), 1);
/// assert_eq!(CompressionLevel::new(3).level(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// Fastest deflate (level 1).
    pub const FAST: CompressionLevel = CompressionLevel(1);

    /// Default compression (level 6).
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Maximum compression (level 9).
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Creates a compression level, clamped to 1-9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.clamp(1, 9))
    }

    /// Returns the compression level value (1-9).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// Named content of a signed pass: assets, manifest and signature.
///
/// Assets come first in name order, followed by `manifest.json` and
/// `signature`; this is also the order entries are written to the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageContents<'a> {
    entries: Vec<(&'a str, &'a [u8])>,
}

impl<'a> PackageContents<'a> {
    /// Content of the entry called `name`.
    pub fn get(&self, name: &str) -> Option<&'a [u8]> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, content)| *content)
    }

    /// Returns `true` if there is an entry called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Entry names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// `(name, content)` pairs in archive order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a [u8])> + '_ {
        self.entries.iter().copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of all entry contents.
    pub fn content_size(&self) -> u64 {
        self.entries
            .iter()
            .map(|(_, content)| content.len() as u64)
            .sum()
    }
}

/// Collect assets, manifest and signature into one named view.
///
/// # Errors
///
/// Returns [`Error::NotSigned`] if `signature` is `None` or empty.
pub fn pass_package<'a>(
    store: &'a AssetStore,
    manifest: &'a [u8],
    signature: Option<&'a [u8]>,
) -> Result<PackageContents<'a>> {
    let signature = signature
        .filter(|signature| !signature.is_empty())
        .ok_or(Error::NotSigned)?;

    let mut entries: Vec<(&str, &[u8])> = Vec::with_capacity(store.len() + 2);
    entries.extend(store.iter());
    entries.push((MANIFEST_NAME, manifest));
    entries.push((SIGNATURE_NAME, signature));

    Ok(PackageContents { entries })
}

/// Write `contents` into an in-memory zip archive.
///
/// # Errors
///
/// Every failure is reported as [`Error::Archive`] wrapping the cause:
/// [`Error::ArchiveTooLarge`] if the archive would need zip64 extensions,
/// [`Error::Zip`] or [`Error::Io`] if it cannot be written.
pub fn write_archive(contents: &PackageContents<'_>, level: CompressionLevel) -> Result<Vec<u8>> {
    write_zip(contents, level).map_err(Error::archive)
}

fn write_zip(contents: &PackageContents<'_>, level: CompressionLevel) -> Result<Vec<u8>> {
    check_zip32_size(contents.content_size())?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(level.level() as i64))
        .last_modified_time(DateTime::default())
        .unix_permissions(ENTRY_PERMISSIONS)
        .large_file(false);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, content) in contents.iter() {
        debug!(entry = name, size = content.len(), "adding archive entry");
        zip.start_file(name, options)?;
        zip.write_all(content)?;
    }

    let archive = zip.finish()?.into_inner();
    check_zip32_size(archive.len() as u64)?;

    Ok(archive)
}

fn check_zip32_size(size: u64) -> Result<()> {
    if size >= ZIP32_LIMIT {
        return Err(Error::ArchiveTooLarge(size));
    }
    Ok(())
}
