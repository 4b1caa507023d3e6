//! Pass asset storage.
//!
//! [`AssetStore`] maps asset names to their raw bytes. Every insert is
//! checked before anything is stored:
//!
//! - content must be non-empty
//! - the name must be a relative archive path and must not collide with the
//!   generated `manifest.json` / `signature` entries
//! - with validation enabled, the name must be one of [`ALLOWED_ASSETS`]
//!
//! Each successful mutation bumps the store's [`revision`](AssetStore::revision).
//! [`crate::PassPackage`] records the revision a signature was produced for
//! and treats the signature as gone as soon as the two differ.
//!
//! # Examples
//!
//! ```
//! use airpress::AssetStore;
//!
//! let mut store = AssetStore::new();
//! store.upsert("pass.json", b"{}".to_vec(), true)?;
//! store.upsert("en.lproj/pass.strings", b"\"a\" = \"b\";".to_vec(), false)?;
//!
//! assert_eq!(store.get("pass.json")?, b"{}");
//! assert_eq!(store.names().collect::<Vec<_>>(), ["en.lproj/pass.strings", "pass.json"]);
//! # Ok::<(), airpress::Error>(())
//! ```

pub mod names;

pub use names::{ALLOWED_ASSETS, MANIFEST_NAME, PASS_ICONS, PASS_JSON, SIGNATURE_NAME};

use crate::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Validated mapping from asset name to content.
///
/// Iteration is in ascending byte-wise name order, so two iterations over an
/// unchanged store always agree.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: BTreeMap<String, Vec<u8>>,
    revision: u64,
}

impl AssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an asset.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyAsset`] if `content` is empty
    /// - [`Error::InvalidAssetName`] if `name` is not a relative archive path
    /// - [`Error::ReservedAssetName`] for `manifest.json` and `signature`
    /// - [`Error::UnsupportedAsset`] if `validate` is set and `name` is not
    ///   on the allow-list
    pub fn upsert(
        &mut self,
        name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        validate: bool,
    ) -> Result<()> {
        let name = name.into();
        let content = content.into();
        check_asset(&name, &content, validate)?;

        debug!(asset = %name, size = content.len(), "storing asset");
        self.assets.insert(name, content);
        self.revision += 1;
        Ok(())
    }

    /// Insert or overwrite several assets at once.
    ///
    /// Every pair is checked before anything is stored, so a bad pair leaves
    /// the store untouched. Later pairs win over earlier ones with the same name.
    pub fn upsert_all<I, N, C>(&mut self, assets: I, validate: bool) -> Result<()>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<Vec<u8>>,
    {
        let batch = assets
            .into_iter()
            .map(|(name, content)| {
                let name = name.into();
                let content = content.into();
                check_asset(&name, &content, validate).map(|()| (name, content))
            })
            .collect::<Result<Vec<_>>>()?;

        if batch.is_empty() {
            return Ok(());
        }

        debug!(count = batch.len(), "storing assets");
        self.assets.extend(batch);
        self.revision += 1;
        Ok(())
    }

    /// Remove an asset.
    ///
    /// Returns [`Error::AssetNotFound`] if there is no asset called `name`.
    pub fn remove(&mut self, name: &str) -> Result<Vec<u8>> {
        let content = self
            .assets
            .remove(name)
            .ok_or_else(|| Error::AssetNotFound(name.to_string()))?;

        debug!(asset = %name, "removed asset");
        self.revision += 1;
        Ok(content)
    }

    /// Borrow the content of an asset.
    ///
    /// Returns [`Error::AssetNotFound`] if there is no asset called `name`.
    pub fn get(&self, name: &str) -> Result<&[u8]> {
        self.assets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::AssetNotFound(name.to_string()))
    }

    /// Returns `true` if an asset called `name` is stored.
    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    /// Number of stored assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` if no assets are stored.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Asset names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.assets.keys().map(String::as_str)
    }

    /// `(name, content)` pairs in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> + '_ {
        self.assets
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_slice()))
    }

    /// Counter bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Stores compare equal when they hold the same names and bytes, whatever
/// their mutation history.
impl PartialEq for AssetStore {
    fn eq(&self, other: &Self) -> bool {
        self.assets == other.assets
    }
}

impl Eq for AssetStore {}

fn check_asset(name: &str, content: &[u8], validate: bool) -> Result<()> {
    names::check_archive_path(name)
        .map_err(|reason| Error::InvalidAssetName(name.to_string(), reason))?;

    if names::is_reserved(name) {
        return Err(Error::ReservedAssetName(name.to_string()));
    }

    if validate && !names::is_allowed(name) {
        return Err(Error::UnsupportedAsset(name.to_string()));
    }

    if content.is_empty() {
        return Err(Error::EmptyAsset(name.to_string()));
    }

    Ok(())
}
