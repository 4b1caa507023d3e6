//! `manifest.json` generation.
//!
//! The manifest maps every asset in the package to the lowercase hex SHA-1
//! of its bytes. Wallet recomputes these digests on install and rejects the
//! pass if any differ, and the detached signature covers the serialized
//! manifest, so the serialization must be byte-for-byte reproducible.
//!
//! # Examples
//!
//! ```
//! use airpress::{AssetStore, ManifestBuilder};
//!
//! let mut store = AssetStore::new();
//! store.upsert("icon.png", b"00001111".to_vec(), true)?;
//! store.upsert("pass.json", b"11110000".to_vec(), true)?;
//!
//! let manifest = ManifestBuilder::new(&store).build()?;
//! assert_eq!(
//!     String::from_utf8(manifest).unwrap(),
//!     "{\n    \"icon.png\":\"8c4b5ab6514ff51b44d020b0006746152a53583e\",\n    \
//!      \"pass.json\":\"eec94a882caaf36c8840ff10ed115f63c1d4ab99\"\n}",
//! );
//! # Ok::<(), airpress::Error>(())
//! ```

mod canonical;

use crate::assets::{AssetStore, PASS_ICONS, PASS_JSON};
use crate::{Error, Result};
use canonical::ManifestFormatter;
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use tracing::debug;

/// Asset name to lowercase hex SHA-1 digest.
pub type DigestMap = BTreeMap<String, String>;

/// Builds the manifest for the current contents of an [`AssetStore`].
pub struct ManifestBuilder<'a> {
    store: &'a AssetStore,
}

impl<'a> ManifestBuilder<'a> {
    /// Create a builder reading from `store`.
    pub fn new(store: &'a AssetStore) -> Self {
        Self { store }
    }

    /// Digest every asset in the store.
    ///
    /// The map is exhaustive: assets stored without validation are included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredAsset`] if `pass.json` is missing or
    /// none of the icon variants is present.
    pub fn digest_map(&self) -> Result<DigestMap> {
        self.check_required()?;

        let digests: DigestMap = self
            .store
            .iter()
            .map(|(name, content)| (name.to_string(), sha1_hex(content)))
            .collect();

        debug!(entries = digests.len(), "built manifest digests");
        Ok(digests)
    }

    /// Digest every asset and serialize the result canonically.
    pub fn build(&self) -> Result<Vec<u8>> {
        serialize(&self.digest_map()?)
    }

    fn check_required(&self) -> Result<()> {
        if !self.store.contains(PASS_JSON) {
            return Err(Error::MissingRequiredAsset(format!(
                "pass package must contain `{PASS_JSON}`"
            )));
        }

        if !PASS_ICONS.iter().any(|icon| self.store.contains(icon)) {
            return Err(Error::MissingRequiredAsset(format!(
                "pass package must have an icon in at least one resolution: {}",
                PASS_ICONS.join(", ")
            )));
        }

        Ok(())
    }
}

/// Serialize a digest map as canonical manifest JSON.
///
/// Keys are emitted in ascending order with four-space indentation, bare
/// `,` / `:` separators and unescaped UTF-8. Equal maps always produce equal
/// bytes.
pub fn serialize(digests: &DigestMap) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(64 * (digests.len() + 1));
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, ManifestFormatter::new());
    digests.serialize(&mut ser)?;
    Ok(buf)
}

/// Lowercase hex SHA-1 of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
