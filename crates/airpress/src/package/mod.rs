//! Pass package builder API.
//!
//! [`PassPackage`] ties the pipeline together: it owns the assets, the
//! credentials they are signed with, the signature once one exists and the
//! compression level used for export.
//!
//! A package moves through three states:
//!
//! ```text
//! Empty --upsert--> HasAssets --sign--> Signed
//!                       ^                  |
//!                       +----any mutation--+
//! ```
//!
//! Any successful mutation after signing drops the signature; the manifest
//! has to be rebuilt and signed again before the package can be exported.

pub mod archive;

pub use archive::{CompressionLevel, PackageContents};

use crate::assets::AssetStore;
use crate::crypto::{pkcs7, Credentials};
use crate::manifest::{DigestMap, ManifestBuilder};
use crate::{Error, Result};
use tracing::{debug, info};

/// Lifecycle state of a [`PassPackage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    /// No assets stored.
    Empty,
    /// Assets stored but no valid signature.
    HasAssets,
    /// Signed for the current assets; ready for export.
    Signed,
}

/// Signature produced for one revision of the asset store.
#[derive(Debug, Clone)]
struct Signature {
    der: Vec<u8>,
    manifest: Vec<u8>,
    revision: u64,
}

/// Apple Wallet pass package with a builder-style API.
///
/// # Example
///
/// ```no_run
/// use airpress::{Credentials, PassPackage};
///
/// let mut pass = PassPackage::new().with_credentials(
///     Credentials::new()
///         .certificate(std::fs::read("pass.pem")?)
///         .private_key(std::fs::read("pass.key")?)
///         .intermediate(std::fs::read("AppleWWDRCAG4.cer")?),
/// );
/// pass.upsert("pass.json", std::fs::read("pass.json")?, true)?;
/// pass.upsert("icon.png", std::fs::read("icon.png")?, true)?;
///
/// pass.sign()?;
/// std::fs::write("event.pkpass", pass.to_archive()?)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct PassPackage {
    assets: AssetStore,
    credentials: Credentials,
    signature: Option<Signature>,
    compression_level: CompressionLevel,
}

impl PassPackage {
    /// Create an empty, unsigned package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a package holding `assets`.
    ///
    /// All assets are checked before any is stored.
    pub fn with_assets<I, N, C>(assets: I, validate: bool) -> Result<Self>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<Vec<u8>>,
    {
        let mut package = Self::new();
        package.upsert_all(assets, validate)?;
        Ok(package)
    }

    /// Set the credentials used by [`sign`](Self::sign).
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the deflate level used by [`to_archive`](Self::to_archive).
    pub fn with_compression_level(mut self, level: impl Into<CompressionLevel>) -> Self {
        self.compression_level = level.into();
        self
    }

    /// Replace the stored credentials.
    ///
    /// An existing signature is kept; it still matches the assets.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    /// Stored credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Deflate level used for export.
    pub fn compression_level(&self) -> CompressionLevel {
        self.compression_level
    }

    /// Insert or overwrite an asset. Drops the signature on success.
    ///
    /// See [`AssetStore::upsert`] for the checks applied.
    pub fn upsert(
        &mut self,
        name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        validate: bool,
    ) -> Result<()> {
        self.assets.upsert(name, content, validate)?;
        self.invalidate();
        Ok(())
    }

    /// Insert or overwrite several assets; all or none are stored.
    pub fn upsert_all<I, N, C>(&mut self, assets: I, validate: bool) -> Result<()>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<Vec<u8>>,
    {
        let before = self.assets.revision();
        self.assets.upsert_all(assets, validate)?;
        if self.assets.revision() != before {
            self.invalidate();
        }
        Ok(())
    }

    /// Remove an asset and return its content. Drops the signature on success.
    pub fn remove(&mut self, name: &str) -> Result<Vec<u8>> {
        let content = self.assets.remove(name)?;
        self.invalidate();
        Ok(content)
    }

    /// Borrow the content of an asset.
    pub fn get(&self, name: &str) -> Result<&[u8]> {
        self.assets.get(name)
    }

    /// Returns `true` if an asset called `name` is stored.
    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains(name)
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
        self.assets.names()
    }

    /// Read-only view of the asset store.
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Digest map for the current assets.
    pub fn manifest_digests(&self) -> Result<DigestMap> {
        ManifestBuilder::new(&self.assets).digest_map()
    }

    /// Canonical `manifest.json` bytes for the current assets.
    pub fn manifest(&self) -> Result<Vec<u8>> {
        ManifestBuilder::new(&self.assets).build()
    }

    /// Sign the current manifest with the stored credentials.
    ///
    /// Returns the DER-encoded detached PKCS#7 signature.
    pub fn sign(&mut self) -> Result<&[u8]> {
        self.sign_with(&Credentials::default())
    }

    /// Sign the current manifest; fields set in `overrides` take precedence
    /// over the stored credentials.
    ///
    /// Credentials are resolved and checked for completeness before the
    /// manifest is built or any key material is parsed. On failure the
    /// previous signature state is left as it was.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingCredentials`] if a required field resolves to nothing
    /// - [`Error::MissingRequiredAsset`] if `pass.json` or every icon is missing
    /// - [`Error::Certificate`], [`Error::InvalidPassword`] or
    ///   [`Error::Signing`] from the signing step
    pub fn sign_with(&mut self, overrides: &Credentials) -> Result<&[u8]> {
        let resolved = self.credentials.resolve(overrides)?;
        let manifest = ManifestBuilder::new(&self.assets).build()?;
        let der = pkcs7::sign_resolved(&manifest, &resolved)?;

        let revision = self.assets.revision();
        info!(assets = self.assets.len(), revision, "pass package signed");

        let signature = self.signature.insert(Signature {
            der,
            manifest,
            revision,
        });
        Ok(&signature.der)
    }

    /// DER signature for the current assets.
    ///
    /// Returns [`Error::NotSigned`] if the package was never signed or has
    /// changed since.
    pub fn signature(&self) -> Result<&[u8]> {
        self.current_signature().map(|signature| signature.der.as_slice())
    }

    /// Manifest bytes covered by the current signature.
    pub fn signed_manifest(&self) -> Result<&[u8]> {
        self.current_signature()
            .map(|signature| signature.manifest.as_slice())
    }

    /// Returns `true` if the signature matches the current assets.
    pub fn is_signed(&self) -> bool {
        self.current_signature().is_ok()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PackageState {
        if self.is_signed() {
            PackageState::Signed
        } else if self.assets.is_empty() {
            PackageState::Empty
        } else {
            PackageState::HasAssets
        }
    }

    /// Named view of everything that goes into the archive: assets in name
    /// order, then `manifest.json` and `signature`.
    ///
    /// The manifest is the exact byte string that was signed.
    pub fn contents(&self) -> Result<PackageContents<'_>> {
        let signature = self.current_signature()?;
        archive::pass_package(
            &self.assets,
            &signature.manifest,
            Some(signature.der.as_slice()),
        )
    }

    /// Build the `.pkpass` archive.
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`Error::Archive`] with the underlying
    /// error as its source, [`Error::NotSigned`] included.
    pub fn to_archive(&self) -> Result<Vec<u8>> {
        let contents = self.contents().map_err(Error::archive)?;
        let bytes =
            archive::write_archive(&contents, self.compression_level).map_err(Error::archive)?;

        info!(
            entries = contents.len(),
            bytes = bytes.len(),
            level = self.compression_level.level(),
            "pass archive written"
        );
        Ok(bytes)
    }

    fn current_signature(&self) -> Result<&Signature> {
        self.signature
            .as_ref()
            .filter(|signature| signature.revision == self.assets.revision())
            .ok_or(Error::NotSigned)
    }

    fn invalidate(&mut self) {
        if self.signature.take().is_some() {
            debug!("assets changed; signature dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MANIFEST_NAME, SIGNATURE_NAME};
    use crate::test_support::TestPki;
    use crate::ErrorKind;

    fn credentials(pki: &TestPki) -> Credentials {
        Credentials::new()
            .certificate(pki.signer_cert_pem())
            .private_key(pki.signer_key_pem())
            .intermediate(pki.ca_cert_der())
    }

    fn package_with_assets() -> PassPackage {
        PassPackage::with_assets(
            [
                ("icon.png", b"00001111".to_vec()),
                ("pass.json", b"11110000".to_vec()),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_package_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PassPackage>();
    }

    #[test]
    fn test_state_transitions() {
        let pki = TestPki::generate();
        let mut pass = PassPackage::new().with_credentials(credentials(&pki));
        assert_eq!(pass.state(), PackageState::Empty);

        pass.upsert("pass.json", b"11110000".to_vec(), true).unwrap();
        pass.upsert("icon.png", b"00001111".to_vec(), true).unwrap();
        assert_eq!(pass.state(), PackageState::HasAssets);

        pass.sign().unwrap();
        assert_eq!(pass.state(), PackageState::Signed);

        pass.upsert("logo.png", b"1010".to_vec(), true).unwrap();
        assert_eq!(pass.state(), PackageState::HasAssets);

        pass.sign().unwrap();
        pass.remove("logo.png").unwrap();
        assert_eq!(pass.state(), PackageState::HasAssets);
    }

    #[test]
    fn test_signature_requires_signing() {
        let pass = package_with_assets();
        let err = pass.signature().unwrap_err();
        assert!(matches!(err, Error::NotSigned));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(matches!(pass.contents(), Err(Error::NotSigned)));
    }

    #[test]
    fn test_failed_mutation_keeps_signature() {
        let pki = TestPki::generate();
        let mut pass = package_with_assets().with_credentials(credentials(&pki));
        pass.sign().unwrap();

        assert!(pass.upsert("unknown.doc", b"x".to_vec(), true).is_err());
        assert!(pass.remove("logo.png").is_err());
        assert!(pass.upsert_all(Vec::<(String, Vec<u8>)>::new(), true).is_ok());
        assert!(pass.is_signed());
    }

    #[test]
    fn test_sign_records_signed_manifest() {
        let pki = TestPki::generate();
        let mut pass = package_with_assets().with_credentials(credentials(&pki));

        let der = pass.sign().unwrap().to_vec();
        assert_eq!(pass.signature().unwrap(), der.as_slice());
        assert_eq!(pass.signed_manifest().unwrap(), pass.manifest().unwrap());

        let contents = pass.contents().unwrap();
        assert_eq!(contents.get(MANIFEST_NAME), Some(pass.manifest().unwrap().as_slice()));
        assert_eq!(contents.get(SIGNATURE_NAME), Some(der.as_slice()));
        assert_eq!(
            contents.names().collect::<Vec<_>>(),
            ["icon.png", "pass.json", MANIFEST_NAME, SIGNATURE_NAME]
        );
    }

    #[test]
    fn test_sign_without_credentials_checks_before_manifest() {
        // No assets at all: the credential error must win.
        let mut pass = PassPackage::new()
            .with_credentials(Credentials::new().intermediate(b"wwdr".to_vec()));
        let err = pass.sign().unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(_)));
        assert_eq!(err.kind(), ErrorKind::Credential);
        assert_eq!(pass.state(), PackageState::Empty);
    }

    #[test]
    fn test_sign_missing_required_asset() {
        let pki = TestPki::generate();
        let mut pass = PassPackage::with_assets([("pass.json", b"{}".to_vec())], true)
            .unwrap()
            .with_credentials(credentials(&pki));

        let err = pass.sign().unwrap_err();
        assert!(matches!(err, Error::MissingRequiredAsset(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_sign_with_overrides() {
        let pki = TestPki::generate();
        let other = TestPki::generate();

        // Stored key belongs to another certificate; the override fixes it.
        let stored = Credentials::new()
            .certificate(pki.signer_cert_pem())
            .private_key(other.signer_key_pem())
            .intermediate(pki.ca_cert_der());
        let mut pass = package_with_assets().with_credentials(stored);

        assert!(matches!(pass.sign(), Err(Error::Certificate(_))));
        assert!(!pass.is_signed());

        let overrides = Credentials::new().private_key(pki.signer_key_pem());
        pass.sign_with(&overrides).unwrap();
        assert!(pass.is_signed());
    }

    #[test]
    fn test_to_archive_unsigned_wraps_not_signed() {
        let pass = package_with_assets();
        let err = pass.to_archive().unwrap_err();

        assert!(matches!(err, Error::Archive(_)));
        assert_eq!(err.kind(), ErrorKind::Assembly);
        assert!(matches!(err.archive_cause(), Some(Error::NotSigned)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_to_archive_after_signing() {
        let pki = TestPki::generate();
        let mut pass = package_with_assets()
            .with_credentials(credentials(&pki))
            .with_compression_level(9u32);
        assert_eq!(pass.compression_level(), CompressionLevel::MAX);

        pass.sign().unwrap();
        let bytes = pass.to_archive().unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn test_set_credentials_keeps_signature() {
        let pki = TestPki::generate();
        let mut pass = package_with_assets().with_credentials(credentials(&pki));
        pass.sign().unwrap();

        pass.set_credentials(Credentials::new());
        assert!(pass.credentials().is_empty());
        assert!(pass.is_signed());
    }
}
