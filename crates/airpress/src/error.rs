//! Error types for pass package operations.
//!
//! This module defines the [`enum@Error`] enum covering every failure in the
//! pass pipeline: asset validation, manifest construction, signing and
//! archive assembly. [`ErrorKind`] groups the variants into the categories a
//! caller usually branches on ("fix the input" vs. "sign first" vs. "fix the
//! credentials").
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for pass package operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
///
/// # Examples
///
/// ```
/// use airpress::{Error, ErrorKind, PassPackage};
///
/// let mut pass = PassPackage::new();
/// let err = pass.upsert("unknown.doc", b"11001100".to_vec(), true).unwrap_err();
/// assert!(matches!(err, Error::UnsupportedAsset(_)));
/// assert_eq!(err.kind(), ErrorKind::Validation);
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// Asset name is empty or is not a relative archive path.
    #[error("Invalid asset name {0:?}: {1}")]
    InvalidAssetName(String, &'static str),

    /// Asset name collides with an entry generated during assembly.
    #[error("Asset name {0:?} is reserved for the generated pass entries")]
    ReservedAssetName(String),

    /// Asset content is empty.
    #[error("Asset {0:?} cannot be empty")]
    EmptyAsset(String),

    /// Asset name is not on the list of supported pass assets.
    ///
    /// Insert with validation disabled to store it anyway.
    #[error("Asset {0:?} is not a supported pass asset")]
    UnsupportedAsset(String),

    /// An asset required to build the manifest is missing.
    #[error("Missing required asset: {0}")]
    MissingRequiredAsset(String),

    /// Lookup or removal of an asset that is not in the package.
    #[error("Asset {0:?} not found")]
    AssetNotFound(String),

    /// The package has no signature for its current assets.
    ///
    /// Returned when the signature is read, or an archive exported, before
    /// [`crate::PassPackage::sign`] was called or after the assets changed.
    #[error("Pass package is not signed; call `sign` before accessing the signature")]
    NotSigned,

    /// Certificate, private key or intermediate certificate not supplied.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Invalid or malformed certificate or private key.
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// Missing or incorrect password for an encrypted private key.
    #[error("Invalid password for private key")]
    InvalidPassword,

    /// The signing primitive failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Building the `.pkpass` archive failed.
    ///
    /// Wraps whatever went wrong while the package was enumerated or written;
    /// the original error is available through [`std::error::Error::source`].
    #[error("Failed to build pass archive")]
    Archive(#[source] Box<Error>),

    /// The archive would need zip64 extensions, which Wallet does not read.
    #[error("Pass archive of {0} bytes exceeds the 4 GiB zip limit")]
    ArchiveTooLarge(u64),

    /// ZIP archive operation failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest serialization failed.
    #[error("Manifest serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse category of an [`enum@Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input: fix the asset name, content or asset set.
    Validation,
    /// The named asset does not exist.
    NotFound,
    /// An operation was called in the wrong state (sign first).
    Precondition,
    /// Credentials are missing or unusable; signing cannot proceed.
    Credential,
    /// The archive could not be produced.
    Assembly,
}

impl Error {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAssetName(..)
            | Error::ReservedAssetName(_)
            | Error::EmptyAsset(_)
            | Error::UnsupportedAsset(_)
            | Error::MissingRequiredAsset(_) => ErrorKind::Validation,
            Error::AssetNotFound(_) => ErrorKind::NotFound,
            Error::NotSigned => ErrorKind::Precondition,
            Error::MissingCredentials(_)
            | Error::Certificate(_)
            | Error::InvalidPassword
            | Error::Signing(_) => ErrorKind::Credential,
            Error::Archive(_)
            | Error::ArchiveTooLarge(_)
            | Error::Zip(_)
            | Error::Io(_)
            | Error::Json(_) => ErrorKind::Assembly,
        }
    }

    /// For an [`Error::Archive`], the error that caused the export to fail.
    pub fn archive_cause(&self) -> Option<&Error> {
        match self {
            Error::Archive(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn archive(err: Error) -> Self {
        match err {
            Error::Archive(_) => err,
            other => Error::Archive(Box::new(other)),
        }
    }
}
