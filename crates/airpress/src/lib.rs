//! Build and sign Apple Wallet passes (`.pkpass`).
//!
//! A pass is a zip archive holding its assets (`pass.json`, images), a
//! `manifest.json` with the SHA-1 of every asset and a detached PKCS#7
//! `signature` over that manifest. [`PassPackage`] runs the whole pipeline:
//!
//! ```no_run
//! use airpress::{Credentials, PassPackage};
//!
//! let mut pass = PassPackage::with_assets(
//!     [
//!         ("pass.json", std::fs::read("pass.json")?),
//!         ("icon.png", std::fs::read("icon.png")?),
//!     ],
//!     true,
//! )?
//! .with_credentials(
//!     Credentials::new()
//!         .certificate(std::fs::read("pass.pem")?)
//!         .private_key(std::fs::read("pass.key")?)
//!         .password("secret"),
//! );
//!
//! pass.sign()?;
//! let pkpass = pass.to_archive()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assets;
pub mod crypto;
pub mod error;
pub mod manifest;
pub mod package;

#[cfg(test)]
mod test_support;

pub use assets::AssetStore;
pub use crypto::{Credentials, SigningMaterial};
pub use error::{Error, ErrorKind};
pub use manifest::{DigestMap, ManifestBuilder};
pub use package::{CompressionLevel, PackageContents, PackageState, PassPackage};

pub type Result<T> = std::result::Result<T, Error>;
