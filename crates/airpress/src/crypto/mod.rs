//! Signing credentials and detached PKCS#7 signatures.

pub mod credentials;
pub mod intermediate;
pub mod pkcs7;

pub use credentials::{Credentials, ResolvedCredentials, SigningMaterial};
pub use intermediate::bundled_intermediate;
