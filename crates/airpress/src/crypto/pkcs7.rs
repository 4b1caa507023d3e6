//! Detached PKCS#7 signing of the pass manifest.
//!
//! Wallet expects `signature` to be a DER-encoded PKCS#7 SignedData whose
//! content is absent (detached) and whose certificate set carries the signer
//! certificate plus the WWDR intermediate. The content is signed in binary
//! mode so the manifest bytes are hashed exactly as stored. OpenSSL adds the
//! signing-time attribute on its own.

use super::credentials::{common_name, ResolvedCredentials, SigningMaterial};
use crate::{Error, Result};
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::stack::Stack;
use openssl::x509::X509;
use tracing::info;

/// Flags passed to `PKCS7_sign`.
pub const SIGN_FLAGS: Pkcs7Flags = Pkcs7Flags::BINARY.union(Pkcs7Flags::DETACHED);

/// Sign `data` with credentials given as raw bytes.
///
/// Empty buffers count as missing and are reported before any key or
/// certificate is parsed.
///
/// # Arguments
///
/// * `data` - Bytes to sign (the serialized manifest)
/// * `certificate` - Signer certificate, PEM or DER
/// * `private_key` - Signer private key, PEM or DER
/// * `intermediate` - Intermediate CA certificate appended to the chain
/// * `password` - Password of an encrypted private key
///
/// # Errors
///
/// - [`Error::MissingCredentials`] if any of the three buffers is empty
/// - [`Error::Certificate`] / [`Error::InvalidPassword`] if they cannot be loaded
/// - [`Error::Signing`] if OpenSSL fails to produce the signature
pub fn sign(
    data: &[u8],
    certificate: &[u8],
    private_key: &[u8],
    intermediate: &[u8],
    password: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let missing: Vec<&str> = [
        ("certificate", certificate),
        ("private key", private_key),
        ("intermediate certificate", intermediate),
    ]
    .into_iter()
    .filter_map(|(field, bytes)| bytes.is_empty().then_some(field))
    .collect();

    if !missing.is_empty() {
        return Err(Error::MissingCredentials(format!(
            "no {} supplied",
            missing.join(", ")
        )));
    }

    let material = SigningMaterial::from_bytes(certificate, private_key, intermediate, password)?;
    sign_detached(data, &material)
}

/// Sign `data` with credentials resolved by [`crate::Credentials::resolve`].
pub fn sign_resolved(data: &[u8], credentials: &ResolvedCredentials<'_>) -> Result<Vec<u8>> {
    let material = credentials.load()?;
    sign_detached(data, &material)
}

/// Produce a detached PKCS#7 signature over `data`.
///
/// The intermediate certificate from `material` is added to the certificate
/// set next to the signer certificate.
pub fn sign_detached(data: &[u8], material: &SigningMaterial) -> Result<Vec<u8>> {
    let mut chain =
        Stack::<X509>::new().map_err(|e| Error::Signing(format!("Failed to allocate certificate stack: {}", e)))?;
    chain
        .push(material.intermediate.clone())
        .map_err(|e| Error::Signing(format!("Failed to add intermediate certificate: {}", e)))?;

    let pkcs7 = Pkcs7::sign(
        &material.certificate,
        &material.private_key,
        &chain,
        data,
        SIGN_FLAGS,
    )
    .map_err(|e| Error::Signing(format!("Failed to build PKCS#7 signature: {}", e)))?;

    let der = pkcs7
        .to_der()
        .map_err(|e| Error::Signing(format!("Failed to encode PKCS#7 signature: {}", e)))?;

    if der.is_empty() {
        return Err(Error::Signing("PKCS#7 signature is empty".into()));
    }

    info!(
        signer = common_name(&material.certificate).as_deref().unwrap_or("<unknown>"),
        pass_type_id = material.pass_type_id.as_deref().unwrap_or("<unknown>"),
        bytes = der.len(),
        "signed manifest"
    );

    Ok(der)
}
