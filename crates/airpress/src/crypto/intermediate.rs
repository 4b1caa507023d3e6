//! Bundled default intermediate certificate.
//!
//! Passes must carry the Apple Worldwide Developer Relations (WWDR)
//! intermediate alongside the signer certificate. Apple rotates that
//! certificate, so it is not checked into this crate. A build can embed one
//! by pointing `AIRPRESS_WWDR_CERT` at a PEM or DER file:
//!
//! ```text
//! AIRPRESS_WWDR_CERT=/path/to/AppleWWDRCAG4.cer cargo build
//! ```
//!
//! The embedded copy is only a default: an intermediate passed to
//! [`crate::Credentials::intermediate`] always takes precedence.

#[cfg(airpress_bundled_wwdr)]
const BUNDLED: Option<&[u8]> = Some(include_bytes!(concat!(env!("OUT_DIR"), "/wwdr.cer")));

#[cfg(not(airpress_bundled_wwdr))]
const BUNDLED: Option<&[u8]> = None;

/// Path the bundled intermediate was read from at build time, if any.
pub const BUNDLED_INTERMEDIATE_SOURCE: Option<&str> = option_env!("AIRPRESS_WWDR_CERT");

/// The intermediate certificate embedded at build time, if any.
pub fn bundled_intermediate() -> Option<&'static [u8]> {
    BUNDLED.filter(|bytes| !bytes.is_empty())
}
