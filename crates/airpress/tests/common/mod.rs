//! Shared fixtures for integration tests.

#![allow(dead_code)]

use airpress::{Credentials, PassPackage};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Builder, X509NameBuilder, X509NameRef, X509};

pub const ICON: &[u8] = b"00001111";
pub const PASS_JSON: &[u8] = b"11110000";
pub const ICON_SHA1: &str = "8c4b5ab6514ff51b44d020b0006746152a53583e";
pub const PASS_SHA1: &str = "eec94a882caaf36c8840ff10ed115f63c1d4ab99";

/// Stand-in WWDR CA and a pass type ID certificate issued by it.
pub struct Pki {
    pub ca: X509,
    pub leaf: X509,
    pub leaf_key: PKey<Private>,
}

impl Pki {
    pub fn new() -> Self {
        let ca_key = rsa_key();
        let ca = {
            let mut name = X509NameBuilder::new().unwrap();
            name.append_entry_by_text("CN", "Integration WWDR").unwrap();
            let name = name.build();

            let mut builder = cert_builder(&name, &name, &ca_key);
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
            builder
                .append_extension(KeyUsage::new().key_cert_sign().crl_sign().build().unwrap())
                .unwrap();
            builder.sign(&ca_key, MessageDigest::sha256()).unwrap();
            builder.build()
        };

        let leaf_key = rsa_key();
        let leaf = {
            let mut name = X509NameBuilder::new().unwrap();
            name.append_entry_by_text("UID", "pass.com.example.integration").unwrap();
            name.append_entry_by_text("CN", "Pass Type ID: pass.com.example.integration")
                .unwrap();
            name.append_entry_by_text("OU", "Z9Y8X7W6V5").unwrap();
            let name = name.build();

            let mut builder = cert_builder(&name, ca.subject_name(), &leaf_key);
            builder
                .append_extension(KeyUsage::new().digital_signature().build().unwrap())
                .unwrap();
            builder.sign(&ca_key, MessageDigest::sha256()).unwrap();
            builder.build()
        };

        Self { ca, leaf, leaf_key }
    }

    /// Certificate and key as PEM, intermediate as DER.
    pub fn credentials(&self) -> Credentials {
        Credentials::new()
            .certificate(self.leaf.to_pem().unwrap())
            .private_key(self.leaf_key.private_key_to_pem_pkcs8().unwrap())
            .intermediate(self.ca.to_der().unwrap())
    }
}

/// Package with the minimal valid asset set.
pub fn minimal_pass() -> PassPackage {
    PassPackage::with_assets([("icon.png", ICON), ("pass.json", PASS_JSON)], true).unwrap()
}

fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

fn cert_builder(subject: &X509NameRef, issuer: &X509NameRef, key: &PKey<Private>) -> X509Builder {
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();

    let mut serial = BigNum::new().unwrap();
    serial.rand(63, MsbOption::MAYBE_ZERO, false).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();

    builder.set_subject_name(subject).unwrap();
    builder.set_issuer_name(issuer).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    builder
}
