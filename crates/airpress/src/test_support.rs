//! Throwaway PKI for unit tests: a self-signed CA standing in for WWDR and a
//! pass type ID certificate issued by it.

use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::symm::Cipher;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Builder, X509Name, X509NameBuilder, X509};

pub(crate) struct TestPki {
    pub ca_cert: X509,
    pub signer_cert: X509,
    pub signer_key: PKey<Private>,
}

impl TestPki {
    pub const TEAM_ID: &'static str = "A1B2C3D4E5";
    pub const PASS_TYPE_ID: &'static str = "pass.com.example.test";

    pub fn generate() -> Self {
        let ca_key = generate_key();
        let ca_name = name(&[("CN", "Test WWDR CA"), ("O", "Test")]);
        let ca_cert = {
            let mut builder = base_builder(&ca_name, &ca_name, &ca_key, &not_before(), &not_after());
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .key_cert_sign()
                        .crl_sign()
                        .build()
                        .unwrap(),
                )
                .unwrap();
            builder.sign(&ca_key, MessageDigest::sha256()).unwrap();
            builder.build()
        };

        let signer_key = generate_key();
        let signer_name = name(&[
            ("UID", Self::PASS_TYPE_ID),
            ("CN", "Pass Type ID: pass.com.example.test"),
            ("OU", Self::TEAM_ID),
            ("O", "Example"),
        ]);
        let signer_cert = {
            let mut builder = base_builder(
                &signer_name,
                ca_cert.subject_name(),
                &signer_key,
                &not_before(),
                &not_after(),
            );
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .digital_signature()
                        .build()
                        .unwrap(),
                )
                .unwrap();
            builder.sign(&ca_key, MessageDigest::sha256()).unwrap();
            builder.build()
        };

        Self {
            ca_cert,
            signer_cert,
            signer_key,
        }
    }

    pub fn ca_cert_pem(&self) -> Vec<u8> {
        self.ca_cert.to_pem().unwrap()
    }

    pub fn ca_cert_der(&self) -> Vec<u8> {
        self.ca_cert.to_der().unwrap()
    }

    pub fn signer_cert_pem(&self) -> Vec<u8> {
        self.signer_cert.to_pem().unwrap()
    }

    pub fn signer_cert_der(&self) -> Vec<u8> {
        self.signer_cert.to_der().unwrap()
    }

    pub fn signer_key_pem(&self) -> Vec<u8> {
        self.signer_key.private_key_to_pem_pkcs8().unwrap()
    }

    pub fn signer_key_der(&self) -> Vec<u8> {
        self.signer_key.private_key_to_pkcs8().unwrap()
    }

    pub fn signer_key_pem_encrypted(&self, password: &[u8]) -> Vec<u8> {
        self.signer_key
            .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), password)
            .unwrap()
    }

    pub fn signer_key_der_encrypted(&self, password: &[u8]) -> Vec<u8> {
        self.signer_key
            .private_key_to_pkcs8_passphrase(Cipher::aes_256_cbc(), password)
            .unwrap()
    }

    /// Self-signed CA valid from 2001 to 2004.
    pub fn expired_intermediate() -> X509 {
        let key = generate_key();
        let name = name(&[("CN", "Expired WWDR CA"), ("O", "Test")]);
        let mut builder = base_builder(
            &name,
            &name,
            &key,
            &Asn1Time::from_unix(978_307_200).unwrap(),
            &Asn1Time::from_unix(1_072_915_200).unwrap(),
        );
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();
        builder.build()
    }
}

fn generate_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

fn name(entries: &[(&str, &str)]) -> X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    for (field, value) in entries {
        builder.append_entry_by_text(field, value).unwrap();
    }
    builder.build()
}

fn base_builder(
    subject: &openssl::x509::X509NameRef,
    issuer: &openssl::x509::X509NameRef,
    key: &PKey<Private>,
    not_before: &Asn1TimeRef,
    not_after: &Asn1TimeRef,
) -> X509Builder {
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();

    builder.set_subject_name(subject).unwrap();
    builder.set_issuer_name(issuer).unwrap();
    builder.set_pubkey(key).unwrap();

    builder.set_not_before(not_before).unwrap();
    builder.set_not_after(not_after).unwrap();
    builder
}

fn not_before() -> Asn1Time {
    Asn1Time::days_from_now(0).unwrap()
}

fn not_after() -> Asn1Time {
    Asn1Time::days_from_now(365).unwrap()
}
