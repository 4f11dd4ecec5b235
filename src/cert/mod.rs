pub mod extensions;
pub mod params;

use der::{Decode, Encode, EncodePem};
use extensions::{AuthorityKeyIdentifier, SubjectKeyIdentifier, ToAndFromX509Extension};
use params::{DistinguishedName, ExtensionParam};
use rand_core::CryptoRngCore;
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::bundle::Bundle;
use crate::error::{CertForgeError, Result};
use crate::issuer::{Issuer, key_identifier};
use crate::key::KeyPair;
use crate::pem_utils;
use crate::tbs_certificate::{TbsCertificate, from_x509_time};

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM
/// formats and to read back its fields and extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertForgeError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CertForgeError::EncodingError(e.to_string()))
    }

    /// Decodes a DER certificate.
    pub fn from_der(der_bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der_bytes)?,
        })
    }

    /// Decodes a `CERTIFICATE` PEM block.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        Self::from_der(&pem_utils::pem_to_der(pem_str, pem_utils::CERTIFICATE_LABEL)?)
    }

    /// Serial number bytes, as encoded.
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn not_before(&self) -> OffsetDateTime {
        from_x509_time(&self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> OffsetDateTime {
        from_x509_time(&self.inner.tbs_certificate.validity.not_after)
    }

    pub fn public_key_info(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifierOwned {
        &self.inner.signature_algorithm
    }

    /// The unsigned part of the certificate, decoded.
    pub fn tbs_certificate(&self) -> TbsCertificate {
        TbsCertificate::from_tbs_certificate_inner(&self.inner.tbs_certificate)
    }

    /// All extensions in encoded order.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.tbs_certificate().extensions
    }

    /// Decodes the extension `E`.
    ///
    /// Returns `Ok(None)` when the certificate does not carry it.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
            .transpose()
    }
}

/// Issuer for a self-signed certificate: the subject's own name, key and
/// serial number.
pub(crate) struct SelfIssuer<'a> {
    pub name: DistinguishedName,
    pub key: &'a KeyPair,
    pub serial_number: Vec<u8>,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> DistinguishedName {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn authority_key_identifier(&self) -> Result<AuthorityKeyIdentifier> {
        Ok(AuthorityKeyIdentifier {
            key_identifier: key_identifier(&self.key.public_key_info()?),
            authority_cert_issuer: Some(self.name.clone()),
            authority_cert_serial_number: Some(self.serial_number.clone()),
        })
    }
}

/// A certificate paired with the private key for its public key.
///
/// Construction checks that the two belong together, so a value of this type
/// can always sign.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    cert: Certificate,
    key: KeyPair,
}

impl CertificateWithPrivateKey {
    /// Pairs `cert` with `key`.
    ///
    /// # Errors
    /// `KeyRecoveryFailure` when `key` is not the private half of the
    /// certificate's public key.
    pub fn new(cert: Certificate, key: KeyPair) -> Result<Self> {
        if !key.matches(cert.public_key_info())? {
            return Err(CertForgeError::KeyRecoveryFailure(format!(
                "private key does not match certificate {}",
                cert.subject()
            )));
        }
        Ok(Self { cert, key })
    }

    /// Pairs a freshly issued certificate with the key it was issued for.
    pub(crate) fn from_issued(cert: Certificate, key: KeyPair) -> Self {
        Self { cert, key }
    }

    /// Loads a `CERTIFICATE` PEM block and a `PRIVATE KEY` PEM block.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let cert = Certificate::from_pem(cert_pem)?;
        let key = KeyPair::from_pkcs8_pem(key_pem)
            .map_err(|e| CertForgeError::KeyRecoveryFailure(e.to_string()))?;
        Self::new(cert, key)
    }

    /// Opens a PKCS#12 bundle.
    pub fn from_pkcs12(der_bytes: &[u8], passphrase: &str) -> Result<Self> {
        Bundle::from_der(der_bytes.to_vec()).open(passphrase)
    }

    /// Exports certificate and key as a passphrase-protected PKCS#12 bundle.
    pub fn to_pkcs12<R: CryptoRngCore>(&self, passphrase: &str, rng: &mut R) -> Result<Bundle> {
        Bundle::export(&self.cert, &self.key, passphrase, rng)
    }

    pub fn certificate(&self) -> &Certificate {
        &self.cert
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    pub fn into_parts(self) -> (Certificate, KeyPair) {
        (self.cert, self.key)
    }
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> DistinguishedName {
        // The name of the issuer is the subject of the certificate
        self.cert.subject()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn authority_key_identifier(&self) -> Result<AuthorityKeyIdentifier> {
        if let Some(ski) = self.cert.extension::<SubjectKeyIdentifier>()? {
            return Ok(AuthorityKeyIdentifier {
                key_identifier: ski.0,
                authority_cert_issuer: None,
                authority_cert_serial_number: None,
            });
        }
        Ok(AuthorityKeyIdentifier {
            key_identifier: key_identifier(self.cert.public_key_info()),
            authority_cert_issuer: Some(self.cert.issuer()),
            authority_cert_serial_number: Some(self.cert.serial_number().to_vec()),
        })
    }
}
