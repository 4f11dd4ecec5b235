use der::Encode;
use rand::Rng;
use rand_core::CryptoRngCore;
use sha1::{Digest, Sha1};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::algorithm::SignatureAlgorithmSpec;
use crate::cert::Certificate;
use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, ExtensionParam};
use crate::error::Result;
use crate::key::KeyPair;
use crate::pki::{assemble_certificate, sign_data};
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name placed in the issued certificate's
    /// `issuer` field.
    fn issuer_name(&self) -> DistinguishedName;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the Authority Key Identifier for certificates this issuer signs.
    fn authority_key_identifier(&self) -> Result<AuthorityKeyIdentifier>;

    /// Issues a certificate for `request`, signed under `spec`.
    ///
    /// The Authority Key Identifier is placed first, followed by the request's
    /// own extensions in order.
    ///
    /// # Errors
    /// `InvalidRequest` when the signing key's family differs from `spec`, plus
    /// any encoding or signing failure.
    fn issue<R: CryptoRngCore>(
        &self,
        request: &CertificationRequestInfo,
        spec: &SignatureAlgorithmSpec,
        rng: &mut R,
    ) -> Result<Certificate> {
        let authority_key_id = self.authority_key_identifier()?;

        let mut extensions = Vec::with_capacity(request.extensions.len() + 1);
        extensions.push(ExtensionParam::from_extension(&authority_key_id, false)?);
        extensions.extend(request.extensions.iter().cloned());

        let tbs_cert = TbsCertificate {
            serial_number: request.serial_number.clone(),
            signature_algorithm: spec.signature_algorithm_identifier()?,
            issuer: self.issuer_name(),
            not_before: request.validity.not_before,
            not_after: request.validity.not_after,
            subject: request.subject.clone(),
            subject_public_key: request.subject_public_key.clone(),
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = sign_data(&tbs_cert_inner.to_der()?, self.signing_key(), spec, rng)?;

        assemble_certificate(tbs_cert_inner, tbs_cert.signature_algorithm, &signature)
    }
}

/// SHA-1 of the subject public key bits, as used for SKI and AKI key ids.
pub fn key_identifier(public_key: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(public_key.subject_public_key.raw_bytes()).to_vec()
}

/// Draws a serial number uniformly from `[1, i64::MAX]`, returned as minimal
/// big-endian bytes.
pub fn generate_serial_number<R: CryptoRngCore>(rng: &mut R) -> Vec<u8> {
    let serial: u64 = rng.gen_range(1..=i64::MAX as u64);
    let bytes = serial.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;
    use std::collections::HashSet;

    #[test]
    fn test_serial_numbers_are_positive_and_distinct() {
        let serials: HashSet<Vec<u8>> =
            (0..64).map(|_| generate_serial_number(&mut OsRng)).collect();
        assert_eq!(serials.len(), 64);
        for serial in &serials {
            assert!(serial.len() <= 8);
            assert_ne!(serial[0], 0);
        }
    }
}
