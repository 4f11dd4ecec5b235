//! PKCS#12 export and import of a certificate with its private key.
//!
//! The bundle holds two `data` safe contents: one with the certificate bag and
//! one with a PKCS#8 shrouded key bag (PBES2, PBKDF2-HMAC-SHA256 and
//! AES-256-CBC). Both bags carry the same `localKeyId`. The whole
//! authenticated safe is protected by an HMAC-SHA256 MAC whose key comes from
//! the PKCS#12 key derivation function.

use cms::content_info::ContentInfo;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc5911::ID_DATA;
use der::asn1::{Any, OctetString, SetOfVec};
use der::{Decode, Encode, Tag};
use hmac::{Hmac, Mac};
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo, pkcs5};
use pkcs12::authenticated_safe::AuthenticatedSafe;
use pkcs12::cert_type::CertBag;
use pkcs12::digest_info::DigestInfo;
use pkcs12::mac_data::MacData;
use pkcs12::pfx::{Pfx, Version};
use pkcs12::safe_bag::{SafeBag, SafeContents};
use pkcs12::{PKCS_12_CERT_BAG_OID, PKCS_12_PKCS8_KEY_BAG_OID, PKCS_12_X509_CERT_OID};
use rand_core::CryptoRngCore;
use sha2::Sha256;
use tracing::{debug, instrument};
use x509_cert::attr::{Attribute, Attributes};
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::algorithm::HashFunction;
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::error::{CertForgeError, Result};
use crate::issuer::key_identifier;
use crate::key::KeyPair;

const LOCAL_KEY_ID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.21");

const PBKDF2_ITERATIONS: u32 = 2048;
const MAC_ITERATIONS: i32 = 2048;
const SALT_LEN: usize = 16;

fn data_content(bytes: Vec<u8>) -> Result<ContentInfo> {
    Ok(ContentInfo {
        content_type: ID_DATA,
        content: Any::encode_from(&OctetString::new(bytes)?)?,
    })
}

fn data_bytes(content: &ContentInfo) -> Result<Vec<u8>> {
    if content.content_type != ID_DATA {
        return Err(CertForgeError::DecodingError(format!(
            "unsupported PKCS#12 content type {}",
            content.content_type
        )));
    }
    Ok(content.content.decode_as::<OctetString>()?.into_bytes())
}

fn local_key_id_attributes(local_key_id: &[u8]) -> Result<Attributes> {
    let value = Any::encode_from(&OctetString::new(local_key_id)?)?;
    let attribute = Attribute {
        oid: LOCAL_KEY_ID,
        values: SetOfVec::try_from(vec![value])?,
    };
    Ok(SetOfVec::try_from(vec![attribute])?)
}

fn new_mac(passphrase: &str, salt: &[u8], iterations: i32) -> Result<Hmac<Sha256>> {
    let key = pkcs12::kdf::derive_key_utf8::<Sha256>(
        passphrase,
        salt,
        pkcs12::kdf::Pkcs12KeyType::Mac,
        iterations,
        32,
    )?;
    Hmac::<Sha256>::new_from_slice(&key).map_err(|e| CertForgeError::EncodingError(e.to_string()))
}

fn mac_digest_info(mac_value: &[u8]) -> Result<DigestInfo> {
    Ok(DigestInfo {
        algorithm: AlgorithmIdentifierOwned {
            oid: HashFunction::Sha256.oid(),
            parameters: Some(Any::new(Tag::Null, Vec::<u8>::new())?),
        },
        digest: OctetString::new(mac_value)?,
    })
}

/// A DER-encoded PKCS#12 (PFX) bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    der: Vec<u8>,
}

impl Bundle {
    /// Wraps existing PKCS#12 bytes without validating them.
    pub fn from_der(der: Vec<u8>) -> Self {
        Self { der }
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    /// Serializes `cert` and `key` into a passphrase-protected bundle.
    ///
    /// The passphrase may be empty.
    #[instrument(skip_all, fields(subject = %cert.subject()))]
    pub fn export<R: CryptoRngCore>(
        cert: &Certificate,
        key: &KeyPair,
        passphrase: &str,
        rng: &mut R,
    ) -> Result<Self> {
        let local_key_id = key_identifier(cert.public_key_info());

        let cert_bag = SafeBag {
            bag_id: PKCS_12_CERT_BAG_OID,
            bag_value: CertBag {
                cert_id: PKCS_12_X509_CERT_OID,
                cert_value: OctetString::new(cert.to_der()?)?,
            }
            .to_der()?,
            bag_attributes: Some(local_key_id_attributes(&local_key_id)?),
        };

        let mut pbkdf2_salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut pbkdf2_salt);
        let mut aes_iv = [0u8; 16];
        rng.fill_bytes(&mut aes_iv);
        let pbes2_params = pkcs5::pbes2::Parameters::pbkdf2_sha256_aes256cbc(
            PBKDF2_ITERATIONS,
            &pbkdf2_salt,
            &aes_iv,
        )
        .map_err(|e| CertForgeError::EncodingError(e.to_string()))?;

        let plain_key = key.to_pkcs8_der()?;
        let shrouded_key = PrivateKeyInfo::try_from(plain_key.as_bytes())?
            .encrypt_with_params(pbes2_params, passphrase)?;
        let key_bag = SafeBag {
            bag_id: PKCS_12_PKCS8_KEY_BAG_OID,
            bag_value: shrouded_key.as_bytes().to_vec(),
            bag_attributes: Some(local_key_id_attributes(&local_key_id)?),
        };

        let cert_contents: SafeContents = vec![cert_bag];
        let key_contents: SafeContents = vec![key_bag];
        let authenticated_safe: AuthenticatedSafe<'_> = vec![
            data_content(cert_contents.to_der()?)?,
            data_content(key_contents.to_der()?)?,
        ];
        let authenticated_safe = authenticated_safe.to_der()?;

        let mut mac_salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut mac_salt);
        let mut mac = new_mac(passphrase, &mac_salt, MAC_ITERATIONS)?;
        mac.update(&authenticated_safe);
        let mac_value = mac.finalize().into_bytes();

        let pfx = Pfx {
            version: Version::V3,
            auth_safe: data_content(authenticated_safe)?,
            mac_data: Some(MacData {
                mac: mac_digest_info(&mac_value)?,
                mac_salt: OctetString::new(mac_salt.to_vec())?,
                iterations: MAC_ITERATIONS,
            }),
        };

        let der = pfx
            .to_der()
            .map_err(|e| CertForgeError::EncodingError(e.to_string()))?;
        debug!(bytes = der.len(), "exported PKCS#12 bundle");
        Ok(Self { der })
    }

    /// Verifies the MAC, decrypts the private key and pairs it with the
    /// certificate.
    ///
    /// # Errors
    /// `KeyRecoveryFailure` for a wrong passphrase, a bundle without a key, or
    /// a key that does not belong to the certificate. `DecodingError` for
    /// malformed or unsupported bundle structure.
    #[instrument(skip_all)]
    pub fn open(&self, passphrase: &str) -> Result<CertificateWithPrivateKey> {
        let pfx = Pfx::from_der(&self.der)?;
        let authenticated_safe = data_bytes(&pfx.auth_safe)?;

        let mac_data = pfx.mac_data.ok_or_else(|| {
            CertForgeError::KeyRecoveryFailure("bundle has no integrity MAC".to_string())
        })?;
        if mac_data.mac.algorithm.oid != HashFunction::Sha256.oid() {
            return Err(CertForgeError::DecodingError(format!(
                "unsupported MAC digest {}",
                mac_data.mac.algorithm.oid
            )));
        }
        let mut mac = new_mac(passphrase, mac_data.mac_salt.as_bytes(), mac_data.iterations)?;
        mac.update(&authenticated_safe);
        mac.verify_slice(mac_data.mac.digest.as_bytes()).map_err(|_| {
            CertForgeError::KeyRecoveryFailure(
                "MAC verification failed; wrong passphrase?".to_string(),
            )
        })?;

        let mut cert = None;
        let mut key = None;
        for content in AuthenticatedSafe::from_der(&authenticated_safe)? {
            for bag in SafeContents::from_der(&data_bytes(&content)?)? {
                match bag.bag_id {
                    PKCS_12_CERT_BAG_OID if cert.is_none() => {
                        let cert_bag = CertBag::from_der(&bag.bag_value)?;
                        if cert_bag.cert_id == PKCS_12_X509_CERT_OID {
                            cert = Some(Certificate::from_der(cert_bag.cert_value.as_bytes())?);
                        }
                    }
                    PKCS_12_PKCS8_KEY_BAG_OID if key.is_none() => {
                        let plain = EncryptedPrivateKeyInfo::try_from(bag.bag_value.as_slice())?
                            .decrypt(passphrase)
                            .map_err(|e| CertForgeError::KeyRecoveryFailure(e.to_string()))?;
                        key = Some(KeyPair::from_pkcs8_der(plain.as_bytes())?);
                    }
                    _ => {}
                }
            }
        }

        let cert = cert.ok_or_else(|| {
            CertForgeError::DecodingError("bundle contains no X.509 certificate".to_string())
        })?;
        let key = key.ok_or_else(|| {
            CertForgeError::KeyRecoveryFailure("bundle contains no private key".to_string())
        })?;
        CertificateWithPrivateKey::new(cert, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    use crate::algorithm::AlgorithmRegistry;
    use crate::builder::CertificateBuilder;
    use crate::cert::params::CertificateRequest;
    use crate::config::SignatureConfig;

    fn issued() -> CertificateWithPrivateKey {
        let registry = AlgorithmRegistry::new();
        let config = SignatureConfig::builder().ec_curve_name("P-256").build();
        let request = CertificateRequest::builder()
            .subject_name("CN=bundled")
            .is_self_signed(true)
            .signature_algorithm("SHA256WITHECDSA")
            .build();
        CertificateBuilder::new(&registry, &config)
            .build(&request, &mut OsRng)
            .unwrap()
    }

    #[test]
    fn test_garbage_is_a_decoding_error() {
        let bundle = Bundle::from_der(vec![0x30, 0x00]);
        assert!(matches!(
            bundle.open(""),
            Err(CertForgeError::DecodingError(_))
        ));
    }

    #[test]
    fn test_local_key_id_attribute_encodes() {
        let attributes = local_key_id_attributes(&[1, 2, 3]).unwrap();
        let attribute = attributes.iter().next().unwrap();
        assert_eq!(attribute.oid, LOCAL_KEY_ID);
        let value = attribute.values.iter().next().unwrap();
        assert_eq!(value.decode_as::<OctetString>().unwrap().as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_exported_layout() {
        let issued = issued();
        let bundle =
            Bundle::export(issued.certificate(), issued.key(), "pw", &mut OsRng).unwrap();

        let pfx = Pfx::from_der(bundle.as_der()).unwrap();
        assert_eq!(pfx.version, Version::V3);
        let mac_data = pfx.mac_data.as_ref().unwrap();
        assert_eq!(mac_data.iterations, MAC_ITERATIONS);
        assert_eq!(mac_data.mac_salt.as_bytes().len(), SALT_LEN);

        let safe = AuthenticatedSafe::from_der(&data_bytes(&pfx.auth_safe).unwrap()).unwrap();
        let bag_ids: Vec<_> = safe
            .iter()
            .flat_map(|content| SafeContents::from_der(&data_bytes(content).unwrap()).unwrap())
            .map(|bag| {
                assert!(bag.bag_attributes.is_some());
                bag.bag_id
            })
            .collect();
        assert_eq!(bag_ids, vec![PKCS_12_CERT_BAG_OID, PKCS_12_PKCS8_KEY_BAG_OID]);
    }

    #[test]
    fn test_wrong_passphrase_fails_mac() {
        let issued = issued();
        let bundle =
            Bundle::export(issued.certificate(), issued.key(), "right", &mut OsRng).unwrap();
        assert!(matches!(
            bundle.open("wrong"),
            Err(CertForgeError::KeyRecoveryFailure(_))
        ));
        let opened = bundle.open("right").unwrap();
        assert_eq!(opened.certificate(), issued.certificate());
    }
}
