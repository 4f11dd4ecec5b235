//! Signature algorithm registry.
//!
//! Maps a textual signature-algorithm name such as `SHA256WITHRSA` to the
//! cipher family used for key generation and the hash function used for
//! signing. The table is built once and borrowed by everything that needs it.

use std::collections::{BTreeSet, HashMap};

use const_oid::ObjectIdentifier;
use der::asn1::Any;
use der::Tag;
use sha2::Digest;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{CertForgeError, Result};

/// Public-key cipher families known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherFamily {
    /// RSA (PKCS#1 v1.5 or RSASSA-PSS signatures).
    Rsa,
    /// DSA (FIPS 186).
    Dsa,
    /// ECDSA over a named curve.
    Ecdsa,
    /// GOST R 34.10-94.
    Gost3410_94,
    /// GOST R 34.10-2001.
    Gost3410_2001,
}

impl CipherFamily {
    /// Whether certificates can be fully issued for this family.
    ///
    /// GOST entries exist in the table but have no key generator or signer.
    pub fn is_supported(self) -> bool {
        matches!(self, CipherFamily::Rsa | CipherFamily::Dsa | CipherFamily::Ecdsa)
    }
}

/// Hash functions known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFunction {
    Md2,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Ripemd128,
    Ripemd160,
    Ripemd256,
    Gost3411,
}

impl HashFunction {
    /// The digest algorithm OID, as placed in a PKCS#1 `DigestInfo`.
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            HashFunction::Md2 => oids::MD2,
            HashFunction::Md5 => oids::MD5,
            HashFunction::Sha1 => oids::SHA1,
            HashFunction::Sha224 => oids::SHA224,
            HashFunction::Sha256 => oids::SHA256,
            HashFunction::Sha384 => oids::SHA384,
            HashFunction::Sha512 => oids::SHA512,
            HashFunction::Ripemd128 => oids::RIPEMD128,
            HashFunction::Ripemd160 => oids::RIPEMD160,
            HashFunction::Ripemd256 => oids::RIPEMD256,
            HashFunction::Gost3411 => oids::GOST3411,
        }
    }

    /// Hashes `data` with this function.
    pub fn digest(self, data: &[u8]) -> Result<Vec<u8>> {
        let digest = match self {
            HashFunction::Md2 => md2::Md2::digest(data).to_vec(),
            HashFunction::Md5 => md5::Md5::digest(data).to_vec(),
            HashFunction::Sha1 => sha1::Sha1::digest(data).to_vec(),
            HashFunction::Sha224 => sha2::Sha224::digest(data).to_vec(),
            HashFunction::Sha256 => sha2::Sha256::digest(data).to_vec(),
            HashFunction::Sha384 => sha2::Sha384::digest(data).to_vec(),
            HashFunction::Sha512 => sha2::Sha512::digest(data).to_vec(),
            HashFunction::Ripemd128 => ripemd::Ripemd128::digest(data).to_vec(),
            HashFunction::Ripemd160 => ripemd::Ripemd160::digest(data).to_vec(),
            HashFunction::Ripemd256 => ripemd::Ripemd256::digest(data).to_vec(),
            HashFunction::Gost3411 => {
                return Err(CertForgeError::UnsupportedAlgorithm(
                    "GOST R 34.11-94 hashing is not available".to_string(),
                ));
            }
        };
        Ok(digest)
    }
}

/// RSA signature padding. Ignored for the other families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Padding {
    /// PKCS#1 v1.5 (`…WITHRSA`, `…WITHRSAENCRYPTION`).
    Pkcs1v15,
    /// RSASSA-PSS with MGF1 (`…WITHRSAANDMGF1`).
    Pss,
}

/// A resolved signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureAlgorithmSpec {
    /// Canonical upper-case name.
    pub name: &'static str,
    pub cipher_family: CipherFamily,
    pub hash_function: HashFunction,
    pub padding: Padding,
}

impl SignatureAlgorithmSpec {
    /// The `AlgorithmIdentifier` placed in the TBS `signature` field and the
    /// outer certificate `signatureAlgorithm` field.
    pub fn signature_algorithm_identifier(&self) -> Result<AlgorithmIdentifierOwned> {
        let unsupported = || {
            CertForgeError::UnsupportedAlgorithm(format!(
                "{} has no X.509 signature algorithm identifier",
                self.name
            ))
        };

        match (self.cipher_family, self.padding) {
            (CipherFamily::Rsa, Padding::Pss) => self.pss_algorithm_identifier(),
            (CipherFamily::Rsa, Padding::Pkcs1v15) => {
                let oid = match self.hash_function {
                    HashFunction::Md2 => oids::MD2_WITH_RSA,
                    HashFunction::Md5 => oids::MD5_WITH_RSA,
                    HashFunction::Sha1 => oids::SHA1_WITH_RSA,
                    HashFunction::Sha224 => oids::SHA224_WITH_RSA,
                    HashFunction::Sha256 => const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                    HashFunction::Sha384 => oids::SHA384_WITH_RSA,
                    HashFunction::Sha512 => oids::SHA512_WITH_RSA,
                    HashFunction::Ripemd128 => oids::RIPEMD128_WITH_RSA,
                    HashFunction::Ripemd160 => oids::RIPEMD160_WITH_RSA,
                    HashFunction::Ripemd256 => oids::RIPEMD256_WITH_RSA,
                    HashFunction::Gost3411 => return Err(unsupported()),
                };
                // RFC 4055: the parameters MUST be NULL for PKCS#1 v1.5.
                Ok(AlgorithmIdentifierOwned {
                    oid,
                    parameters: Some(Any::new(Tag::Null, Vec::<u8>::new())?),
                })
            }
            (CipherFamily::Dsa, _) => {
                let oid = match self.hash_function {
                    HashFunction::Sha1 => oids::DSA_WITH_SHA1,
                    HashFunction::Sha224 => oids::DSA_WITH_SHA224,
                    HashFunction::Sha256 => oids::DSA_WITH_SHA256,
                    HashFunction::Sha384 => oids::DSA_WITH_SHA384,
                    HashFunction::Sha512 => oids::DSA_WITH_SHA512,
                    _ => return Err(unsupported()),
                };
                Ok(AlgorithmIdentifierOwned {
                    oid,
                    parameters: None,
                })
            }
            (CipherFamily::Ecdsa, _) => {
                let oid = match self.hash_function {
                    HashFunction::Sha1 => oids::ECDSA_WITH_SHA1,
                    HashFunction::Sha224 => oids::ECDSA_WITH_SHA224,
                    HashFunction::Sha256 => const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                    HashFunction::Sha384 => const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                    HashFunction::Sha512 => const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
                    _ => return Err(unsupported()),
                };
                Ok(AlgorithmIdentifierOwned {
                    oid,
                    parameters: None,
                })
            }
            (CipherFamily::Gost3410_94, _) | (CipherFamily::Gost3410_2001, _) => {
                Err(unsupported())
            }
        }
    }

    fn pss_algorithm_identifier(&self) -> Result<AlgorithmIdentifierOwned> {
        let id = match self.hash_function {
            HashFunction::Sha1 => rsa::pss::get_default_pss_signature_algo_id::<sha1::Sha1>(),
            HashFunction::Sha224 => rsa::pss::get_default_pss_signature_algo_id::<sha2::Sha224>(),
            HashFunction::Sha256 => rsa::pss::get_default_pss_signature_algo_id::<sha2::Sha256>(),
            HashFunction::Sha384 => rsa::pss::get_default_pss_signature_algo_id::<sha2::Sha384>(),
            HashFunction::Sha512 => rsa::pss::get_default_pss_signature_algo_id::<sha2::Sha512>(),
            _ => {
                return Err(CertForgeError::UnsupportedAlgorithm(format!(
                    "{} is not a valid RSASSA-PSS combination",
                    self.name
                )));
            }
        };
        Ok(id?)
    }
}

const ALGORITHM_TABLE: &[(&str, CipherFamily, HashFunction, Padding)] = {
    use CipherFamily::*;
    use HashFunction::*;
    use Padding::*;
    &[
        ("MD2WITHRSAENCRYPTION", Rsa, Md2, Pkcs1v15),
        ("MD2WITHRSA", Rsa, Md2, Pkcs1v15),
        ("MD5WITHRSAENCRYPTION", Rsa, Md5, Pkcs1v15),
        ("MD5WITHRSA", Rsa, Md5, Pkcs1v15),
        ("SHA1WITHRSAENCRYPTION", Rsa, Sha1, Pkcs1v15),
        ("SHA1WITHRSA", Rsa, Sha1, Pkcs1v15),
        ("SHA224WITHRSAENCRYPTION", Rsa, Sha224, Pkcs1v15),
        ("SHA224WITHRSA", Rsa, Sha224, Pkcs1v15),
        ("SHA256WITHRSAENCRYPTION", Rsa, Sha256, Pkcs1v15),
        ("SHA256WITHRSA", Rsa, Sha256, Pkcs1v15),
        ("SHA384WITHRSAENCRYPTION", Rsa, Sha384, Pkcs1v15),
        ("SHA384WITHRSA", Rsa, Sha384, Pkcs1v15),
        ("SHA512WITHRSAENCRYPTION", Rsa, Sha512, Pkcs1v15),
        ("SHA512WITHRSA", Rsa, Sha512, Pkcs1v15),
        ("SHA1WITHRSAANDMGF1", Rsa, Sha1, Pss),
        ("SHA224WITHRSAANDMGF1", Rsa, Sha224, Pss),
        ("SHA256WITHRSAANDMGF1", Rsa, Sha256, Pss),
        ("SHA384WITHRSAANDMGF1", Rsa, Sha384, Pss),
        ("SHA512WITHRSAANDMGF1", Rsa, Sha512, Pss),
        ("RIPEMD160WITHRSAENCRYPTION", Rsa, Ripemd160, Pkcs1v15),
        ("RIPEMD160WITHRSA", Rsa, Ripemd160, Pkcs1v15),
        ("RIPEMD128WITHRSAENCRYPTION", Rsa, Ripemd128, Pkcs1v15),
        ("RIPEMD128WITHRSA", Rsa, Ripemd128, Pkcs1v15),
        ("RIPEMD256WITHRSAENCRYPTION", Rsa, Ripemd256, Pkcs1v15),
        ("RIPEMD256WITHRSA", Rsa, Ripemd256, Pkcs1v15),
        ("SHA1WITHDSA", Dsa, Sha1, Pkcs1v15),
        ("DSAWITHSHA1", Dsa, Sha1, Pkcs1v15),
        ("SHA224WITHDSA", Dsa, Sha224, Pkcs1v15),
        ("SHA256WITHDSA", Dsa, Sha256, Pkcs1v15),
        ("SHA384WITHDSA", Dsa, Sha384, Pkcs1v15),
        ("SHA512WITHDSA", Dsa, Sha512, Pkcs1v15),
        ("SHA1WITHECDSA", Ecdsa, Sha1, Pkcs1v15),
        ("ECDSAWITHSHA1", Ecdsa, Sha1, Pkcs1v15),
        ("SHA224WITHECDSA", Ecdsa, Sha224, Pkcs1v15),
        ("SHA256WITHECDSA", Ecdsa, Sha256, Pkcs1v15),
        ("SHA384WITHECDSA", Ecdsa, Sha384, Pkcs1v15),
        ("SHA512WITHECDSA", Ecdsa, Sha512, Pkcs1v15),
        ("GOST3411WITHGOST3410", Gost3410_94, Gost3411, Pkcs1v15),
        ("GOST3411WITHGOST3410-94", Gost3410_94, Gost3411, Pkcs1v15),
        ("GOST3411WITHECGOST3410", Gost3410_2001, Gost3411, Pkcs1v15),
        ("GOST3411WITHECGOST3410-2001", Gost3410_2001, Gost3411, Pkcs1v15),
        ("GOST3411WITHGOST3410-2001", Gost3410_2001, Gost3411, Pkcs1v15),
    ]
};

/// Read-only map of signature algorithm names to their specs.
///
/// Construct once with [`AlgorithmRegistry::new`] and pass by reference.
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    algorithms: HashMap<&'static str, SignatureAlgorithmSpec>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmRegistry {
    /// Builds the registry from the static algorithm table.
    pub fn new() -> Self {
        let algorithms = ALGORITHM_TABLE
            .iter()
            .map(|&(name, cipher_family, hash_function, padding)| {
                (
                    name,
                    SignatureAlgorithmSpec {
                        name,
                        cipher_family,
                        hash_function,
                        padding,
                    },
                )
            })
            .collect();
        Self { algorithms }
    }

    /// Looks up a name case-insensitively, including families that are not
    /// supported for issuance.
    pub fn lookup(&self, name: &str) -> Option<&SignatureAlgorithmSpec> {
        self.algorithms.get(name.to_ascii_uppercase().as_str())
    }

    /// Resolves a name to an algorithm whose family can be fully issued.
    ///
    /// # Errors
    /// `UnsupportedAlgorithm` when the name is unknown or its cipher family is
    /// not supported.
    pub fn resolve(&self, name: &str) -> Result<&SignatureAlgorithmSpec> {
        match self.lookup(name) {
            Some(spec) if spec.cipher_family.is_supported() => Ok(spec),
            Some(spec) => Err(CertForgeError::UnsupportedAlgorithm(format!(
                "{} ({:?} signatures are not supported)",
                spec.name, spec.cipher_family
            ))),
            None => Err(CertForgeError::UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// Whether `name` resolves to a supported algorithm.
    pub fn is_supported(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Names of all algorithms whose cipher family is supported.
    pub fn supported_names(&self) -> BTreeSet<&'static str> {
        self.algorithms
            .values()
            .filter(|spec| spec.cipher_family.is_supported())
            .map(|spec| spec.name)
            .collect()
    }
}

mod oids {
    use const_oid::ObjectIdentifier;

    pub const MD2: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.2.2");
    pub const MD5: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.2.5");
    pub const SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
    pub const SHA224: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.4");
    pub const SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
    pub const SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");
    pub const SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");
    pub const RIPEMD128: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.2.2");
    pub const RIPEMD160: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.2.1");
    pub const RIPEMD256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.2.3");
    pub const GOST3411: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.643.2.2.9");

    pub const MD2_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.2");
    pub const MD5_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.4");
    pub const SHA1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
    pub const SHA224_WITH_RSA: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.14");
    pub const SHA384_WITH_RSA: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
    pub const SHA512_WITH_RSA: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
    pub const RIPEMD128_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.3.1.3");
    pub const RIPEMD160_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.3.1.2");
    pub const RIPEMD256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.3.1.4");

    pub const DSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.3");
    pub const DSA_WITH_SHA224: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.1");
    pub const DSA_WITH_SHA256: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.2");
    pub const DSA_WITH_SHA384: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.3");
    pub const DSA_WITH_SHA512: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.4");

    pub const ECDSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");
    pub const ECDSA_WITH_SHA224: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.1");
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::Tagged;

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = AlgorithmRegistry::new();
        let spec = registry.resolve("sha256WithRSA").unwrap();
        assert_eq!(spec.name, "SHA256WITHRSA");
        assert_eq!(spec.cipher_family, CipherFamily::Rsa);
        assert_eq!(spec.hash_function, HashFunction::Sha256);
        assert_eq!(spec.padding, Padding::Pkcs1v15);
    }

    #[test]
    fn test_aliases_share_a_spec() {
        let registry = AlgorithmRegistry::new();
        let plain = registry.resolve("SHA1WITHDSA").unwrap();
        let alias = registry.resolve("dsaWithSha1").unwrap();
        assert_eq!(plain.cipher_family, alias.cipher_family);
        assert_eq!(plain.hash_function, alias.hash_function);

        let pss = registry.resolve("SHA384WITHRSAANDMGF1").unwrap();
        assert_eq!(pss.padding, Padding::Pss);
        assert_eq!(pss.hash_function, HashFunction::Sha384);
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let registry = AlgorithmRegistry::new();
        assert!(registry.lookup("NOTAREALALG").is_none());
        assert!(matches!(
            registry.resolve("NOTAREALALG"),
            Err(CertForgeError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_gost_is_known_but_not_supported() {
        let registry = AlgorithmRegistry::new();
        let spec = registry.lookup("GOST3411WITHECGOST3410-2001").unwrap();
        assert_eq!(spec.cipher_family, CipherFamily::Gost3410_2001);
        assert!(matches!(
            registry.resolve("GOST3411WITHGOST3410"),
            Err(CertForgeError::UnsupportedAlgorithm(_))
        ));
        assert!(
            !registry
                .supported_names()
                .iter()
                .any(|name| name.starts_with("GOST"))
        );
    }

    #[test]
    fn test_supported_names_cover_all_non_gost_entries() {
        let registry = AlgorithmRegistry::new();
        let supported = registry.supported_names();
        assert_eq!(supported.len(), ALGORITHM_TABLE.len() - 5);
        assert!(supported.contains("RIPEMD256WITHRSA"));
        assert!(supported.contains("SHA512WITHECDSA"));
        assert!(registry.is_supported("md5withrsaencryption"));
    }

    #[test]
    fn test_signature_algorithm_identifiers() {
        let registry = AlgorithmRegistry::new();

        let rsa = registry.resolve("SHA512WITHRSA").unwrap();
        let id = rsa.signature_algorithm_identifier().unwrap();
        assert_eq!(id.oid.to_string(), "1.2.840.113549.1.1.13");
        assert_eq!(id.parameters.unwrap().tag(), Tag::Null);

        let ecdsa = registry.resolve("SHA256WITHECDSA").unwrap();
        let id = ecdsa.signature_algorithm_identifier().unwrap();
        assert_eq!(id.oid.to_string(), "1.2.840.10045.4.3.2");
        assert!(id.parameters.is_none());

        let pss = registry.resolve("SHA256WITHRSAANDMGF1").unwrap();
        let id = pss.signature_algorithm_identifier().unwrap();
        assert_eq!(id.oid.to_string(), "1.2.840.113549.1.1.10");
        assert!(id.parameters.is_some());
    }

    #[test]
    fn test_digest_lengths() {
        let expected = [
            (HashFunction::Md2, 16),
            (HashFunction::Md5, 16),
            (HashFunction::Sha1, 20),
            (HashFunction::Sha224, 28),
            (HashFunction::Sha256, 32),
            (HashFunction::Sha384, 48),
            (HashFunction::Sha512, 64),
            (HashFunction::Ripemd128, 16),
            (HashFunction::Ripemd160, 20),
            (HashFunction::Ripemd256, 32),
        ];
        for (hash, len) in expected {
            assert_eq!(hash.digest(b"certforge").unwrap().len(), len, "{hash:?}");
        }
        assert!(HashFunction::Gost3411.digest(b"certforge").is_err());
    }
}
