//! Signature production and final certificate assembly.

use der::asn1::{Any, BitString, OctetString};
use der::{Encode, Sequence, Tag};
use rand_core::CryptoRngCore;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use signature::hazmat::{PrehashSigner, RandomizedPrehashSigner};
use signature::{DigestSigner, RandomizedSigner, SignatureEncoding};
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::algorithm::{HashFunction, Padding, SignatureAlgorithmSpec};
use crate::cert::Certificate;
use crate::error::{CertForgeError, Result};
use crate::key::{EcdsaKey, KeyPair};

/// PKCS#1 `DigestInfo`.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct DigestInfo {
    pub algorithm: AlgorithmIdentifierOwned,
    pub digest: OctetString,
}

impl DigestInfo {
    /// A `DigestInfo` for `digest` computed with `hash`, with NULL parameters.
    pub fn new(hash: HashFunction, digest: &[u8]) -> Result<Self> {
        Ok(Self {
            algorithm: AlgorithmIdentifierOwned {
                oid: hash.oid(),
                parameters: Some(Any::new(Tag::Null, Vec::<u8>::new())?),
            },
            digest: OctetString::new(digest)?,
        })
    }
}

/// Signs `data` with `key` under the scheme named by `spec`.
///
/// DSA and ECDSA signatures are DER `Ecdsa-Sig-Value`/`Dss-Sig-Value`
/// sequences; RSA signatures are the raw modulus-sized integer.
pub fn sign_data<R: CryptoRngCore>(
    data: &[u8],
    key: &KeyPair,
    spec: &SignatureAlgorithmSpec,
    rng: &mut R,
) -> Result<Vec<u8>> {
    if key.family() != spec.cipher_family {
        return Err(CertForgeError::InvalidRequest(format!(
            "{} requires a {:?} key, issuer key is {:?}",
            spec.name,
            spec.cipher_family,
            key.family()
        )));
    }

    match key {
        KeyPair::Rsa(private) => match spec.padding {
            Padding::Pkcs1v15 => sign_rsa_pkcs1v15(data, private, spec.hash_function, rng),
            Padding::Pss => sign_rsa_pss(data, private, spec, rng),
        },
        KeyPair::Dsa(signing_key) => sign_dsa(data, signing_key, spec),
        KeyPair::Ecdsa(signing_key) => {
            let digest = spec.hash_function.digest(data)?;
            sign_ecdsa(&digest, signing_key, rng)
        }
    }
}

fn sign_rsa_pkcs1v15<R: CryptoRngCore>(
    data: &[u8],
    key: &RsaPrivateKey,
    hash: HashFunction,
    rng: &mut R,
) -> Result<Vec<u8>> {
    // The rsa crate has no DigestInfo prefix for MD2 or RIPEMD.
    let digest_info = DigestInfo::new(hash, &hash.digest(data)?)?.to_der()?;
    Ok(key.sign_with_rng(rng, Pkcs1v15Sign::new_unprefixed(), &digest_info)?)
}

fn sign_rsa_pss<R: CryptoRngCore>(
    data: &[u8],
    key: &RsaPrivateKey,
    spec: &SignatureAlgorithmSpec,
    rng: &mut R,
) -> Result<Vec<u8>> {
    use rsa::pss::SigningKey;

    let key = key.clone();
    let signature = match spec.hash_function {
        HashFunction::Sha1 => SigningKey::<sha1::Sha1>::new(key)
            .try_sign_with_rng(rng, data)?
            .to_vec(),
        HashFunction::Sha224 => SigningKey::<sha2::Sha224>::new(key)
            .try_sign_with_rng(rng, data)?
            .to_vec(),
        HashFunction::Sha256 => SigningKey::<sha2::Sha256>::new(key)
            .try_sign_with_rng(rng, data)?
            .to_vec(),
        HashFunction::Sha384 => SigningKey::<sha2::Sha384>::new(key)
            .try_sign_with_rng(rng, data)?
            .to_vec(),
        HashFunction::Sha512 => SigningKey::<sha2::Sha512>::new(key)
            .try_sign_with_rng(rng, data)?
            .to_vec(),
        other => {
            return Err(CertForgeError::UnsupportedAlgorithm(format!(
                "RSASSA-PSS with {other:?}"
            )));
        }
    };
    Ok(signature)
}

fn sign_dsa(data: &[u8], key: &dsa::SigningKey, spec: &SignatureAlgorithmSpec) -> Result<Vec<u8>> {
    use sha2::Digest;

    let signature: dsa::Signature = match spec.hash_function {
        HashFunction::Sha1 => key.try_sign_digest(sha1::Sha1::new_with_prefix(data))?,
        HashFunction::Sha224 => key.try_sign_digest(sha2::Sha224::new_with_prefix(data))?,
        HashFunction::Sha256 => key.try_sign_digest(sha2::Sha256::new_with_prefix(data))?,
        HashFunction::Sha384 => key.try_sign_digest(sha2::Sha384::new_with_prefix(data))?,
        HashFunction::Sha512 => key.try_sign_digest(sha2::Sha512::new_with_prefix(data))?,
        other => {
            return Err(CertForgeError::UnsupportedAlgorithm(format!(
                "DSA with {other:?}"
            )));
        }
    };
    Ok(signature.to_der()?)
}

/// Left-pads `digest` to the curve's field size so short digests on large
/// curves keep their integer value; longer digests are truncated by the
/// signer.
fn prehash_for_curve(digest: &[u8], field_size: usize) -> Vec<u8> {
    if digest.len() >= field_size {
        return digest.to_vec();
    }
    let mut prehash = vec![0u8; field_size - digest.len()];
    prehash.extend_from_slice(digest);
    prehash
}

/// P-224 to P-384 and secp256k1 use RFC 6979 nonces; the `p521` signer draws
/// its nonce from `rng`.
fn sign_ecdsa<R: CryptoRngCore>(digest: &[u8], key: &EcdsaKey, rng: &mut R) -> Result<Vec<u8>> {
    let prehash = prehash_for_curve(digest, key.curve().field_size());
    let signature = match key {
        EcdsaKey::P224(key) => {
            let sig: p224::ecdsa::Signature = key.sign_prehash(&prehash)?;
            sig.to_der().as_bytes().to_vec()
        }
        EcdsaKey::P256(key) => {
            let sig: p256::ecdsa::Signature = key.sign_prehash(&prehash)?;
            sig.to_der().as_bytes().to_vec()
        }
        EcdsaKey::P384(key) => {
            let sig: p384::ecdsa::Signature = key.sign_prehash(&prehash)?;
            sig.to_der().as_bytes().to_vec()
        }
        EcdsaKey::P521(key) => {
            let sig: p521::ecdsa::Signature = key.sign_prehash_with_rng(rng, &prehash)?;
            sig.to_der().as_bytes().to_vec()
        }
        EcdsaKey::Secp256k1(key) => {
            let sig: k256::ecdsa::Signature = key.sign_prehash(&prehash)?;
            sig.to_der().as_bytes().to_vec()
        }
    };
    Ok(signature)
}

/// Assembles the final certificate from its TBS part, signature algorithm and
/// signature value.
pub fn assemble_certificate(
    tbs: TbsCertificateInner,
    algorithm: AlgorithmIdentifierOwned,
    signature: &[u8],
) -> Result<Certificate> {
    let inner = CertificateInner {
        tbs_certificate: tbs,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(signature)?,
    };
    Ok(Certificate { inner })
}
