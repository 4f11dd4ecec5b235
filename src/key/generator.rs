//! Key-pair generation for each supported cipher family.

use dsa::{Components, KeySize};
use rand_core::CryptoRngCore;
use rsa::RsaPrivateKey;
use tracing::{debug, instrument, warn};

use super::curve::{CurveResolver, NamedCurve};
use super::{EcdsaKey, KeyPair};
use crate::algorithm::{CipherFamily, SignatureAlgorithmSpec};
use crate::config::{
    MIN_DSA_KEY_CERTAINTY, MIN_DSA_KEY_SIZE, MIN_RSA_KEY_STRENGTH, SignatureConfig,
};
use crate::error::{CertForgeError, Result};

/// Size parameters for key generation, with floors already applied.
#[derive(Debug, Clone)]
pub struct KeyGenParams {
    pub rsa_key_strength: usize,
    pub dsa_key_size: u32,
    pub dsa_key_certainty: u32,
    pub ec_curve_name: String,
}

impl KeyGenParams {
    /// Takes the key parameters from `config`, raising values below their
    /// floor.
    pub fn from_config(config: &SignatureConfig) -> Self {
        Self {
            rsa_key_strength: at_least(
                "rsa_key_strength",
                config.rsa_key_strength,
                MIN_RSA_KEY_STRENGTH,
            ),
            dsa_key_size: at_least("dsa_key_size", config.dsa_key_size, MIN_DSA_KEY_SIZE),
            dsa_key_certainty: at_least(
                "dsa_key_certainty",
                config.dsa_key_certainty,
                MIN_DSA_KEY_CERTAINTY,
            ),
            ec_curve_name: config.ec_curve_name.clone(),
        }
    }
}

fn at_least<T: PartialOrd + Copy + std::fmt::Display>(name: &str, value: T, floor: T) -> T {
    if value < floor {
        warn!(setting = name, value = %value, floor = %floor, "raising key parameter to its floor");
        floor
    } else {
        value
    }
}

/// Generates fresh key pairs for a resolved signature algorithm.
#[derive(Debug, Clone)]
pub struct KeyPairGenerator {
    params: KeyGenParams,
    curves: CurveResolver,
}

impl KeyPairGenerator {
    pub fn new(params: KeyGenParams, curves: CurveResolver) -> Self {
        Self { params, curves }
    }

    pub fn from_config(config: &SignatureConfig) -> Self {
        Self::new(
            KeyGenParams::from_config(config),
            CurveResolver::with_custom_curves(&config.custom_curves),
        )
    }

    pub fn params(&self) -> &KeyGenParams {
        &self.params
    }

    /// Generates a key pair for the cipher family of `spec`.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` for GOST families.
    /// * `UnsupportedCurve` when the configured curve is unknown or has no
    ///   generator.
    /// * `KeyGenerationError` for DSA sizes other than 1024, 2048 and 3072 bits
    ///   and for RSA failures.
    #[instrument(skip_all, fields(family = ?spec.cipher_family))]
    pub fn generate<R: CryptoRngCore>(
        &self,
        spec: &SignatureAlgorithmSpec,
        rng: &mut R,
    ) -> Result<KeyPair> {
        match spec.cipher_family {
            CipherFamily::Rsa => self.generate_rsa(rng),
            CipherFamily::Dsa => self.generate_dsa(rng),
            CipherFamily::Ecdsa => self.generate_ecdsa(rng),
            CipherFamily::Gost3410_94 | CipherFamily::Gost3410_2001 => Err(
                CertForgeError::UnsupportedAlgorithm(format!("{} key generation", spec.name)),
            ),
        }
    }

    fn generate_rsa<R: CryptoRngCore>(&self, rng: &mut R) -> Result<KeyPair> {
        let bits = self.params.rsa_key_strength;
        debug!(bits, "generating RSA key");
        let key = RsaPrivateKey::new(rng, bits)
            .map_err(|e| CertForgeError::KeyGenerationError(e.to_string()))?;
        Ok(KeyPair::Rsa(Box::new(key)))
    }

    #[allow(deprecated)]
    fn generate_dsa<R: CryptoRngCore>(&self, rng: &mut R) -> Result<KeyPair> {
        let key_size = match self.params.dsa_key_size {
            1024 => KeySize::DSA_1024_160,
            2048 => KeySize::DSA_2048_256,
            3072 => KeySize::DSA_3072_256,
            other => {
                return Err(CertForgeError::KeyGenerationError(format!(
                    "DSA key size {other} is not one of 1024, 2048, 3072"
                )));
            }
        };
        // The prime search round count is fixed by the dsa crate.
        debug!(
            bits = self.params.dsa_key_size,
            certainty = self.params.dsa_key_certainty,
            "generating DSA domain parameters"
        );
        let components = Components::generate(rng, key_size);
        let key = dsa::SigningKey::generate(rng, components);
        Ok(KeyPair::Dsa(Box::new(key)))
    }

    fn generate_ecdsa<R: CryptoRngCore>(&self, rng: &mut R) -> Result<KeyPair> {
        let curve = self.curves.resolve(&self.params.ec_curve_name)?;
        debug!(curve = %curve, "generating ECDSA key");
        let key = match curve {
            NamedCurve::P224 => EcdsaKey::P224(p224::ecdsa::SigningKey::random(rng)),
            NamedCurve::P256 => EcdsaKey::P256(p256::ecdsa::SigningKey::random(rng)),
            NamedCurve::P384 => EcdsaKey::P384(p384::ecdsa::SigningKey::random(rng)),
            NamedCurve::P521 => EcdsaKey::P521(p521::ecdsa::SigningKey::random(rng)),
            NamedCurve::Secp256k1 => EcdsaKey::Secp256k1(k256::ecdsa::SigningKey::random(rng)),
            NamedCurve::P192
            | NamedCurve::BrainpoolP256r1
            | NamedCurve::BrainpoolP384r1
            | NamedCurve::BrainpoolP512r1 => {
                return Err(CertForgeError::UnsupportedCurve(format!(
                    "{curve} (no key generator)"
                )));
            }
        };
        Ok(KeyPair::Ecdsa(key))
    }
}
