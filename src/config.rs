//! Signature and key-generation settings.
//!
//! Settings are plain values; reading them from a file or the environment is
//! left to the caller. [`SignatureConfig::from_settings`] accepts the
//! `key = value` pairs such a source produces.

use std::collections::BTreeMap;

use bon::Builder;
use tracing::warn;

use crate::key::NamedCurve;

pub const DEFAULT_SIGNATURE_ALGORITHM: &str = "SHA256WITHRSA";
pub const MIN_RSA_KEY_STRENGTH: usize = 2048;
pub const MIN_DSA_KEY_SIZE: u32 = 1024;
pub const MIN_DSA_KEY_CERTAINTY: u32 = 80;
pub const DEFAULT_EC_CURVE_NAME: &str = "P-521";

/// Algorithm and key parameters shared by every certificate a builder issues.
///
/// # Example
/// ```
/// use certforge::config::SignatureConfig;
///
/// let config = SignatureConfig::builder()
///     .signature_algorithm("SHA384WITHECDSA")
///     .ec_curve_name("P-384")
///     .build();
/// assert_eq!(config.rsa_key_strength, 2048);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct SignatureConfig {
    #[builder(into, default = DEFAULT_SIGNATURE_ALGORITHM.to_string())]
    pub signature_algorithm: String,
    /// RSA modulus length in bits.
    #[builder(default = MIN_RSA_KEY_STRENGTH)]
    pub rsa_key_strength: usize,
    /// DSA prime length `L` in bits: 1024, 2048 or 3072.
    #[builder(default = MIN_DSA_KEY_SIZE)]
    pub dsa_key_size: u32,
    /// Primality certainty requested for DSA domain parameters.
    ///
    /// Floored at 80 and logged during DSA key generation. It does not change
    /// how parameters are generated: `dsa::Components::generate` runs a fixed
    /// number of primality rounds.
    #[builder(default = MIN_DSA_KEY_CERTAINTY)]
    pub dsa_key_certainty: u32,
    #[builder(into, default = DEFAULT_EC_CURVE_NAME.to_string())]
    pub ec_curve_name: String,
    /// Extra curve names, resolved after the standard registries.
    #[builder(default)]
    pub custom_curves: BTreeMap<String, NamedCurve>,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SignatureConfig {
    /// Builds a configuration from named settings.
    ///
    /// Recognized keys are `SignatureAlgorithm`, `RsaKeyStrength`, `DsaKeySize`,
    /// `DsaKeyCertainty` and `EcCurveName`. Missing, empty or unparsable values
    /// fall back to the defaults, numeric values below their floor are raised
    /// to it, and unknown keys are ignored.
    pub fn from_settings<'a, I>(settings: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        for (key, value) in settings {
            let value = value.trim();
            match key {
                "SignatureAlgorithm" if !value.is_empty() => {
                    config.signature_algorithm = value.to_string();
                }
                "RsaKeyStrength" => {
                    config.rsa_key_strength = parse_with_floor(key, value, MIN_RSA_KEY_STRENGTH);
                }
                "DsaKeySize" => {
                    config.dsa_key_size = parse_with_floor(key, value, MIN_DSA_KEY_SIZE);
                }
                "DsaKeyCertainty" => {
                    config.dsa_key_certainty = parse_with_floor(key, value, MIN_DSA_KEY_CERTAINTY);
                }
                "EcCurveName" if !value.is_empty() => {
                    config.ec_curve_name = value.to_string();
                }
                _ => {}
            }
        }
        config
    }
}

fn parse_with_floor<T>(key: &str, value: &str, floor: T) -> T
where
    T: std::str::FromStr + PartialOrd + Copy + std::fmt::Display,
{
    match value.parse::<T>() {
        Ok(parsed) if parsed < floor => {
            warn!(setting = key, value = %parsed, floor = %floor, "raising setting to its floor");
            floor
        }
        Ok(parsed) => parsed,
        Err(_) => {
            if !value.is_empty() {
                warn!(setting = key, value, "unparsable setting, using default");
            }
            floor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SignatureConfig::default();
        assert_eq!(config.signature_algorithm, "SHA256WITHRSA");
        assert_eq!(config.rsa_key_strength, 2048);
        assert_eq!(config.dsa_key_size, 1024);
        assert_eq!(config.dsa_key_certainty, 80);
        assert_eq!(config.ec_curve_name, "P-521");
        assert!(config.custom_curves.is_empty());
    }

    #[test]
    fn test_from_settings_reads_known_keys() {
        let config = SignatureConfig::from_settings([
            ("SignatureAlgorithm", "SHA512WITHECDSA"),
            ("RsaKeyStrength", "4096"),
            ("DsaKeySize", "2048"),
            ("DsaKeyCertainty", "112"),
            ("EcCurveName", "secp256k1"),
            ("SomethingElse", "ignored"),
        ]);
        assert_eq!(config.signature_algorithm, "SHA512WITHECDSA");
        assert_eq!(config.rsa_key_strength, 4096);
        assert_eq!(config.dsa_key_size, 2048);
        assert_eq!(config.dsa_key_certainty, 112);
        assert_eq!(config.ec_curve_name, "secp256k1");
    }

    #[test]
    fn test_from_settings_clamps_and_falls_back() {
        let config = SignatureConfig::from_settings([
            ("SignatureAlgorithm", ""),
            ("RsaKeyStrength", "1024"),
            ("DsaKeySize", "512"),
            ("DsaKeyCertainty", "many"),
            ("EcCurveName", "  "),
        ]);
        assert_eq!(config.signature_algorithm, DEFAULT_SIGNATURE_ALGORITHM);
        assert_eq!(config.rsa_key_strength, MIN_RSA_KEY_STRENGTH);
        assert_eq!(config.dsa_key_size, MIN_DSA_KEY_SIZE);
        assert_eq!(config.dsa_key_certainty, MIN_DSA_KEY_CERTAINTY);
        assert_eq!(config.ec_curve_name, DEFAULT_EC_CURVE_NAME);
    }

    #[test]
    fn test_negative_numbers_fall_back() {
        let config = SignatureConfig::from_settings([("RsaKeyStrength", "-4096")]);
        assert_eq!(config.rsa_key_strength, MIN_RSA_KEY_STRENGTH);
    }
}
