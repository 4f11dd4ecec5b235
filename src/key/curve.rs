//! Named elliptic curves and the registries they are resolved through.
//!
//! Curve names are looked up case-insensitively in a fixed order:
//! NIST, X9.62, TeleTrusT, SEC, then any caller-supplied aliases. The first
//! registry that knows the name wins.

use std::collections::BTreeMap;
use std::fmt;

use const_oid::ObjectIdentifier;
use tracing::debug;

use crate::error::{CertForgeError, Result};

/// Elliptic curves that can be named in a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedCurve {
    P192,
    P224,
    P256,
    P384,
    P521,
    Secp256k1,
    BrainpoolP256r1,
    BrainpoolP384r1,
    BrainpoolP512r1,
}

impl NamedCurve {
    /// The curve OID carried in `id-ecPublicKey` parameters.
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            NamedCurve::P192 => ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.1"),
            NamedCurve::P224 => ObjectIdentifier::new_unwrap("1.3.132.0.33"),
            NamedCurve::P256 => ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7"),
            NamedCurve::P384 => ObjectIdentifier::new_unwrap("1.3.132.0.34"),
            NamedCurve::P521 => ObjectIdentifier::new_unwrap("1.3.132.0.35"),
            NamedCurve::Secp256k1 => ObjectIdentifier::new_unwrap("1.3.132.0.10"),
            NamedCurve::BrainpoolP256r1 => ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.7"),
            NamedCurve::BrainpoolP384r1 => ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.11"),
            NamedCurve::BrainpoolP512r1 => ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.13"),
        }
    }

    /// Finds the curve for an OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        ALL_CURVES.iter().copied().find(|curve| curve.oid() == *oid)
    }

    /// Whether keys can be generated and used for signing on this curve.
    pub fn has_generator(self) -> bool {
        matches!(
            self,
            NamedCurve::P224
                | NamedCurve::P256
                | NamedCurve::P384
                | NamedCurve::P521
                | NamedCurve::Secp256k1
        )
    }

    /// Size in bytes of a field element, which is also the prehash length the
    /// signer works with.
    pub fn field_size(self) -> usize {
        match self {
            NamedCurve::P192 => 24,
            NamedCurve::P224 => 28,
            NamedCurve::P256 | NamedCurve::Secp256k1 | NamedCurve::BrainpoolP256r1 => 32,
            NamedCurve::P384 | NamedCurve::BrainpoolP384r1 => 48,
            NamedCurve::BrainpoolP512r1 => 64,
            NamedCurve::P521 => 66,
        }
    }
}

impl fmt::Display for NamedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NamedCurve::P192 => "P-192",
            NamedCurve::P224 => "P-224",
            NamedCurve::P256 => "P-256",
            NamedCurve::P384 => "P-384",
            NamedCurve::P521 => "P-521",
            NamedCurve::Secp256k1 => "secp256k1",
            NamedCurve::BrainpoolP256r1 => "brainpoolP256r1",
            NamedCurve::BrainpoolP384r1 => "brainpoolP384r1",
            NamedCurve::BrainpoolP512r1 => "brainpoolP512r1",
        };
        f.write_str(name)
    }
}

const ALL_CURVES: [NamedCurve; 9] = [
    NamedCurve::P192,
    NamedCurve::P224,
    NamedCurve::P256,
    NamedCurve::P384,
    NamedCurve::P521,
    NamedCurve::Secp256k1,
    NamedCurve::BrainpoolP256r1,
    NamedCurve::BrainpoolP384r1,
    NamedCurve::BrainpoolP512r1,
];

/// A static table of curve names published by one standards body.
///
/// Names the crate has no curve arithmetic for are listed without a
/// [`NamedCurve`], so they still stop resolution at their registry.
#[derive(Debug, Clone, Copy)]
pub struct CurveRegistry {
    pub name: &'static str,
    entries: &'static [(&'static str, Option<NamedCurve>)],
}

impl CurveRegistry {
    fn entry(&self, curve_name: &str) -> Option<Option<NamedCurve>> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(curve_name))
            .map(|(_, curve)| *curve)
    }

    /// Whether the registry lists `curve_name`, case-insensitively.
    pub fn knows(&self, curve_name: &str) -> bool {
        self.entry(curve_name).is_some()
    }

    /// Case-insensitive lookup of a curve the crate can represent.
    pub fn find(&self, curve_name: &str) -> Option<NamedCurve> {
        self.entry(curve_name).flatten()
    }
}

pub const NIST: CurveRegistry = CurveRegistry {
    name: "NIST",
    entries: &[
        ("P-192", Some(NamedCurve::P192)),
        ("P-224", Some(NamedCurve::P224)),
        ("P-256", Some(NamedCurve::P256)),
        ("P-384", Some(NamedCurve::P384)),
        ("P-521", Some(NamedCurve::P521)),
        ("B-163", None),
        ("B-233", None),
        ("B-283", None),
        ("B-409", None),
        ("B-571", None),
        ("K-163", None),
        ("K-233", None),
        ("K-283", None),
        ("K-409", None),
        ("K-571", None),
    ],
};

pub const X962: CurveRegistry = CurveRegistry {
    name: "X9.62",
    entries: &[
        ("prime192v1", Some(NamedCurve::P192)),
        ("prime256v1", Some(NamedCurve::P256)),
        ("prime192v2", None),
        ("prime192v3", None),
        ("prime239v1", None),
        ("prime239v2", None),
        ("prime239v3", None),
        ("c2pnb163v1", None),
        ("c2pnb163v2", None),
        ("c2pnb163v3", None),
        ("c2pnb176w1", None),
        ("c2tnb191v1", None),
        ("c2tnb191v2", None),
        ("c2tnb191v3", None),
        ("c2pnb208w1", None),
        ("c2tnb239v1", None),
        ("c2tnb239v2", None),
        ("c2tnb239v3", None),
        ("c2pnb272w1", None),
        ("c2pnb304w1", None),
        ("c2tnb359v1", None),
        ("c2pnb368w1", None),
        ("c2tnb431r1", None),
    ],
};

pub const TELETRUST: CurveRegistry = CurveRegistry {
    name: "TeleTrusT",
    entries: &[
        ("brainpoolP256r1", Some(NamedCurve::BrainpoolP256r1)),
        ("brainpoolP384r1", Some(NamedCurve::BrainpoolP384r1)),
        ("brainpoolP512r1", Some(NamedCurve::BrainpoolP512r1)),
        ("brainpoolP160r1", None),
        ("brainpoolP160t1", None),
        ("brainpoolP192r1", None),
        ("brainpoolP192t1", None),
        ("brainpoolP224r1", None),
        ("brainpoolP224t1", None),
        ("brainpoolP256t1", None),
        ("brainpoolP320r1", None),
        ("brainpoolP320t1", None),
        ("brainpoolP384t1", None),
        ("brainpoolP512t1", None),
    ],
};

pub const SEC: CurveRegistry = CurveRegistry {
    name: "SEC",
    entries: &[
        ("secp192r1", Some(NamedCurve::P192)),
        ("secp224r1", Some(NamedCurve::P224)),
        ("secp256r1", Some(NamedCurve::P256)),
        ("secp384r1", Some(NamedCurve::P384)),
        ("secp521r1", Some(NamedCurve::P521)),
        ("secp256k1", Some(NamedCurve::Secp256k1)),
        ("secp112r1", None),
        ("secp112r2", None),
        ("secp128r1", None),
        ("secp128r2", None),
        ("secp160k1", None),
        ("secp160r1", None),
        ("secp160r2", None),
        ("secp192k1", None),
        ("secp224k1", None),
        ("sect113r1", None),
        ("sect113r2", None),
        ("sect131r1", None),
        ("sect131r2", None),
        ("sect163k1", None),
        ("sect163r1", None),
        ("sect163r2", None),
        ("sect193r1", None),
        ("sect193r2", None),
        ("sect233k1", None),
        ("sect233r1", None),
        ("sect239k1", None),
        ("sect283k1", None),
        ("sect283r1", None),
        ("sect409k1", None),
        ("sect409r1", None),
        ("sect571k1", None),
        ("sect571r1", None),
    ],
};

/// Resolves curve names through the standard registries and then through
/// caller-supplied aliases.
#[derive(Debug, Clone, Default)]
pub struct CurveResolver {
    custom: BTreeMap<String, NamedCurve>,
}

impl CurveResolver {
    const REGISTRIES: [CurveRegistry; 4] = [NIST, X962, TELETRUST, SEC];

    /// Creates a resolver with extra aliases, consulted after every standard
    /// registry.
    pub fn with_custom_curves(custom: &BTreeMap<String, NamedCurve>) -> Self {
        Self {
            custom: custom
                .iter()
                .map(|(name, curve)| (name.to_ascii_lowercase(), *curve))
                .collect(),
        }
    }

    /// Resolves `curve_name` at the first registry that lists it.
    ///
    /// # Errors
    /// `UnsupportedCurve` when no registry knows the name, or when the first
    /// registry that lists it has no curve the crate can represent.
    pub fn resolve(&self, curve_name: &str) -> Result<NamedCurve> {
        for registry in Self::REGISTRIES.iter() {
            match registry.entry(curve_name) {
                Some(Some(curve)) => {
                    debug!(curve = %curve, registry = registry.name, "resolved curve name");
                    return Ok(curve);
                }
                Some(None) => {
                    return Err(CertForgeError::UnsupportedCurve(format!(
                        "{curve_name} ({} registry) has no key generator",
                        registry.name
                    )));
                }
                None => {}
            }
        }
        if let Some(curve) = self.custom.get(&curve_name.to_ascii_lowercase()) {
            debug!(curve = %curve, registry = "custom", "resolved curve name");
            return Ok(*curve);
        }
        Err(CertForgeError::UnsupportedCurve(curve_name.to_string()))
    }
}
