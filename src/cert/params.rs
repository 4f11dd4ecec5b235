use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use bon::Builder;
use const_oid::ObjectIdentifier;
use regex::Regex;
use time::{OffsetDateTime, Time};
use x509_cert::name::RdnSequence;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use super::CertificateWithPrivateKey;
use super::extensions::ToAndFromX509Extension;
pub use crate::cert::extensions::{
    CertificatePolicies, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage, PolicyQualifier,
};
use crate::error::{CertForgeError, Result};

/// Parameters for one certificate build.
///
/// A request is read, never modified, by the builder, so it can be adjusted
/// and built again.
///
/// # Fields
/// * `subject_name` - Subject DN; a bare name becomes `CN=<name>`.
/// * `issuer` - Signing certificate, required unless `is_self_signed`.
/// * `key_usage` - Key Usage bits; the extension is omitted when `None`.
/// * `certificate_policies` - Policies in insertion order.
/// * `not_before` / `not_after` - Defaults: today 00:00 UTC and one year later.
/// * `signature_algorithm` - A registry name such as `SHA256WITHRSA`.
#[derive(Clone, Debug, Builder)]
pub struct CertificateRequest {
    #[builder(into)]
    pub subject_name: String,
    pub issuer: Option<CertificateWithPrivateKey>,
    #[builder(default)]
    pub is_self_signed: bool,
    #[builder(default)]
    pub is_certificate_authority: bool,
    pub key_usage: Option<KeyUsage>,
    #[builder(default)]
    pub extended_key_usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub subject_alt_names: Vec<String>,
    #[builder(default)]
    pub certificate_policies: CertificatePolicies,
    pub not_before: Option<OffsetDateTime>,
    pub not_after: Option<OffsetDateTime>,
    #[builder(into)]
    pub signature_algorithm: String,
}

impl CertificateRequest {
    /// Adds a certificate policy; see [`CertificatePolicies::insert`].
    pub fn add_certificate_policy(
        &mut self,
        oid: ObjectIdentifier,
        qualifiers: Vec<PolicyQualifier>,
    ) {
        self.certificate_policies.insert(oid, qualifiers);
    }

    /// The validity window this request resolves to.
    pub fn validity(&self) -> Result<Validity> {
        Validity::resolve(self.not_before, self.not_after)
    }
}

/// The resolved subject side of a certificate, handed to an
/// [`Issuer`](crate::issuer::Issuer).
///
/// `extensions` holds everything except the Authority Key Identifier, which
/// only the issuer can produce.
#[derive(Clone, Debug)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub serial_number: Vec<u8>,
    pub validity: Validity,
    pub extensions: Vec<ExtensionParam>,
}

const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

static NAME_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z]{1,3}=").ok());

/// Prefixes `CN=` to a name without a leading attribute type.
pub fn normalize_subject_name(name: &str) -> String {
    let has_prefix = NAME_PREFIX
        .as_ref()
        .is_some_and(|prefix| prefix.is_match(name));
    if has_prefix {
        name.to_string()
    } else {
        format!("CN={name}")
    }
}

/// An X.509 distinguished name.
///
/// Displays as an RFC 4514 string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistinguishedName(x509_cert::name::Name);

impl DistinguishedName {
    /// Parses an RFC 4514 string after [`normalize_subject_name`].
    ///
    /// # Errors
    /// `InvalidRequest` for an empty or malformed name.
    pub fn parse(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(CertForgeError::InvalidRequest(
                "subject name is empty".to_string(),
            ));
        }
        let normalized = normalize_subject_name(name);
        let rdns = RdnSequence::from_str(normalized.trim()).map_err(|e| {
            CertForgeError::InvalidRequest(format!("subject name {name:?}: {e}"))
        })?;
        Ok(Self(rdns))
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> x509_cert::name::DistinguishedName {
        self.0.clone()
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        Self(x509dn.clone())
    }

    /// The first common name attribute, if any.
    pub fn common_name(&self) -> Option<String> {
        self.0
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|attr| attr.oid == COMMON_NAME)
            .and_then(|attr| attr.value.decode_as::<String>().ok())
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DistinguishedName {
    type Err = CertForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Starts today at midnight UTC and ends `years` calendar years later.
    pub fn for_years(years: i32) -> Self {
        let now = start_of_today();
        Self {
            not_before: now,
            not_after: add_years(now, years),
        }
    }

    /// Fills in missing bounds: `not_before` defaults to today at midnight UTC
    /// and `not_after` to one year after `not_before`.
    ///
    /// # Errors
    /// `InvalidRequest` when `not_after` is not later than `not_before`.
    pub fn resolve(
        not_before: Option<OffsetDateTime>,
        not_after: Option<OffsetDateTime>,
    ) -> Result<Self> {
        let not_before = not_before.unwrap_or_else(start_of_today);
        let not_after = not_after.unwrap_or_else(|| add_years(not_before, 1));
        if not_after <= not_before {
            return Err(CertForgeError::InvalidRequest(format!(
                "not_after ({not_after}) must be later than not_before ({not_before})"
            )));
        }
        Ok(Self {
            not_before,
            not_after,
        })
    }
}

fn start_of_today() -> OffsetDateTime {
    OffsetDateTime::now_utc().replace_time(Time::MIDNIGHT)
}

/// Adds calendar years; February 29 becomes February 28 in a common year.
pub(crate) fn add_years(at: OffsetDateTime, years: i32) -> OffsetDateTime {
    let year = at.year() + years;
    at.replace_year(year)
        .or_else(|_| at.replace_day(28).and_then(|at| at.replace_year(year)))
        .unwrap_or(at)
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: &E,
        critical: bool,
    ) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}
