use const_oid::AssociatedOid;
use const_oid::db::rfc5280::{ID_QT_CPS, ID_QT_UNOTICE};
use der::{
    Decode, Encode, Sequence,
    asn1::{Any, Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::certpolicy::{
    self, DisplayText, NoticeReference, PolicyInformation, PolicyQualifierInfo,
};
use x509_cert::ext::pkix::name::GeneralName;

use crate::error::{CertForgeError, Result};

use super::params::DistinguishedName;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use certforge::cert::extensions::SubjectAltName;
/// use certforge::cert::extensions::ToAndFromX509Extension;
/// let san = SubjectAltName { names: vec!["example.com".to_string()] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Only DNS names are produced; other name forms are rejected on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(|name| {
                    Ia5String::try_from(name.clone())
                        .map(GeneralName::DnsName)
                        .map_err(|e| {
                            CertForgeError::InvalidRequest(format!("DNS name {name:?}: {e}"))
                        })
                })
                .collect::<Result<Vec<_>>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => Ok(dns.to_string()),
                _ => Err(CertForgeError::DecodingError(
                    "Unsupported general name type".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let oids: Vec<ObjectIdentifier> = self.usage.iter().map(|v| (*v).into()).collect();
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        let usage = eku.0.into_iter().map(ExtendedKeyUsageOption::from).collect();
        Ok(Self { usage })
    }
}

/// Represents an option for the Extended Key Usage extension.
///
/// Purposes without a named variant are carried as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    Other(ObjectIdentifier),
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
            ExtendedKeyUsageOption::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
            ExtendedKeyUsageOption::Other(oid) => oid,
        }
    }
}

impl From<ObjectIdentifier> for ExtendedKeyUsageOption {
    fn from(oid: ObjectIdentifier) -> Self {
        match oid {
            const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => ExtendedKeyUsageOption::OcspSigning,
            const_oid::db::rfc5912::ID_KP_SERVER_AUTH => ExtendedKeyUsageOption::ServerAuth,
            const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => ExtendedKeyUsageOption::ClientAuth,
            const_oid::db::rfc5912::ID_KP_CODE_SIGNING => ExtendedKeyUsageOption::CodeSigning,
            const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                ExtendedKeyUsageOption::EmailProtection
            }
            const_oid::db::rfc5912::ID_KP_TIME_STAMPING => ExtendedKeyUsageOption::TimeStamping,
            other => ExtendedKeyUsageOption::Other(other),
        }
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// The issuer name and serial are either both present or both absent.
///
/// # Fields
/// * `key_identifier` - The key identifier.
/// * `authority_cert_issuer` - The issuer's distinguished name.
/// * `authority_cert_serial_number` - The issuer's certificate serial number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
    pub authority_cert_issuer: Option<DistinguishedName>,
    pub authority_cert_serial_number: Option<Vec<u8>>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let authority_cert_issuer = self
            .authority_cert_issuer
            .as_ref()
            .map(|dn| vec![GeneralName::DirectoryName(dn.as_x509_name())]);

        let authority_cert_serial_number = self
            .authority_cert_serial_number
            .as_ref()
            .map(|serial| x509_cert::serial_number::SerialNumber::new(serial.as_slice()))
            .transpose()?;

        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.as_slice())?),
            authority_cert_issuer,
            authority_cert_serial_number,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;

        let authority_cert_issuer = aki.authority_cert_issuer.as_ref().and_then(|names| {
            names.iter().find_map(|name| match name {
                GeneralName::DirectoryName(dn) => Some(DistinguishedName::from_x509_name(dn)),
                _ => None,
            })
        });

        Ok(Self {
            key_identifier: aki
                .key_identifier
                .map(|id| id.as_bytes().to_vec())
                .unwrap_or_default(),
            authority_cert_issuer,
            authority_cert_serial_number: aki
                .authority_cert_serial_number
                .map(|sn| sn.as_bytes().to_vec()),
        })
    }
}

/// Represents the Subject Key Identifier (SKI) extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

/// A policy qualifier attached to a certificate policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyQualifier {
    /// URI of a certification practice statement.
    Cps(String),
    /// Explicit user-notice display text.
    UserNotice(String),
    /// A qualifier carried as encoded, such as a user notice with a notice
    /// reference or display text in a string type other than IA5 or UTF-8.
    Encoded(PolicyQualifierInfo),
}

/// One certificate policy; a bare policy has no qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePolicy {
    pub oid: ObjectIdentifier,
    pub qualifiers: Vec<PolicyQualifier>,
}

/// Represents the Certificate Policies extension, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificatePolicies {
    pub policies: Vec<CertificatePolicy>,
}

impl CertificatePolicies {
    /// Adds a policy, replacing the qualifiers of an existing entry with the
    /// same OID in place.
    pub fn insert(&mut self, oid: ObjectIdentifier, qualifiers: Vec<PolicyQualifier>) {
        match self.policies.iter_mut().find(|policy| policy.oid == oid) {
            Some(policy) => policy.qualifiers = qualifiers,
            None => self.policies.push(CertificatePolicy { oid, qualifiers }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// RFC 5280 `UserNotice`. `x509-cert` types `noticeRef` as a time, so the
/// sequence is declared here over its `NoticeReference` and `DisplayText`.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct UserNotice {
    notice_ref: Option<NoticeReference>,
    explicit_text: Option<DisplayText>,
}

fn display_text(text: &DisplayText) -> String {
    match text {
        DisplayText::Ia5String(text) => text.to_string(),
        DisplayText::Utf8String(text) => text.clone(),
    }
}

impl PolicyQualifier {
    fn to_info(&self) -> Result<PolicyQualifierInfo> {
        let info = match self {
            PolicyQualifier::Cps(uri) => {
                let uri = Ia5String::try_from(uri.clone()).map_err(|e| {
                    CertForgeError::InvalidRequest(format!("CPS URI {uri:?}: {e}"))
                })?;
                PolicyQualifierInfo {
                    policy_qualifier_id: ID_QT_CPS,
                    qualifier: Some(Any::encode_from(&uri)?),
                }
            }
            PolicyQualifier::UserNotice(text) => PolicyQualifierInfo {
                policy_qualifier_id: ID_QT_UNOTICE,
                qualifier: Some(Any::encode_from(&UserNotice {
                    notice_ref: None,
                    explicit_text: Some(DisplayText::Utf8String(text.clone())),
                })?),
            },
            PolicyQualifier::Encoded(info) => info.clone(),
        };
        Ok(info)
    }

    fn from_info(info: &PolicyQualifierInfo) -> Self {
        let decoded = match (info.policy_qualifier_id, &info.qualifier) {
            (ID_QT_CPS, Some(qualifier)) => qualifier
                .decode_as::<Ia5String>()
                .ok()
                .map(|uri| PolicyQualifier::Cps(uri.to_string())),
            (ID_QT_UNOTICE, Some(qualifier)) => match qualifier.decode_as::<UserNotice>() {
                Ok(UserNotice {
                    notice_ref: None,
                    explicit_text,
                }) => Some(PolicyQualifier::UserNotice(
                    explicit_text.as_ref().map(display_text).unwrap_or_default(),
                )),
                _ => None,
            },
            _ => None,
        };
        decoded.unwrap_or_else(|| PolicyQualifier::Encoded(info.clone()))
    }
}

impl ToAndFromX509Extension for CertificatePolicies {
    const OID: ObjectIdentifier = <certpolicy::CertificatePolicies as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let policies = self
            .policies
            .iter()
            .map(|policy| {
                let qualifiers = policy
                    .qualifiers
                    .iter()
                    .map(PolicyQualifier::to_info)
                    .collect::<Result<Vec<_>>>()?;
                Ok(PolicyInformation {
                    policy_identifier: policy.oid,
                    policy_qualifiers: (!qualifiers.is_empty()).then_some(qualifiers),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(certpolicy::CertificatePolicies(policies).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let policies = certpolicy::CertificatePolicies::from_der(extension)?
            .0
            .iter()
            .map(|info| CertificatePolicy {
                oid: info.policy_identifier,
                qualifiers: info
                    .policy_qualifiers
                    .iter()
                    .flatten()
                    .map(PolicyQualifier::from_info)
                    .collect(),
            })
            .collect();
        Ok(Self { policies })
    }
}
