use std::time::SystemTime;

use der::Encode;
use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::Time;

use crate::cert::params::{DistinguishedName, ExtensionParam};
use crate::error::{CertForgeError, Result};

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian serial number bytes.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - X.509 extensions, in encoding order.
#[derive(Clone, Debug)]
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub issuer: DistinguishedName,
    pub not_before: time::OffsetDateTime,
    pub not_after: time::OffsetDateTime,
    pub subject: DistinguishedName,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.clone(),
            issuer: self.issuer.as_x509_name(),
            validity,
            subject: self.subject.as_x509_name(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Creates a `TbsCertificate` from a `TbsCertificateInner`.
    pub fn from_tbs_certificate_inner(inner: &TbsCertificateInner) -> Self {
        let extensions = inner
            .extensions
            .iter()
            .flatten()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect::<Vec<_>>();

        Self {
            serial_number: inner.serial_number.as_bytes().to_vec(),
            signature_algorithm: inner.signature.clone(),
            issuer: DistinguishedName::from_x509_name(&inner.issuer),
            not_before: from_x509_time(&inner.validity.not_before),
            not_after: from_x509_time(&inner.validity.not_after),
            subject: DistinguishedName::from_x509_name(&inner.subject),
            subject_public_key: inner.subject_public_key_info.clone(),
            extensions,
        }
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.to_tbs_certificate_inner()?
            .to_der()
            .map_err(|e| CertForgeError::EncodingError(e.to_string()))
    }
}

/// RFC 5280 4.1.2.5: UTCTime through 2049, GeneralizedTime from 2050 on.
pub(crate) fn to_x509_time(at: time::OffsetDateTime) -> Result<Time> {
    let system_time = SystemTime::from(at);
    let encoded = if (1950..2050).contains(&at.year()) {
        Time::UtcTime(UtcTime::from_system_time(system_time)?)
    } else {
        Time::GeneralTime(GeneralizedTime::from_system_time(system_time)?)
    };
    Ok(encoded)
}

pub(crate) fn from_x509_time(at: &Time) -> time::OffsetDateTime {
    match at {
        Time::UtcTime(ut) => time::OffsetDateTime::from(ut.to_system_time()),
        Time::GeneralTime(gt) => time::OffsetDateTime::from(gt.to_system_time()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_time_encoding_switches_at_2050() {
        assert!(matches!(
            to_x509_time(datetime!(2049-12-31 23:59:59 UTC)).unwrap(),
            Time::UtcTime(_)
        ));
        assert!(matches!(
            to_x509_time(datetime!(2050-01-01 00:00 UTC)).unwrap(),
            Time::GeneralTime(_)
        ));
    }

    #[test]
    fn test_time_round_trip() {
        let at = datetime!(2031-06-15 00:00 UTC);
        assert_eq!(from_x509_time(&to_x509_time(at).unwrap()), at);
    }
}
