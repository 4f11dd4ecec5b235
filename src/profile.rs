//! Preconfigured requests for the common kinds of certificate.

use crate::cert::extensions::{ExtendedKeyUsageOption, KeyUsage, KeyUsages};
use crate::cert::params::{CertificateRequest, Validity};
use crate::config::SignatureConfig;

const PROFILE_VALIDITY_YEARS: i32 = 10;

/// A named starting point for a [`CertificateRequest`].
///
/// Every profile except [`Empty`](Self::Empty) is valid for ten years from
/// today. Chain-issued profiles still need an issuer set on the returned
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateProfile {
    SelfSigned,
    CertificateAuthority,
    /// Self-signed CA restricted to signing code, certificates and CRLs.
    CodeSigningAuthority,
    CodeSigning,
    ClientServer,
    /// Server and client authentication with key and data encipherment.
    MonitoringAgent,
    Empty,
}

impl CertificateProfile {
    /// Returns a request for `subject_name` signed with the configured
    /// default algorithm.
    pub fn request(
        self,
        subject_name: impl Into<String>,
        config: &SignatureConfig,
    ) -> CertificateRequest {
        let mut request = CertificateRequest::builder()
            .subject_name(subject_name)
            .signature_algorithm(config.signature_algorithm.clone())
            .build();
        if self == Self::Empty {
            return request;
        }
        request.not_after = Some(Validity::for_years(PROFILE_VALIDITY_YEARS).not_after);

        match self {
            Self::SelfSigned => {
                request.is_self_signed = true;
            }
            Self::CertificateAuthority => {
                request.is_self_signed = true;
                request.is_certificate_authority = true;
            }
            Self::CodeSigningAuthority => {
                request.is_self_signed = true;
                request.is_certificate_authority = true;
                request.key_usage = Some(KeyUsage(
                    KeyUsages::DigitalSignature | KeyUsages::KeyCertSign | KeyUsages::CRLSign,
                ));
            }
            Self::CodeSigning => {
                request.extended_key_usages = vec![ExtendedKeyUsageOption::CodeSigning];
            }
            Self::ClientServer => {
                request.extended_key_usages = client_server_usages();
            }
            Self::MonitoringAgent => {
                request.key_usage = Some(KeyUsage(
                    KeyUsages::DigitalSignature
                        | KeyUsages::KeyEncipherment
                        | KeyUsages::DataEncipherment,
                ));
                request.extended_key_usages = client_server_usages();
            }
            Self::Empty => {}
        }
        request
    }
}

fn client_server_usages() -> Vec<ExtendedKeyUsageOption> {
    vec![
        ExtendedKeyUsageOption::ServerAuth,
        ExtendedKeyUsageOption::ClientAuth,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn test_empty_profile_has_defaults_only() {
        let request = CertificateProfile::Empty.request("CN=x", &SignatureConfig::default());
        assert_eq!(request.signature_algorithm, "SHA256WITHRSA");
        assert!(!request.is_self_signed);
        assert!(request.not_after.is_none());
        assert!(request.key_usage.is_none());
        assert!(request.extended_key_usages.is_empty());
    }

    #[test]
    fn test_ten_year_validity() {
        let request =
            CertificateProfile::ClientServer.request("CN=x", &SignatureConfig::default());
        let not_after = request.not_after.unwrap();
        assert_eq!(not_after.year(), OffsetDateTime::now_utc().year() + 10);
        assert!(request.validity().is_ok());
    }

    #[test]
    fn test_authority_profiles() {
        let config = SignatureConfig::builder()
            .signature_algorithm("SHA384WITHECDSA")
            .build();
        let ca = CertificateProfile::CertificateAuthority.request("CN=ca", &config);
        assert!(ca.is_self_signed && ca.is_certificate_authority);
        assert_eq!(ca.signature_algorithm, "SHA384WITHECDSA");
        assert!(ca.key_usage.is_none());

        let code_ca = CertificateProfile::CodeSigningAuthority.request("CN=ca", &config);
        let usage = code_ca.key_usage.unwrap().0;
        assert!(usage.contains(KeyUsages::KeyCertSign));
        assert!(usage.contains(KeyUsages::CRLSign));
        assert!(!usage.contains(KeyUsages::KeyEncipherment));
    }

    #[test]
    fn test_monitoring_agent_usages() {
        let request =
            CertificateProfile::MonitoringAgent.request("CN=agent", &SignatureConfig::default());
        assert!(!request.is_self_signed);
        assert_eq!(request.extended_key_usages, client_server_usages());
        assert!(request.key_usage.unwrap().0.contains(KeyUsages::DataEncipherment));
    }
}
