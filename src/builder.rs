//! Turns a [`CertificateRequest`] into a signed certificate and its key.

use rand_core::CryptoRngCore;
use tracing::{debug, info, instrument};

use crate::algorithm::{AlgorithmRegistry, SignatureAlgorithmSpec};
use crate::cert::extensions::{
    BasicConstraints, ExtendedKeyUsage, SubjectAltName, SubjectKeyIdentifier,
};
use crate::cert::params::{
    CertificateRequest, CertificationRequestInfo, DistinguishedName, ExtensionParam, Validity,
};
use crate::cert::{CertificateWithPrivateKey, SelfIssuer};
use crate::config::SignatureConfig;
use crate::error::{CertForgeError, Result};
use crate::issuer::{Issuer, generate_serial_number, key_identifier};
use crate::key::{KeyPair, KeyPairGenerator};

/// Everything validated about a request before any key material exists.
struct ValidatedRequest<'r> {
    subject: DistinguishedName,
    spec: &'r SignatureAlgorithmSpec,
    validity: Validity,
}

/// Builds certificates from requests.
///
/// Holds the algorithm registry by reference and a key generator configured
/// from a [`SignatureConfig`]. Each call to [`build`](Self::build) produces a
/// new key pair and serial number.
#[derive(Debug, Clone)]
pub struct CertificateBuilder<'a> {
    registry: &'a AlgorithmRegistry,
    generator: KeyPairGenerator,
}

impl<'a> CertificateBuilder<'a> {
    pub fn new(registry: &'a AlgorithmRegistry, config: &SignatureConfig) -> Self {
        Self {
            registry,
            generator: KeyPairGenerator::from_config(config),
        }
    }

    /// Issues a certificate for `request`.
    ///
    /// # Errors
    /// * `InvalidRequest` for an empty or malformed subject, an empty algorithm
    ///   name, a missing issuer on a chain-issued request, an issuer whose key
    ///   family differs from the algorithm, or an empty validity window.
    /// * `UnsupportedAlgorithm` when the algorithm does not resolve.
    /// * `UnsupportedCurve` and `KeyGenerationError` from key generation.
    #[instrument(
        skip_all,
        fields(subject = %request.subject_name, algorithm = %request.signature_algorithm)
    )]
    pub fn build<R: CryptoRngCore>(
        &self,
        request: &CertificateRequest,
        rng: &mut R,
    ) -> Result<CertificateWithPrivateKey> {
        let validated = self.validate(request)?;

        let subject_key = self.generator.generate(validated.spec, rng)?;
        let subject_public_key = subject_key.public_key_info()?;
        let serial_number = generate_serial_number(rng);
        debug!(serial = %hex::encode(&serial_number), "drew serial number");

        let request_info = CertificationRequestInfo {
            subject: validated.subject.clone(),
            extensions: subject_extensions(request, &key_identifier(&subject_public_key))?,
            subject_public_key,
            serial_number: serial_number.clone(),
            validity: validated.validity,
        };

        let cert = match &request.issuer {
            Some(issuer) if !request.is_self_signed => {
                issuer.issue(&request_info, validated.spec, rng)?
            }
            _ => {
                let self_issuer = SelfIssuer {
                    name: validated.subject,
                    key: &subject_key,
                    serial_number,
                };
                self_issuer.issue(&request_info, validated.spec, rng)?
            }
        };

        info!(
            subject = %cert.subject(),
            issuer = %cert.issuer(),
            serial = %hex::encode(cert.serial_number()),
            "issued certificate"
        );
        Ok(CertificateWithPrivateKey::from_issued(cert, subject_key))
    }

    fn validate<'r>(&'r self, request: &CertificateRequest) -> Result<ValidatedRequest<'r>> {
        let subject = DistinguishedName::parse(&request.subject_name)?;

        let algorithm = request.signature_algorithm.trim();
        if algorithm.is_empty() {
            return Err(CertForgeError::InvalidRequest(
                "signature algorithm is empty".to_string(),
            ));
        }

        let issuer_key = match (&request.issuer, request.is_self_signed) {
            (_, true) => None,
            (Some(issuer), false) => Some(issuer.key()),
            (None, false) => {
                return Err(CertForgeError::InvalidRequest(
                    "an issuer is required unless the certificate is self-signed".to_string(),
                ));
            }
        };

        let spec = self.registry.resolve(algorithm)?;
        debug!(algorithm = spec.name, family = ?spec.cipher_family, "resolved algorithm");

        if let Some(issuer_key) = issuer_key.map(KeyPair::family) {
            if issuer_key != spec.cipher_family {
                return Err(CertForgeError::InvalidRequest(format!(
                    "{} cannot be signed by a {:?} issuer key",
                    spec.name, issuer_key
                )));
            }
        }

        let validity = request.validity()?;
        Ok(ValidatedRequest {
            subject,
            spec,
            validity,
        })
    }
}

/// Extensions after the Authority Key Identifier, in encoding order.
fn subject_extensions(
    request: &CertificateRequest,
    subject_key_id: &[u8],
) -> Result<Vec<ExtensionParam>> {
    let mut extensions = vec![
        ExtensionParam::from_extension(&SubjectKeyIdentifier(subject_key_id.to_vec()), false)?,
        ExtensionParam::from_extension(
            &BasicConstraints {
                is_ca: request.is_certificate_authority,
                max_path_length: None,
            },
            true,
        )?,
    ];

    if let Some(key_usage) = &request.key_usage {
        extensions.push(ExtensionParam::from_extension(key_usage, false)?);
    }

    if !request.extended_key_usages.is_empty() {
        let extended_key_usage = ExtendedKeyUsage {
            usage: request.extended_key_usages.clone(),
        };
        extensions.push(ExtensionParam::from_extension(&extended_key_usage, false)?);
    }

    if !request.subject_alt_names.is_empty() {
        let san = SubjectAltName {
            names: request.subject_alt_names.clone(),
        };
        extensions.push(ExtensionParam::from_extension(&san, false)?);
    }

    if !request.certificate_policies.is_empty() {
        extensions.push(ExtensionParam::from_extension(
            &request.certificate_policies,
            false,
        )?);
    }

    Ok(extensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{
        AuthorityKeyIdentifier, CertificatePolicies, ExtendedKeyUsageOption, KeyUsage, KeyUsages,
        ToAndFromX509Extension,
    };
    use rand_core::OsRng;

    fn p256_builder(registry: &AlgorithmRegistry) -> CertificateBuilder<'_> {
        CertificateBuilder::new(
            registry,
            &SignatureConfig::builder().ec_curve_name("P-256").build(),
        )
    }

    fn self_signed(subject: &str) -> CertificateRequest {
        CertificateRequest::builder()
            .subject_name(subject)
            .is_self_signed(true)
            .signature_algorithm("SHA256WITHECDSA")
            .build()
    }

    #[test]
    fn test_extension_order() {
        let registry = AlgorithmRegistry::new();
        let mut request = self_signed("CN=ordered");
        request.key_usage = Some(KeyUsage(KeyUsages::DigitalSignature.into()));
        request.extended_key_usages = vec![ExtendedKeyUsageOption::ServerAuth];
        request.subject_alt_names = vec!["ordered.example".to_string()];
        request.add_certificate_policy(
            const_oid::ObjectIdentifier::new_unwrap("2.23.140.1.2.1"),
            vec![],
        );

        let issued = p256_builder(&registry).build(&request, &mut OsRng).unwrap();
        let oids: Vec<_> = issued
            .certificate()
            .extensions()
            .iter()
            .map(|ext| ext.oid)
            .collect();
        assert_eq!(
            oids,
            vec![
                AuthorityKeyIdentifier::OID,
                SubjectKeyIdentifier::OID,
                BasicConstraints::OID,
                KeyUsage::OID,
                ExtendedKeyUsage::OID,
                SubjectAltName::OID,
                CertificatePolicies::OID,
            ]
        );
    }

    #[test]
    fn test_minimal_request_omits_optional_extensions() {
        let registry = AlgorithmRegistry::new();
        let issued = p256_builder(&registry)
            .build(&self_signed("bare-name"), &mut OsRng)
            .unwrap();
        let cert = issued.certificate();
        assert_eq!(cert.subject().to_string(), "CN=bare-name");
        assert_eq!(cert.extensions().len(), 3);
        assert!(cert.extension::<SubjectAltName>().unwrap().is_none());
        assert!(cert.extension::<KeyUsage>().unwrap().is_none());
        let bc = cert.extension::<BasicConstraints>().unwrap().unwrap();
        assert!(!bc.is_ca);
    }

    #[test]
    fn test_default_curve_signs_with_p521() {
        let registry = AlgorithmRegistry::new();
        let builder = CertificateBuilder::new(&registry, &SignatureConfig::default());
        let issued = builder
            .build(&self_signed("CN=p521"), &mut OsRng)
            .unwrap();
        assert_eq!(issued.key().curve(), Some(crate::key::NamedCurve::P521));
        assert_eq!(
            issued.certificate().signature_algorithm().oid,
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256
        );
    }

    #[test]
    fn test_self_signed_aki_names_itself() {
        let registry = AlgorithmRegistry::new();
        let issued = p256_builder(&registry)
            .build(&self_signed("CN=self"), &mut OsRng)
            .unwrap();
        let cert = issued.certificate();
        let aki = cert.extension::<AuthorityKeyIdentifier>().unwrap().unwrap();
        let ski = cert.extension::<SubjectKeyIdentifier>().unwrap().unwrap();
        assert_eq!(aki.key_identifier, ski.0);
        assert_eq!(aki.authority_cert_issuer, Some(cert.subject()));
        assert_eq!(
            aki.authority_cert_serial_number.as_deref(),
            Some(cert.serial_number())
        );
    }

    #[test]
    fn test_validation_errors_precede_key_generation() {
        let registry = AlgorithmRegistry::new();
        let builder = p256_builder(&registry);

        let mut request = self_signed("CN=x");
        request.subject_name = String::new();
        assert!(matches!(
            builder.build(&request, &mut OsRng),
            Err(CertForgeError::InvalidRequest(_))
        ));

        let mut request = self_signed("CN=x");
        request.signature_algorithm = " ".to_string();
        assert!(matches!(
            builder.build(&request, &mut OsRng),
            Err(CertForgeError::InvalidRequest(_))
        ));

        let mut request = self_signed("CN=x");
        request.is_self_signed = false;
        assert!(matches!(
            builder.build(&request, &mut OsRng),
            Err(CertForgeError::InvalidRequest(_))
        ));

        let mut request = self_signed("CN=x");
        request.signature_algorithm = "NOTAREALALG".to_string();
        assert!(matches!(
            builder.build(&request, &mut OsRng),
            Err(CertForgeError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_issuer_key_family_must_match() {
        let registry = AlgorithmRegistry::new();
        let builder = p256_builder(&registry);
        let mut ca_request = self_signed("CN=ca");
        ca_request.is_certificate_authority = true;
        let ca = builder.build(&ca_request, &mut OsRng).unwrap();

        let request = CertificateRequest::builder()
            .subject_name("CN=leaf")
            .issuer(ca)
            .signature_algorithm("SHA256WITHRSA")
            .build();
        assert!(matches!(
            builder.build(&request, &mut OsRng),
            Err(CertForgeError::InvalidRequest(_))
        ));
    }
}
