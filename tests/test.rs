mod util;

use std::collections::HashSet;

use certforge::batch::{BatchIssuer, BatchNaming};
use certforge::bundle::Bundle;
use certforge::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption,
    SubjectAltName, SubjectKeyIdentifier,
};
use certforge::cert::params::CertificateRequest;
use certforge::cert::{Certificate, CertificateWithPrivateKey};
use certforge::error::CertForgeError;
use certforge::key::KeyPair;
use certforge::profile::CertificateProfile;
use rand_core::OsRng;

pub type Result<T> = std::result::Result<T, CertForgeError>;

/// Issues a self-signed certificate for each supported key family and checks
/// it round-trips through PEM.
#[test]
fn self_signed_per_family() -> Result<()> {
    for algorithm in ["SHA256WITHRSA", "SHA256WITHDSA", "SHA256WITHECDSA"] {
        let ca = util::generate_ca_cert(algorithm);
        let cert = ca.certificate();
        assert_eq!(cert.subject(), cert.issuer(), "{algorithm}");
        assert_eq!(cert.subject().common_name().as_deref(), Some("myca.local"));

        let reparsed = Certificate::from_pem(&cert.to_pem()?)?;
        assert_eq!(&reparsed, cert);

        let bc = cert.extension::<BasicConstraints>()?.unwrap();
        assert!(bc.is_ca);
    }
    Ok(())
}

#[test]
fn chain_issued_names_parent_as_issuer() -> Result<()> {
    let ca = util::generate_ca_cert("SHA256WITHECDSA");
    let leaf = util::generate_leaf_cert(&ca, "server.myca.local", "SHA384WITHECDSA");
    let cert = leaf.certificate();

    assert_eq!(cert.issuer(), ca.certificate().subject());
    assert_eq!(cert.subject().to_string(), "CN=server.myca.local");
    assert_ne!(cert.serial_number(), ca.certificate().serial_number());

    let ca_ski = ca.certificate().extension::<SubjectKeyIdentifier>()?.unwrap();
    let aki = cert.extension::<AuthorityKeyIdentifier>()?.unwrap();
    assert_eq!(aki.key_identifier, ca_ski.0);
    assert!(aki.authority_cert_issuer.is_none());
    Ok(())
}

#[test]
fn subject_alt_names_and_usages_follow_the_request() -> Result<()> {
    let ca = util::generate_ca_cert("SHA256WITHECDSA");
    let mut request = CertificateProfile::ClientServer.request("CN=multi", &util::test_config());
    request.issuer = Some(ca);
    request.signature_algorithm = "SHA256WITHECDSA".to_string();
    request.subject_alt_names = vec!["name1".into(), "name2".into(), "name3".into()];

    let builder = util::builder();
    let issued = builder.build(&request, &mut OsRng)?;
    let san = issued.certificate().extension::<SubjectAltName>()?.unwrap();
    let names: HashSet<_> = san.names.into_iter().collect();
    assert_eq!(names, HashSet::from(["name1".into(), "name2".into(), "name3".into()]));

    let eku = issued.certificate().extension::<ExtendedKeyUsage>()?.unwrap();
    assert_eq!(
        eku.usage,
        vec![ExtendedKeyUsageOption::ServerAuth, ExtendedKeyUsageOption::ClientAuth]
    );

    request.subject_alt_names.clear();
    request.extended_key_usages = vec![ExtendedKeyUsageOption::CodeSigning];
    let rebuilt = builder.build(&request, &mut OsRng)?;
    assert!(rebuilt.certificate().extension::<SubjectAltName>()?.is_none());
    let eku = rebuilt.certificate().extension::<ExtendedKeyUsage>()?.unwrap();
    assert_eq!(eku.usage, vec![ExtendedKeyUsageOption::CodeSigning]);
    Ok(())
}

#[test]
fn rejected_requests() {
    let builder = util::builder();

    let unknown = CertificateRequest::builder()
        .subject_name("CN=x")
        .is_self_signed(true)
        .signature_algorithm("NOTAREALALG")
        .build();
    assert!(matches!(
        builder.build(&unknown, &mut OsRng),
        Err(CertForgeError::UnsupportedAlgorithm(_))
    ));

    let gost = CertificateRequest::builder()
        .subject_name("CN=x")
        .is_self_signed(true)
        .signature_algorithm("GOST3411WITHGOST3410")
        .build();
    assert!(matches!(
        builder.build(&gost, &mut OsRng),
        Err(CertForgeError::UnsupportedAlgorithm(_))
    ));

    let empty_subject = CertificateRequest::builder()
        .subject_name("")
        .is_self_signed(true)
        .signature_algorithm("SHA256WITHECDSA")
        .build();
    assert!(matches!(
        builder.build(&empty_subject, &mut OsRng),
        Err(CertForgeError::InvalidRequest(_))
    ));

    let orphan = CertificateRequest::builder()
        .subject_name("CN=orphan")
        .signature_algorithm("SHA256WITHECDSA")
        .build();
    assert!(matches!(
        builder.build(&orphan, &mut OsRng),
        Err(CertForgeError::InvalidRequest(_))
    ));
}

#[test]
fn batch_has_distinct_serials_and_names() -> Result<()> {
    let ca = util::generate_ca_cert("SHA256WITHECDSA");
    let mut template = CertificateProfile::Empty.request("init", &util::test_config());
    template.issuer = Some(ca);
    template.signature_algorithm = "SHA256WITHECDSA".to_string();
    template.extended_key_usages = vec![
        ExtendedKeyUsageOption::ServerAuth,
        ExtendedKeyUsageOption::ClientAuth,
    ];

    let naming = BatchNaming {
        prefix: "agent".to_string(),
        first: 1,
        last: 5,
        leading_zeros: 2,
    };
    let builder = util::builder();
    let mut rng = OsRng;
    let issued = BatchIssuer::new(&builder, template, naming, &mut rng)
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(issued.len(), 5);
    assert_eq!(issued[0].0, "01");
    assert_eq!(
        issued[4].1.certificate().subject().to_string(),
        "CN=agent05"
    );
    let serials: HashSet<Vec<u8>> = issued
        .iter()
        .map(|(_, cert)| cert.certificate().serial_number().to_vec())
        .collect();
    let subjects: HashSet<String> = issued
        .iter()
        .map(|(_, cert)| cert.certificate().subject().to_string())
        .collect();
    assert_eq!(serials.len(), 5);
    assert_eq!(subjects.len(), 5);
    Ok(())
}

#[test]
fn bundle_round_trip() -> Result<()> {
    let ca = util::generate_ca_cert("SHA256WITHECDSA");
    let bundle = ca.to_pkcs12("correct horse", &mut OsRng)?;

    let opened = Bundle::from_der(bundle.as_der().to_vec()).open("correct horse")?;
    assert_eq!(opened.certificate(), ca.certificate());
    assert!(opened.key().matches(ca.certificate().public_key_info())?);

    assert!(matches!(
        bundle.open("battery staple"),
        Err(CertForgeError::KeyRecoveryFailure(_))
    ));

    let empty_passphrase = ca.to_pkcs12("", &mut OsRng)?;
    CertificateWithPrivateKey::from_pkcs12(empty_passphrase.as_der(), "")?;
    Ok(())
}

/// An issuer loaded from PEM can sign, and a key from another certificate is
/// refused.
#[test]
fn issuer_from_pem_pair() -> Result<()> {
    let ca = util::generate_ca_cert("SHA256WITHECDSA");
    let cert_pem = ca.certificate().to_pem()?;
    let key_pem = ca.key().to_pkcs8_pem()?;

    let loaded = CertificateWithPrivateKey::from_pem(&cert_pem, &key_pem)?;
    let leaf = util::generate_leaf_cert(&loaded, "CN=leaf", "SHA256WITHECDSA");
    assert_eq!(leaf.certificate().issuer(), ca.certificate().subject());

    let other = util::generate_ca_cert("SHA256WITHECDSA");
    let other_key = KeyPair::from_pkcs8_pem(&other.key().to_pkcs8_pem()?)?;
    assert!(matches!(
        CertificateWithPrivateKey::new(ca.certificate().clone(), other_key),
        Err(CertForgeError::KeyRecoveryFailure(_))
    ));
    Ok(())
}
