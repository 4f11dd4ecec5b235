#![allow(dead_code)]

use std::sync::LazyLock;

use certforge::algorithm::AlgorithmRegistry;
use certforge::builder::CertificateBuilder;
use certforge::cert::CertificateWithPrivateKey;
use certforge::config::SignatureConfig;
use certforge::profile::CertificateProfile;
use rand_core::OsRng;

pub static REGISTRY: LazyLock<AlgorithmRegistry> = LazyLock::new(AlgorithmRegistry::new);

/// P-256 keeps ECDSA tests fast; RSA and DSA use the configured floors.
pub fn test_config() -> SignatureConfig {
    curve_config("P-256")
}

pub fn curve_config(curve: &str) -> SignatureConfig {
    SignatureConfig::builder().ec_curve_name(curve).build()
}

pub fn builder() -> CertificateBuilder<'static> {
    CertificateBuilder::new(&REGISTRY, &test_config())
}

pub fn generate_ca_cert(algorithm: &str) -> CertificateWithPrivateKey {
    generate_ca_cert_with(algorithm, &test_config())
}

pub fn generate_ca_cert_with(
    algorithm: &str,
    config: &SignatureConfig,
) -> CertificateWithPrivateKey {
    let mut request = CertificateProfile::CertificateAuthority.request("CN=myca.local", config);
    request.signature_algorithm = algorithm.to_string();
    CertificateBuilder::new(&REGISTRY, config)
        .build(&request, &mut OsRng)
        .unwrap()
}

pub fn generate_leaf_cert(
    issuer: &CertificateWithPrivateKey,
    subject: &str,
    algorithm: &str,
) -> CertificateWithPrivateKey {
    generate_leaf_cert_with(issuer, subject, algorithm, &test_config())
}

pub fn generate_leaf_cert_with(
    issuer: &CertificateWithPrivateKey,
    subject: &str,
    algorithm: &str,
    config: &SignatureConfig,
) -> CertificateWithPrivateKey {
    let mut request = CertificateProfile::ClientServer.request(subject, config);
    request.issuer = Some(issuer.clone());
    request.signature_algorithm = algorithm.to_string();
    CertificateBuilder::new(&REGISTRY, config)
        .build(&request, &mut OsRng)
        .unwrap()
}
