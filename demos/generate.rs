use certforge::algorithm::AlgorithmRegistry;
use certforge::builder::CertificateBuilder;
use certforge::config::SignatureConfig;
use certforge::error::Result;
use certforge::profile::CertificateProfile;
use rand_core::OsRng;

fn main() -> Result<()> {
    let registry = AlgorithmRegistry::new();
    // ECDSA on P-256; switch the algorithm name for RSA or DSA
    let config = SignatureConfig::builder()
        .signature_algorithm("SHA256WITHECDSA")
        .ec_curve_name("P-256")
        .build();
    let builder = CertificateBuilder::new(&registry, &config);

    // Build the CA certificate (self-signed)
    let ca_request = CertificateProfile::CertificateAuthority.request("CN=My Test CA", &config);
    let ca = builder.build(&ca_request, &mut OsRng)?;

    println!("CA Certificate PEM:\n{}", ca.certificate().to_pem()?);

    let mut server_request = CertificateProfile::ClientServer.request("myserver.local", &config);
    server_request.subject_alt_names = vec!["myserver.local".to_string()];
    // The issuer is the CA.
    server_request.issuer = Some(ca);

    let server = builder.build(&server_request, &mut OsRng)?;

    println!("Server Certificate PEM:\n{}", server.certificate().to_pem()?);
    println!("Server Key PEM:\n{}", server.key().to_pkcs8_pem()?);

    Ok(())
}
