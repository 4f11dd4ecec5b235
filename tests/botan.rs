mod util;

use botan::Certificate as BotanCertificate;

fn check_cert(cert_der: &[u8]) {
    // Use botan crate to parse the DER and assert it succeeds
    BotanCertificate::load(cert_der).expect("Botan failed to parse certificate");
}

fn check_algorithm(algorithm: &str) {
    let ca = util::generate_ca_cert(algorithm);
    check_cert(&ca.certificate().to_der().unwrap());
}

#[test]
#[ignore]
fn test_botan_rsa() {
    check_algorithm("SHA256WITHRSA");
}

#[test]
#[ignore]
fn test_botan_rsa_pss() {
    check_algorithm("SHA256WITHRSAANDMGF1");
}

#[test]
#[ignore]
fn test_botan_dsa() {
    check_algorithm("SHA256WITHDSA");
}

#[test]
#[ignore]
fn test_botan_ecdsa_p256() {
    check_algorithm("SHA256WITHECDSA");
}

#[test]
#[ignore]
fn test_botan_chain() {
    let ca = util::generate_ca_cert("SHA384WITHECDSA");
    let leaf = util::generate_leaf_cert(&ca, "crabs.crabs", "SHA384WITHECDSA");
    check_cert(&leaf.certificate().to_der().unwrap());
}
