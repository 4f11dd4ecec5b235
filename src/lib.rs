//! # CertForge - X.509 Certificate Issuance in Pure Rust
//!
//! CertForge issues X.509 v3 certificates from a declarative
//! [`CertificateRequest`](cert::params::CertificateRequest): it resolves a
//! signature algorithm name, generates a fresh key pair, draws a random serial
//! number, assembles the extensions, signs the result and hands back the
//! certificate together with its private key. Certificates are either
//! self-signed or signed by a previously issued or imported issuer.
//!
//! ## Supported Algorithms
//!
//! Signature algorithms are looked up by name, case-insensitively, in an
//! [`AlgorithmRegistry`](algorithm::AlgorithmRegistry):
//! - **RSA**: PKCS#1 v1.5 with MD2, MD5, SHA-1, SHA-2 and RIPEMD digests, and
//!   RSASSA-PSS (`...WITHRSAANDMGF1`) with SHA-1 and SHA-2
//! - **DSA**: SHA-1 and SHA-2 digests, 1024 to 3072-bit keys
//! - **ECDSA**: P-224, P-256, P-384, P-521 and secp256k1 keys
//!
//! GOST names are known but rejected as unsupported.
//!
//! ## Quick Start
//!
//! ### Generating a Self-Signed Certificate Authority
//!
//! ```rust,no_run
//! use certforge::{
//!     algorithm::AlgorithmRegistry, builder::CertificateBuilder, config::SignatureConfig,
//!     profile::CertificateProfile,
//! };
//! use rand_core::OsRng;
//!
//! # fn main() -> Result<(), certforge::error::CertForgeError> {
//! let registry = AlgorithmRegistry::new();
//! let config = SignatureConfig::builder()
//!     .signature_algorithm("SHA256WITHECDSA")
//!     .ec_curve_name("P-256")
//!     .build();
//! let builder = CertificateBuilder::new(&registry, &config);
//!
//! let request = CertificateProfile::CertificateAuthority.request("CN=Example CA", &config);
//! let ca = builder.build(&request, &mut OsRng)?;
//!
//! println!("{}", ca.certificate().to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing a Server Certificate and Exporting It
//!
//! ```rust,no_run
//! use certforge::{
//!     algorithm::AlgorithmRegistry, builder::CertificateBuilder, cert::CertificateWithPrivateKey,
//!     config::SignatureConfig, profile::CertificateProfile,
//! };
//! use rand_core::OsRng;
//!
//! # fn main() -> Result<(), certforge::error::CertForgeError> {
//! let registry = AlgorithmRegistry::new();
//! let config = SignatureConfig::default();
//! let builder = CertificateBuilder::new(&registry, &config);
//!
//! let ca = CertificateWithPrivateKey::from_pkcs12(&std::fs::read("ca.pfx").unwrap(), "ca-pass")?;
//!
//! let mut request = CertificateProfile::ClientServer.request("server.example.com", &config);
//! request.issuer = Some(ca);
//! request.subject_alt_names = vec!["server.example.com".to_string()];
//!
//! let server = builder.build(&request, &mut OsRng)?;
//! let bundle = server.to_pkcs12("server-pass", &mut OsRng)?;
//! std::fs::write("server.pfx", bundle.as_der()).unwrap();
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::CertForgeError`]:
//!
//! ```rust
//! use certforge::{algorithm::AlgorithmRegistry, error::CertForgeError};
//!
//! match AlgorithmRegistry::new().resolve("NOTAREALALG") {
//!     Ok(spec) => println!("resolved {}", spec.name),
//!     Err(CertForgeError::UnsupportedAlgorithm(msg)) => println!("unsupported: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events and spans and never installs a
//! subscriber.
//!
//! ## Module Organization
//!
//! - [`algorithm`]: Signature algorithm names and their cipher, digest and padding
//! - [`key`]: Key pair generation, named curves and PKCS#8 import/export
//! - [`builder`]: Request validation and certificate issuance
//! - [`profile`] and [`batch`]: Preset requests and numbered batches
//! - [`cert`]: Certificates, requests and X.509 extensions
//! - [`issuer`]: The signing side of issuance
//! - [`bundle`]: PKCS#12 export and import
//! - [`config`]: Signature settings
//! - [`error`]: Error types

pub mod algorithm;
pub mod batch;
pub mod builder;
pub mod bundle;
pub mod cert;
pub mod config;
pub mod error;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod pki;
pub mod profile;
pub mod tbs_certificate;
