//! Issuing a numbered run of certificates from one request.

use std::ops::RangeInclusive;

use rand_core::CryptoRngCore;
use tracing::debug;

use crate::builder::CertificateBuilder;
use crate::cert::CertificateWithPrivateKey;
use crate::cert::params::{CertificateRequest, normalize_subject_name};
use crate::error::Result;

/// How the subjects of a batch are named.
///
/// Number `n` becomes `prefix` followed by `n` padded with zeros to at least
/// `leading_zeros` digits, then normalized to `CN=` form when it carries no
/// attribute prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchNaming {
    pub prefix: String,
    pub first: u64,
    pub last: u64,
    pub leading_zeros: usize,
}

impl BatchNaming {
    /// The number without the prefix, e.g. `007` for `7` with three digits.
    pub fn suffix(&self, number: u64) -> String {
        format!("{number:0width$}", width = self.leading_zeros)
    }

    pub fn subject_name(&self, number: u64) -> String {
        normalize_subject_name(&format!("{}{}", self.prefix, self.suffix(number)))
    }

    /// Empty when `first` is greater than `last`.
    pub fn numbers(&self) -> RangeInclusive<u64> {
        self.first..=self.last
    }
}

/// Iterator that builds one certificate per batch number.
///
/// The template request is reused with only the subject name changed, so
/// every certificate gets its own key pair and serial number. Errors are
/// yielded per item and do not stop the iteration.
pub struct BatchIssuer<'b, 'r, R> {
    builder: &'b CertificateBuilder<'r>,
    template: CertificateRequest,
    naming: BatchNaming,
    numbers: RangeInclusive<u64>,
    rng: &'b mut R,
}

impl<'b, 'r, R: CryptoRngCore> BatchIssuer<'b, 'r, R> {
    pub fn new(
        builder: &'b CertificateBuilder<'r>,
        template: CertificateRequest,
        naming: BatchNaming,
        rng: &'b mut R,
    ) -> Self {
        Self {
            builder,
            template,
            numbers: naming.numbers(),
            naming,
            rng,
        }
    }
}

impl<R: CryptoRngCore> Iterator for BatchIssuer<'_, '_, R> {
    /// The rendered suffix and the certificate issued for it.
    type Item = Result<(String, CertificateWithPrivateKey)>;

    fn next(&mut self) -> Option<Self::Item> {
        let number = self.numbers.next()?;
        let subject_name = self.naming.subject_name(number);
        debug!(number, subject = %subject_name, "issuing batch certificate");

        self.template.subject_name = subject_name;
        let suffix = self.naming.suffix(number);
        Some(
            self.builder
                .build(&self.template, self.rng)
                .map(|issued| (suffix, issued)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.numbers.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming(prefix: &str, leading_zeros: usize) -> BatchNaming {
        BatchNaming {
            prefix: prefix.to_string(),
            first: 1,
            last: 3,
            leading_zeros,
        }
    }

    #[test]
    fn test_subject_names_are_padded() {
        let naming = naming("node", 3);
        assert_eq!(naming.subject_name(7), "CN=node007");
        assert_eq!(naming.subject_name(1234), "CN=node1234");
    }

    #[test]
    fn test_prefixed_names_are_kept() {
        let naming = naming("O=Acme, CN=host-", 0);
        assert_eq!(naming.subject_name(2), "O=Acme, CN=host-2");
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let naming = BatchNaming {
            prefix: "x".to_string(),
            first: 5,
            last: 4,
            leading_zeros: 0,
        };
        assert_eq!(naming.numbers().count(), 0);
    }
}
