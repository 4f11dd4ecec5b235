use crate::error::{CertForgeError, Result};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF))
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, requiring `label`.
pub fn pem_to_der(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str).map_err(|e| CertForgeError::DecodingError(e.to_string()))?;
    if pem.tag() != label {
        return Err(CertForgeError::DecodingError(format!(
            "expected PEM label {label}, found {}",
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_checked() {
        let pem = der_to_pem(&[0x05, 0x00], CERTIFICATE_LABEL);
        assert_eq!(pem_to_der(&pem, CERTIFICATE_LABEL).unwrap(), vec![0x05, 0x00]);
        assert!(matches!(
            pem_to_der(&pem, PRIVATE_KEY_LABEL),
            Err(CertForgeError::DecodingError(_))
        ));
    }
}
