//! Content codecs addressed by name.

use crate::error::DecodeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Codec id used for base64 content in cloud-init `write_files`
pub const B64: &str = "b64";

/// Decode `data` with the codec named `encoding`
///
/// # Errors
///
/// [`DecodeError::UnknownEncoding`] for codec names other than `b64`/`base64`,
/// [`DecodeError::Malformed`] when the data is not valid for the codec.
pub fn decode(encoding: &str, data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    match encoding {
        "b64" | "base64" => {
            // Multi-line base64 is common in manifests
            let compact: Vec<u8> = data
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(compact)
                .map_err(|source| DecodeError::Malformed {
                    encoding: encoding.to_string(),
                    source,
                })
        }
        other => Err(DecodeError::UnknownEncoding(other.to_string())),
    }
}

/// Encode `data` as standard padded base64
#[must_use]
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}
