//! # Content Resolution
//!
//! Resolves the bytes of a file from inline data or a referenced Secret key.

use crate::cloudinit::encoding;
use crate::crd::FileContent;
use crate::error::{Error, Result};
use crate::store::SecretStore;
use tracing::debug;

/// Resolve the raw bytes of a file's content
///
/// Inline data without an encoding is returned verbatim; with an encoding it
/// is decoded. Secret references are looked up in `namespace`. Resolution is
/// attempted once; transport errors are returned to the caller.
///
/// # Errors
///
/// - [`Error::InvalidContent`] when both or neither of inline/secretRef are set
/// - [`Error::Decode`] for unknown encodings or malformed data
/// - [`Error::SecretNotFound`] / [`Error::SecretKeyNotFound`] for missing references
pub async fn resolve_file_content(
    store: &dyn SecretStore,
    namespace: &str,
    content: &FileContent,
) -> Result<Vec<u8>> {
    match (&content.inline, &content.secret_ref) {
        (Some(inline), None) => {
            if inline.encoding.is_empty() {
                Ok(inline.data.as_bytes().to_vec())
            } else {
                Ok(encoding::decode(&inline.encoding, inline.data.as_bytes())?)
            }
        }
        (None, Some(secret_ref)) => {
            debug!(
                "Resolving file content from secret {}/{} key {}",
                namespace, secret_ref.name, secret_ref.data_key
            );
            let secret = store
                .get_secret(namespace, &secret_ref.name)
                .await?
                .ok_or_else(|| Error::SecretNotFound {
                    namespace: namespace.to_string(),
                    name: secret_ref.name.clone(),
                })?;

            secret
                .data
                .and_then(|mut data| data.remove(&secret_ref.data_key))
                .map(|bytes| bytes.0)
                .ok_or_else(|| Error::SecretKeyNotFound {
                    namespace: namespace.to_string(),
                    name: secret_ref.name.clone(),
                    key: secret_ref.data_key.clone(),
                })
        }
        (Some(_), Some(_)) => Err(Error::InvalidContent(
            "inline and secretRef are mutually exclusive".to_string(),
        )),
        (None, None) => Err(Error::InvalidContent(
            "one of inline or secretRef must be set".to_string(),
        )),
    }
}
