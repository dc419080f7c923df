//! Checksum scheme for the salt-keyed PhonePe API generation. Requests carry
//! an `X-VERIFY` header of the form `sha256(content + salt_key)###salt_index`,
//! where `content` is the base64 request body plus the endpoint path for
//! POSTs, or just the path for status GETs.

use sha2::{Digest, Sha256};

pub fn sha256_hex(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signature over a base64-encoded request payload bound to its endpoint path.
pub fn sign(base64_payload: &str, endpoint_path: &str, salt_key: &str) -> String {
    sha256_hex(&format!("{}{}{}", base64_payload, endpoint_path, salt_key))
}

/// Signature for GET endpoints, where only the path is covered.
pub fn sign_path(endpoint_path: &str, salt_key: &str) -> String {
    sha256_hex(&format!("{}{}", endpoint_path, salt_key))
}

pub fn x_verify(signature_hex: &str, salt_index: &str) -> String {
    format!("{}###{}", signature_hex, salt_index)
}
