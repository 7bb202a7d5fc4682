use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Stable hex identifier for an account email: HMAC-SHA256 keyed with
/// `salt` over the trimmed, lowercased email.
///
/// Case and surrounding whitespace do not change the result. Different
/// salts give unrelated IDs.
pub fn hex_id_from_email(email: &str, salt: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let mut mac = match HmacSha256::new_from_slice(salt.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac key of any length is valid"),
    };
    mac.update(normalized.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
