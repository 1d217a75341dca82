use alloc::string::String;
use core::num::NonZeroU32;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = digest::SHA256_OUTPUT_LEN;
static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const ROUNDS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(rounds) => rounds,
    None => panic!("round count must be non-zero"),
};

/// Derives a salted PBKDF2 digest for storage. The result is the
/// hex-encoded salt followed by the hex-encoded digest.
pub fn hash(password: &str) -> Result<String, ring::error::Unspecified> {
    let mut salt = [0; SALT_LEN];
    SystemRandom::new().fill(&mut salt)?;
    let mut digest = [0; DIGEST_LEN];
    pbkdf2::derive(ALGORITHM, ROUNDS, &salt, password.as_bytes(), &mut digest);
    let mut text = hex::encode(salt);
    text.push_str(&hex::encode(digest));
    Ok(text)
}

/// Checks a password attempt against a stored salt-and-digest string.
/// Malformed stored values never verify.
pub fn verify(stored: &str, password: &str) -> bool {
    if stored.len() != (SALT_LEN + DIGEST_LEN) * 2 {
        return false;
    }
    let (salt_text, digest_text) = stored.split_at(SALT_LEN * 2);
    let mut salt = [0; SALT_LEN];
    let mut digest = [0; DIGEST_LEN];
    if hex::decode_to_slice(salt_text, &mut salt).is_err() || hex::decode_to_slice(digest_text, &mut digest).is_err() {
        return false;
    }
    pbkdf2::verify(ALGORITHM, ROUNDS, &salt, password.as_bytes(), &digest).is_ok()
}
