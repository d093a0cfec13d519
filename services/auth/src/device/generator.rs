//! Random identifiers and codes for device authorizations.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, RngCore};

/// Characters a verification code is drawn from. Visually ambiguous
/// characters (0/O, 1/I) are left out so the code can be typed by hand.
pub const VERIFICATION_CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of a verification code.
pub const VERIFICATION_CODE_LENGTH: usize = 6;

/// Length of an encoded device authorization token.
pub const TOKEN_LENGTH: usize = 43;

/// Source of random record IDs, device tokens, and verification codes.
pub struct DeviceAuthorizationGenerator;

impl DeviceAuthorizationGenerator {
    /// Record identifier.
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Bearer token scoped to a single record: 32 random bytes, URL-safe.
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Short human-transcribable code.
    pub fn generate_verification_code() -> String {
        let mut rng = rand::thread_rng();
        (0..VERIFICATION_CODE_LENGTH)
            .map(|_| {
                let index = rng.gen_range(0..VERIFICATION_CODE_ALPHABET.len());
                char::from(VERIFICATION_CODE_ALPHABET[index])
            })
            .collect()
    }
}
