/// Personal access token primitives
///
/// Generation, hashing and format checks for the opaque bearer tokens. Storage
/// lives in `models::access_token`; the issue/validate/revoke lifecycle lives
/// in `auth::issuer`.
///
/// # Token Format
///
/// `todo_` followed by 48 base62 characters (53 chars total). The random part
/// carries about 285 bits of entropy.
///
/// # Example
///
/// ```
/// use todo_shared::auth::token::{generate_token, hash_token, validate_token_format};
///
/// let (token, hash) = generate_token();
/// assert!(token.starts_with("todo_"));
/// assert!(validate_token_format(&token));
/// assert_eq!(hash, hash_token(&token));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the random part of a token (characters)
const TOKEN_RANDOM_LENGTH: usize = 48;

/// Token prefix
pub const TOKEN_PREFIX: &str = "todo_";

/// Total length of a raw token (prefix + random)
pub const TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

/// Generates a new raw token together with its storage hash
///
/// Returns `(raw_token, sha256_hex)`. The raw token must only be handed to
/// the client; the hash is what gets persisted.
pub fn generate_token() -> (String, String) {
    let token = format!("{}{}", TOKEN_PREFIX, random_base62(TOKEN_RANDOM_LENGTH));
    let hash = hash_token(&token);

    (token, hash)
}

fn random_base62(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Hashes a raw token with SHA-256
///
/// Returns 64 lowercase hex characters. Deterministic, so the hash doubles as
/// the lookup key.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Checks that a string has the shape of a token we issued
///
/// Used to reject garbage before touching the store.
///
/// ```
/// use todo_shared::auth::token::validate_token_format;
///
/// assert!(!validate_token_format("todo_short"));
/// assert!(!validate_token_format("Bearer abc"));
/// ```
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token.starts_with(TOKEN_PREFIX)
        && token[TOKEN_PREFIX.len()..]
            .bytes()
            .all(|b| b.is_ascii_alphanumeric())
}

/// Constant-time string comparison
///
/// Compares every byte without short-circuiting. Length is not secret here
/// (all hashes are 64 chars), so a length mismatch returns early.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_token_format() {
        let (token, hash) = generate_token();

        assert_eq!(token.len(), TOKEN_LENGTH);
        assert_eq!(token.len(), 53);
        assert!(token.starts_with("todo_"));
        assert!(validate_token_format(&token));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_token().0).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_hash_token_deterministic() {
        assert_eq!(hash_token("todo_abc"), hash_token("todo_abc"));
        assert_ne!(hash_token("todo_abc"), hash_token("todo_abd"));
        // Known SHA-256 vector
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_validate_token_format() {
        let (token, _) = generate_token();
        assert!(validate_token_format(&token));

        assert!(!validate_token_format(""));
        assert!(!validate_token_format(&token[..TOKEN_LENGTH - 1]));
        assert!(!validate_token_format(&format!("{}x", token)));
        assert!(!validate_token_format(&token.replacen("todo_", "axon_", 1)));

        let mut bad = token.clone();
        bad.replace_range(10..11, "!");
        assert!(!validate_token_format(&bad));
    }

    #[test]
    fn test_validate_token_format_multibyte() {
        // Must not panic on non-ASCII input of the right byte length
        let input = format!("todo_{}", "é".repeat(24));
        assert_eq!(input.len(), TOKEN_LENGTH);
        assert!(!validate_token_format(&input));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello!"));
        assert!(constant_time_compare("", ""));
    }
}
