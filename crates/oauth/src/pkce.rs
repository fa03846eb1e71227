//! PKCE verifier/challenge pairs and opaque state token generation.

use {
    base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD},
    rand::RngCore,
    sha2::{Digest, Sha256},
};

/// PKCE verifier/challenge pair (RFC 7636, S256 method).
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

/// Generate a fresh PKCE pair. The verifier is 32 random bytes,
/// base64url-encoded without padding (43 characters).
pub fn generate_pkce() -> PkceChallenge {
    let verifier = random_token();
    let challenge = challenge_for(&verifier);
    PkceChallenge {
        verifier,
        challenge,
    }
}

/// Recompute the S256 challenge for a verifier: `BASE64URL(SHA256(verifier))`.
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate an opaque state token binding an authorization request to its
/// callback. Carries no embedded user data.
pub fn generate_state() -> String {
    random_token()
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
