//! OAuth handshake primitives: opaque state tokens, PKCE, and the
//! persistent single-use state store.

pub mod error;
pub mod pkce;
pub mod schema;
pub mod state_store;

pub use {
    error::{Error, Result},
    pkce::{PkceChallenge, challenge_for, generate_pkce, generate_state},
    state_store::{DEFAULT_STATE_TTL, StateStore, StateVerification},
};
