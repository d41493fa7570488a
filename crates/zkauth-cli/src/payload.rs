//! Request payloads produced by `commit` and `prove`.

use serde::{Deserialize, Serialize};
use zkauth_core::PublicInputs;

/// Body for `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub stored_hash: Vec<String>,
}

/// Body for `POST /login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub proof: serde_json::Value,
    /// `[c0, c1]`: the commitment only.
    pub inputs: PublicInputs,
}
