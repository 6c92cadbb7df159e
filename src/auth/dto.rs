use serde::Serialize;

/// Response returned by a successful sign-in.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
