use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::UserId;

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload. Both tokens of a pair share `sid`, so revoking the session
/// kills the refresh token along with the access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,     // user ID
    pub name: String,    // username, shown as the display name
    pub sid: Uuid,       // session ID
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // token type
}
