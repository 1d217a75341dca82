use alloc::string::String;
use serde::{Deserialize, Serialize};

/// Acceptable schema for new registrations.
#[derive(Clone, Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Acceptable schema for login attempts.
#[derive(Clone, Debug, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

/// Claims embedded in the bearer token handed out at registration and login.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// User the token is bound to.
    pub id: i64,
    /// Expiration as seconds since the Unix epoch.
    pub exp: u64,
}
