use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rewards::models::User;

/// Request body for login. Any non-empty pair is accepted.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn has_credentials(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.trim().is_empty()
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub points: u64,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            points: u.points,
        }
    }
}
