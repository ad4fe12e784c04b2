use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - represents a registered account.
///
/// `password_hash` holds the Argon2 hash of the password, never the
/// plaintext. The entity itself is never serialized to clients; handlers
/// map it to a response type without the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub profile_picture: String,
    pub location: String,
    pub website: String,
    pub twitter: String,
    pub linkedin: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    /// Profile fields start empty and are filled in later.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            bio: String::new(),
            profile_picture: String::new(),
            location: String::new(),
            website: String::new(),
            twitter: String::new(),
            linkedin: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
