use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile entity - optional one-to-one extension of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: String,
}

impl Profile {
    pub fn new(user_id: Uuid, bio: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            bio,
        }
    }
}
