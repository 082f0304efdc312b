//! User record types.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Caller-supplied user fields, before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl NewUser {
    /// Build a record stamped with the current time.
    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            created_at: unix_now(),
        }
    }
}

/// A persisted user. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Seconds since the Unix epoch.
    pub created_at: f64,
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_record_copies_fields() {
        let new_user = NewUser {
            user_id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "+44 20 7946 0000".into(),
        };

        let record = new_user.to_record();
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.email, "ada@example.com");
        assert!(record.created_at > 0.0);
    }

    #[test]
    fn test_record_json_shape() {
        let record = UserRecord {
            user_id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "123".into(),
            created_at: 1.5,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["created_at"], 1.5);
    }
}
