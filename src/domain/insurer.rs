use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An insurance carrier that pays commissions to the brokerage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurer {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Insurer {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Key used to enforce name uniqueness.
    pub fn name_key(name: &str) -> String {
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}
