use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An active like. At most one exists per (post, identity) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLike {
    pub id: Uuid,
    pub post_id: Uuid,
    pub ip_address: String,
    pub liked_at: DateTime<Utc>,
}

impl PostLike {
    pub fn new(post_id: Uuid, ip_address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            ip_address: ip_address.into(),
            liked_at: Utc::now(),
        }
    }
}

/// A recorded view. Views are never deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub viewed_at: DateTime<Utc>,
}

impl PostView {
    pub fn new(post_id: Uuid, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            viewed_at: Utc::now(),
        }
    }
}

/// What liking an already-liked post does. Applies to every like endpoint alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LikePolicy {
    /// A second like from the same identity is a conflict.
    #[default]
    RejectDuplicate,
    /// A second like from the same identity succeeds without changing anything.
    Idempotent,
}

impl FromStr for LikePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "reject-duplicate" => Ok(LikePolicy::RejectDuplicate),
            "idempotent" => Ok(LikePolicy::Idempotent),
            other => Err(format!("unknown like policy '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_policy_parsing() {
        assert_eq!("reject".parse(), Ok(LikePolicy::RejectDuplicate));
        assert_eq!(" Idempotent ".parse(), Ok(LikePolicy::Idempotent));
        assert!("maybe".parse::<LikePolicy>().is_err());
    }
}
