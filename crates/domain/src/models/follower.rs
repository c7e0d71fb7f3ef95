//! Order follower domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A staff member watching an order.
///
/// At most one row may exist per `(user_id, order_id)` pair; the datastore
/// enforces this with a uniqueness constraint so concurrent double-follow
/// calls collapse to one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFollower {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follower_serializes_camel_case() {
        let follower = OrderFollower {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            notifications_enabled: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&follower).unwrap();
        assert!(json.contains("userId"));
        assert!(json.contains("orderId"));
        assert!(json.contains("notificationsEnabled"));
    }
}
