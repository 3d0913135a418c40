use crate::entities::user_entity as users;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's meal-subscription settings as read from the `users` collection.
///
/// Fields stay as loose as the stored record: validation happens when a job
/// actually needs a field, so one bad record cannot break the listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscriber {
    pub id: String,
    pub active_subscription: bool,
    pub subscription_id: Option<String>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub meal_type: Option<String>,
    pub category: Option<String>,
}

impl From<users::Model> for Subscriber {
    fn from(m: users::Model) -> Self {
        Self {
            id: m.id,
            active_subscription: m.active_subscription,
            subscription_id: m.subscription_id,
            subscription_end_date: m.subscription_end_date,
            is_paused: m.is_paused,
            meal_type: m.meal_type,
            category: m.category,
        }
    }
}
