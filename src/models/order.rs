use crate::entities::order_entity;
use crate::models::{OrderMeal, OrderStatus};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub subscription_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub meal_type: OrderMeal,
    pub category: Option<String>,
    pub status: OrderStatus,
    pub delivery_assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_entity::Model> for Order {
    fn from(m: order_entity::Model) -> Self {
        Self {
            id: m.id,
            subscription_id: m.subscription_id,
            user_id: m.user_id,
            date: m.date,
            meal_type: OrderMeal::from(m.meal_type),
            category: m.category,
            status: OrderStatus::from(m.status),
            delivery_assigned_to: m.delivery_assigned_to,
            created_at: m.created_at,
        }
    }
}

impl From<Order> for order_entity::ActiveModel {
    fn from(o: Order) -> Self {
        Self {
            id: Set(o.id),
            subscription_id: Set(o.subscription_id),
            user_id: Set(o.user_id),
            date: Set(o.date),
            meal_type: Set(o.meal_type.to_string()),
            category: Set(o.category),
            status: Set(o.status.to_string()),
            delivery_assigned_to: Set(o.delivery_assigned_to),
            created_at: Set(o.created_at),
        }
    }
}
