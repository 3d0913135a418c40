use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 订阅的餐别；本服务只为 Lunch / Dinner 生成订单
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MealType {
    Lunch,
    Dinner,
    Both,
}

impl MealType {
    /// Meals a subscription of this type receives each day, lunch first.
    pub fn meals(self) -> &'static [MealType] {
        match self {
            MealType::Lunch => &[MealType::Lunch],
            MealType::Dinner => &[MealType::Dinner],
            MealType::Both => &[MealType::Lunch, MealType::Dinner],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Both => "Both",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Lunch" => Ok(MealType::Lunch),
            "Dinner" => Ok(MealType::Dinner),
            "Both" => Ok(MealType::Both),
            other => Err(format!("unknown meal type {other:?}")),
        }
    }
}

/// Meal on an order record. Orders written elsewhere may carry meals this
/// crate never creates; those are kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum OrderMeal {
    Lunch,
    Dinner,
    Other(String),
}

impl OrderMeal {
    pub fn as_str(&self) -> &str {
        match self {
            OrderMeal::Lunch => "Lunch",
            OrderMeal::Dinner => "Dinner",
            OrderMeal::Other(s) => s,
        }
    }
}

impl std::fmt::Display for OrderMeal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MealType> for OrderMeal {
    fn from(meal: MealType) -> Self {
        match meal {
            MealType::Lunch => OrderMeal::Lunch,
            MealType::Dinner => OrderMeal::Dinner,
            MealType::Both => OrderMeal::Other(MealType::Both.to_string()),
        }
    }
}

impl From<String> for OrderMeal {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Lunch" => OrderMeal::Lunch,
            "Dinner" => OrderMeal::Dinner,
            _ => OrderMeal::Other(s),
        }
    }
}

impl From<OrderMeal> for String {
    fn from(meal: OrderMeal) -> Self {
        meal.as_str().to_string()
    }
}

/// Order status. Values other than the two this crate reconciles are kept
/// verbatim so they round-trip untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    PendingDelivery,
    Paused,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::PendingDelivery => "Pending Delivery",
            OrderStatus::Paused => "Paused",
            OrderStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending Delivery" => OrderStatus::PendingDelivery,
            "Paused" => OrderStatus::Paused,
            _ => OrderStatus::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}
