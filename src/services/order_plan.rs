//! Per-subscriber decisions shared by order generation and pause reconciliation.
//!
//! Everything here is pure: given a subscriber and the service day it returns
//! what should be written, leaving reads and commits to the services.

use crate::error::{AppError, AppResult};
use crate::models::{MealType, Order, OrderMeal, OrderStatus, Subscriber};
use crate::store::OrderSelector;
use crate::utils::{ServiceDay, add_local_days};
use chrono::{DateTime, Utc};

/// `{subscription_id}-{YYYY-MM-DD}-{meal}`. Reproducible without a lookup.
pub fn order_id(subscription_id: &str, day: &ServiceDay, meal: MealType) -> String {
    format!("{subscription_id}-{}-{meal}", day.key())
}

/// Orders an active subscriber should have for `day`.
///
/// Eligible iff not paused and `day` is on or before the subscription end date
/// (compared as local calendar dates). Active records missing a field the
/// order needs are rejected rather than skipped.
pub fn orders_to_create(
    subscriber: &Subscriber,
    day: &ServiceDay,
    now: DateTime<Utc>,
) -> AppResult<Vec<Order>> {
    if !subscriber.active_subscription {
        return Ok(Vec::new());
    }

    let end_date = subscriber
        .subscription_end_date
        .ok_or_else(|| AppError::malformed_user(&subscriber.id, "missing subscriptionEndDate"))?;
    let subscription_id = subscriber
        .subscription_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::malformed_user(&subscriber.id, "missing subscriptionId"))?;
    let meal_type = subscriber
        .meal_type
        .as_deref()
        .ok_or_else(|| AppError::malformed_user(&subscriber.id, "missing mealType"))?
        .parse::<MealType>()
        .map_err(|e| AppError::malformed_user(&subscriber.id, e))?;

    if subscriber.is_paused || day.date() > day.local_date_of(end_date) {
        return Ok(Vec::new());
    }

    Ok(meal_type
        .meals()
        .iter()
        .map(|&meal| Order {
            id: order_id(subscription_id, day, meal),
            subscription_id: subscription_id.to_string(),
            user_id: subscriber.id.clone(),
            date: day.start(),
            meal_type: OrderMeal::from(meal),
            category: subscriber.category.clone(),
            status: OrderStatus::PendingDelivery,
            delivery_assigned_to: None,
            created_at: now,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub enum PauseAction {
    /// Push the end date out by a day and pause the selected orders.
    Pause {
        extended_end_date: DateTime<Utc>,
        orders: OrderSelector,
    },
    /// Put the selected orders back to pending delivery.
    Resume { orders: OrderSelector },
    Nothing,
}

pub fn pause_action(subscriber: &Subscriber, day: &ServiceDay) -> AppResult<PauseAction> {
    if subscriber.is_paused {
        let Some(end_date) = subscriber.subscription_end_date else {
            return Ok(PauseAction::Nothing);
        };
        let extended_end_date = add_local_days(end_date, 1, day.tz()).ok_or_else(|| {
            AppError::malformed_user(&subscriber.id, "subscriptionEndDate out of range")
        })?;
        return Ok(PauseAction::Pause {
            extended_end_date,
            orders: OrderSelector {
                user_id: subscriber.id.clone(),
                status: OrderStatus::PendingDelivery,
                window: day.window(),
            },
        });
    }

    Ok(PauseAction::Resume {
        orders: OrderSelector {
            user_id: subscriber.id.clone(),
            status: OrderStatus::Paused,
            window: day.window(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::{Asia, UTC};

    fn day(y: i32, m: u32, d: u32) -> ServiceDay {
        ServiceDay::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), UTC)
    }

    fn subscriber(meal_type: &str, end: DateTime<Utc>) -> Subscriber {
        Subscriber {
            id: "user-1".to_string(),
            active_subscription: true,
            subscription_id: Some("sub-1".to_string()),
            subscription_end_date: Some(end),
            is_paused: false,
            meal_type: Some(meal_type.to_string()),
            category: Some("veg".to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 5).unwrap()
    }

    #[test]
    fn test_both_meals_create_two_pending_orders() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let orders = orders_to_create(&subscriber("Both", end), &day(2024, 3, 5), now()).unwrap();

        let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["sub-1-2024-03-05-Lunch", "sub-1-2024-03-05-Dinner"]);
        for o in &orders {
            assert_eq!(o.status, OrderStatus::PendingDelivery);
            assert_eq!(o.user_id, "user-1");
            assert_eq!(o.category.as_deref(), Some("veg"));
            assert_eq!(o.delivery_assigned_to, None);
            assert_eq!(o.date, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
            assert_eq!(o.created_at, now());
        }
    }

    #[test]
    fn test_single_meal_types() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let lunch = orders_to_create(&subscriber("Lunch", end), &day(2024, 3, 5), now()).unwrap();
        assert_eq!(lunch.len(), 1);
        assert_eq!(lunch[0].meal_type, OrderMeal::Lunch);

        let dinner = orders_to_create(&subscriber("Dinner", end), &day(2024, 3, 5), now()).unwrap();
        assert_eq!(dinner.len(), 1);
        assert_eq!(dinner[0].id, "sub-1-2024-03-05-Dinner");
    }

    #[test]
    fn test_end_date_boundary() {
        // 结束日当天仍然出餐
        let end = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let on_end = orders_to_create(&subscriber("Both", end), &day(2024, 3, 5), now()).unwrap();
        assert_eq!(on_end.len(), 2);

        let expired = orders_to_create(&subscriber("Both", end), &day(2024, 3, 6), now()).unwrap();
        assert!(expired.is_empty());
    }

    #[test]
    fn test_end_date_compared_in_local_time() {
        // 2024-03-05T20:00Z is already March 6th in Kolkata.
        let end = Utc.with_ymd_and_hms(2024, 3, 5, 20, 0, 0).unwrap();
        let tomorrow = ServiceDay::new(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(), Asia::Kolkata);
        let orders = orders_to_create(&subscriber("Lunch", end), &tomorrow, now()).unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn test_paused_or_inactive_creates_nothing() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let mut paused = subscriber("Both", end);
        paused.is_paused = true;
        assert!(orders_to_create(&paused, &day(2024, 3, 5), now()).unwrap().is_empty());

        let mut inactive = subscriber("Both", end);
        inactive.active_subscription = false;
        inactive.subscription_end_date = None;
        assert!(orders_to_create(&inactive, &day(2024, 3, 5), now()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_active_subscriber_is_rejected() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();

        let mut no_end = subscriber("Both", end);
        no_end.subscription_end_date = None;
        let err = orders_to_create(&no_end, &day(2024, 3, 5), now()).unwrap_err();
        assert!(matches!(err, AppError::MalformedRecord { collection: "users", .. }));

        let unknown_meal = subscriber("Breakfast", end);
        assert!(orders_to_create(&unknown_meal, &day(2024, 3, 5), now()).is_err());

        let mut no_sub = subscriber("Both", end);
        no_sub.subscription_id = Some(String::new());
        assert!(orders_to_create(&no_sub, &day(2024, 3, 5), now()).is_err());
    }

    #[test]
    fn test_paused_subscriber_is_extended_and_paused() {
        let end = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let mut s = subscriber("Both", end);
        s.is_paused = true;
        let tomorrow = day(2024, 1, 5);

        let action = pause_action(&s, &tomorrow).unwrap();
        assert_eq!(
            action,
            PauseAction::Pause {
                extended_end_date: Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap(),
                orders: OrderSelector {
                    user_id: "user-1".to_string(),
                    status: OrderStatus::PendingDelivery,
                    window: tomorrow.window(),
                },
            }
        );
    }

    #[test]
    fn test_paused_without_end_date_is_noop() {
        let end = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let mut s = subscriber("Both", end);
        s.is_paused = true;
        s.subscription_end_date = None;
        assert_eq!(pause_action(&s, &day(2024, 1, 5)).unwrap(), PauseAction::Nothing);
    }

    #[test]
    fn test_unpaused_subscriber_resumes_regardless_of_activity() {
        let end = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let mut s = subscriber("Both", end);
        s.active_subscription = false;
        match pause_action(&s, &day(2024, 1, 5)).unwrap() {
            PauseAction::Resume { orders } => {
                assert_eq!(orders.status, OrderStatus::Paused);
                assert_eq!(orders.user_id, "user-1");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
