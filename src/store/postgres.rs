use super::{DocumentStore, OrderSelector, SubscriberQuery, WriteBatch, WriteOp};
use crate::entities::{order_entity as orders, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{Order, Subscriber};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: DatabaseConnection,
    max_batch_writes: usize,
}

impl PgDocumentStore {
    pub fn new(pool: DatabaseConnection, max_batch_writes: usize) -> Self {
        Self {
            pool,
            max_batch_writes,
        }
    }

    async fn apply<C: ConnectionTrait>(conn: &C, op: WriteOp) -> AppResult<()> {
        match op {
            WriteOp::SetOrder(order) => {
                // 覆盖写：同一 id 重跑不会报错也不会重复
                let on_conflict = OnConflict::column(orders::Column::Id)
                    .update_columns([
                        orders::Column::SubscriptionId,
                        orders::Column::UserId,
                        orders::Column::Date,
                        orders::Column::MealType,
                        orders::Column::Category,
                        orders::Column::Status,
                        orders::Column::DeliveryAssignedTo,
                        orders::Column::CreatedAt,
                    ])
                    .to_owned();
                orders::Entity::insert(orders::ActiveModel::from(order))
                    .on_conflict(on_conflict)
                    .exec_without_returning(conn)
                    .await?;
            }
            WriteOp::UpdateOrderStatus { order_id, status } => {
                let res = orders::Entity::update_many()
                    .col_expr(orders::Column::Status, Expr::value(status.to_string()))
                    .filter(orders::Column::Id.eq(order_id.as_str()))
                    .exec(conn)
                    .await?;
                if res.rows_affected == 0 {
                    return Err(AppError::NotFound(format!("order {order_id}")));
                }
            }
            WriteOp::UpdateSubscriptionEndDate { user_id, end_date } => {
                let res = users::Entity::update_many()
                    .col_expr(users::Column::SubscriptionEndDate, Expr::value(end_date))
                    .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(users::Column::Id.eq(user_id.as_str()))
                    .exec(conn)
                    .await?;
                if res.rows_affected == 0 {
                    return Err(AppError::NotFound(format!("user {user_id}")));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn subscribers(&self, query: SubscriberQuery) -> AppResult<Vec<Subscriber>> {
        let mut select = users::Entity::find().order_by_asc(users::Column::Id);
        if query == SubscriberQuery::Active {
            select = select.filter(users::Column::ActiveSubscription.eq(true));
        }
        let rows = select.all(&self.pool).await?;
        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    async fn find_orders(&self, selector: &OrderSelector) -> AppResult<Vec<Order>> {
        let rows = orders::Entity::find()
            .filter(orders::Column::UserId.eq(selector.user_id.as_str()))
            .filter(orders::Column::Status.eq(selector.status.as_str()))
            .filter(orders::Column::Date.gte(selector.window.start))
            .filter(orders::Column::Date.lte(selector.window.end))
            .order_by_asc(orders::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    fn max_batch_writes(&self) -> usize {
        self.max_batch_writes
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let txn = self.pool.begin().await?;
        for op in batch.into_ops() {
            // 出错时 txn 被 drop 即回滚
            Self::apply(&txn, op).await?;
        }
        txn.commit().await?;
        Ok(())
    }
}
