use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    SubscriptionId,
    UserId,
    Date,
    MealType,
    Category,
    Status,
    DeliveryAssignedTo,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // id = {subscription_id}-{YYYY-MM-DD}-{meal_type}
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .string_len(255)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Orders::SubscriptionId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::UserId).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Orders::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::MealType).string_len(16).not_null())
                    .col(ColumnDef::new(Orders::Category).string_len(64).null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(32)
                            .not_null()
                            .default("Pending Delivery"),
                    )
                    .col(
                        ColumnDef::new(Orders::DeliveryAssignedTo)
                            .string_len(128)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 暂停对账按 user_id + status + date 范围查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_user_status_date")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .col(Orders::Status)
                    .col(Orders::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Orders::Table).to_owned())
            .await?;
        Ok(())
    }
}
