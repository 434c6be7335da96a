//! 忠诚度核心表迁移
//!
//! 创建 visitors、gifts、points_transactions 三张表：
//! - visitors: 每个 (restaurant_id, device_id) 一行，保存访问计数和积分余额
//! - gifts: 奖励礼品，只做状态变更，不物理删除
//! - points_transactions: 积分流水（追加写入）

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 visitors 表
        manager
            .create_table(
                Table::create()
                    .table(Visitors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Visitors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Visitors::RestaurantId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Visitors::DeviceId).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Visitors::VisitCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Visitors::OrdersInCurrentSession)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Visitors::LastSessionAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Visitors::LastVisitAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Visitors::LastCountedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Visitors::TotalPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Visitors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一约束：同一餐厅下 device_id 唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_visitors_restaurant_device")
                    .table(Visitors::Table)
                    .col(Visitors::RestaurantId)
                    .col(Visitors::DeviceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建 gifts 表
        manager
            .create_table(
                Table::create()
                    .table(Gifts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Gifts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Gifts::RestaurantId).string_len(64).not_null())
                    .col(ColumnDef::new(Gifts::DeviceId).string_len(128).not_null())
                    .col(ColumnDef::new(Gifts::GiftType).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Gifts::EuroValueCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Gifts::PercentageValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Gifts::GiftName).string_len(255).null())
                    .col(
                        ColumnDef::new(Gifts::Status)
                            .string_len(16)
                            .not_null()
                            .default("unused"),
                    )
                    .col(ColumnDef::new(Gifts::Source).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Gifts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Gifts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 按访客查询礼品（含状态过滤）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gifts_owner_status")
                    .table(Gifts::Table)
                    .col(Gifts::RestaurantId)
                    .col(Gifts::DeviceId)
                    .col(Gifts::Status)
                    .to_owned(),
            )
            .await?;

        // 创建 points_transactions 表
        manager
            .create_table(
                Table::create()
                    .table(PointsTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PointsTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::RestaurantId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::DeviceId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PointsTransactions::OrderId).big_integer().null())
                    .col(ColumnDef::new(PointsTransactions::GiftId).big_integer().null())
                    .col(
                        ColumnDef::new(PointsTransactions::TxType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointsTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // order_id / gift_id 非空时唯一（NULL 不参与唯一性比较）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_points_transactions_order")
                    .table(PointsTransactions::Table)
                    .col(PointsTransactions::OrderId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_points_transactions_gift")
                    .table(PointsTransactions::Table)
                    .col(PointsTransactions::GiftId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 余额汇总查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_points_transactions_owner")
                    .table(PointsTransactions::Table)
                    .col(PointsTransactions::RestaurantId)
                    .col(PointsTransactions::DeviceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PointsTransactions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Gifts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Visitors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Visitors {
    #[sea_orm(iden = "visitors")]
    Table,
    Id,
    RestaurantId,
    DeviceId,
    VisitCount,
    OrdersInCurrentSession,
    LastSessionAt,
    LastVisitAt,
    LastCountedAt,
    TotalPoints,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Gifts {
    #[sea_orm(iden = "gifts")]
    Table,
    Id,
    RestaurantId,
    DeviceId,
    GiftType,
    EuroValueCents,
    PercentageValue,
    GiftName,
    Status,
    Source,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PointsTransactions {
    #[sea_orm(iden = "points_transactions")]
    Table,
    Id,
    RestaurantId,
    DeviceId,
    OrderId,
    GiftId,
    TxType,
    Amount,
    CreatedAt,
}
