//! 餐厅级忠诚度配置表
//!
//! 没有记录的餐厅使用静态配置 `[loyalty]` 中的默认值。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RestaurantSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RestaurantSettings::RestaurantId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RestaurantSettings::PointsPerEuro)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(RestaurantSettings::GiftConversionEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RestaurantSettings::RequireBankedVisit)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RestaurantSettings::WelcomeOncePerSession)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RestaurantSettings::WelcomeGiftPercentage)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(RestaurantSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RestaurantSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RestaurantSettings {
    #[sea_orm(iden = "restaurant_settings")]
    Table,
    RestaurantId,
    PointsPerEuro,
    GiftConversionEnabled,
    RequireBankedVisit,
    WelcomeOncePerSession,
    WelcomeGiftPercentage,
    UpdatedAt,
}
