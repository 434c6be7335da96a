pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_loyalty_tables;
mod m20260301_000002_orders;
mod m20260302_000001_restaurant_settings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_loyalty_tables::Migration),
            Box::new(m20260301_000002_orders::Migration),
            Box::new(m20260302_000001_restaurant_settings::Migration),
        ]
    }
}
