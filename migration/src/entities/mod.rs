pub mod gift;
pub mod order;
pub mod points_transaction;
pub mod restaurant_settings;
pub mod visitor;

pub use gift::Entity as GiftEntity;
pub use order::Entity as OrderEntity;
pub use points_transaction::Entity as PointsTransactionEntity;
pub use restaurant_settings::Entity as RestaurantSettingsEntity;
pub use visitor::Entity as VisitorEntity;
