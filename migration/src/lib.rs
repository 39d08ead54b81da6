pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users;
mod m20250901_000002_create_newsletters;
mod m20250915_000001_add_stripe_customer_id;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users::Migration),
            Box::new(m20250901_000002_create_newsletters::Migration),
            Box::new(m20250915_000001_add_stripe_customer_id::Migration),
        ]
    }
}
