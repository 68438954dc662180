pub mod db;
pub mod store;

pub use db::{
    create_db, get_category_by_name, insert_client, insert_provider, seed_default_categories,
    DbPool,
};
pub use store::SqliteStore;
