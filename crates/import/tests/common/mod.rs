#![allow(dead_code)]

use gstbook_core::{ClientId, ProviderId};
use gstbook_storage::{
    get_category_by_name, insert_client, insert_provider, seed_default_categories, SqliteStore,
};
use tempfile::TempDir;

/// A fresh ledger with the default categories. Keep the `TempDir` alive for
/// as long as the store is used.
pub async fn store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("books.db")).await.unwrap();
    seed_default_categories(store.pool()).await.unwrap();
    (dir, store)
}

pub async fn provider(store: &SqliteStore, name: &str, international: bool) -> ProviderId {
    insert_provider(store.pool(), name, international, None).await.unwrap()
}

pub async fn provider_with_category(store: &SqliteStore, name: &str, category: &str) -> ProviderId {
    let category_id = get_category_by_name(store.pool(), category).await.unwrap();
    assert!(category_id.is_some(), "category {category} is seeded");
    insert_provider(store.pool(), name, false, category_id).await.unwrap()
}

pub async fn client(store: &SqliteStore, name: &str) -> ClientId {
    insert_client(store.pool(), name).await.unwrap()
}

