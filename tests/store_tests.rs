//! Persistence tests against a throwaway SQLite file.

use larder::config::SecurityConfig;
use larder::db::backup::{BACKUP_PREFIX, BackupManager};
use larder::db::{CreateUserOutcome, IntegrationPatch, IntegrationUpsert, Store, User};

async fn store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("larder-store-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("Failed to open store")
}

fn fast_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..SecurityConfig::default()
    }
}

async fn user(store: &Store, name: &str) -> User {
    match store
        .create_user(name, &format!("{name}@example.com"), "password123", &fast_security())
        .await
        .unwrap()
    {
        CreateUserOutcome::Created(user) => user,
        other => panic!("unexpected outcome: {other:?}"),
    }
}

fn upsert(key: &str) -> IntegrationUpsert {
    IntegrationUpsert {
        provider: "openai".to_string(),
        encrypted_api_key: key.to_string(),
        model: None,
        base_url: None,
        name: None,
        is_active: None,
        default_model: "gpt-4".to_string(),
        default_base_url: Some("https://api.openai.com/v1".to_string()),
    }
}

#[tokio::test]
async fn test_duplicate_users_are_reported_as_outcomes() {
    let store = store().await;
    user(&store, "alice").await;

    let outcome = store
        .create_user("alice", "other@example.com", "password123", &fast_security())
        .await
        .unwrap();
    assert!(matches!(outcome, CreateUserOutcome::UsernameTaken));

    let outcome = store
        .create_user("bob", "alice@example.com", "password123", &fast_security())
        .await
        .unwrap();
    assert!(matches!(outcome, CreateUserOutcome::EmailTaken));
}

#[tokio::test]
async fn test_password_verification() {
    let store = store().await;
    user(&store, "alice").await;

    assert!(store.verify_user_password("alice", "password123").await.unwrap());
    assert!(!store.verify_user_password("alice", "nope").await.unwrap());
    assert!(!store.verify_user_password("nobody", "password123").await.unwrap());
}

#[tokio::test]
async fn test_upsert_inserts_with_defaults_then_keeps_unsupplied_fields() {
    let store = store().await;
    let alice = user(&store, "alice").await;

    let (row, created) = store
        .upsert_integration(
            alice.id,
            IntegrationUpsert {
                model: Some("gpt-4o".to_string()),
                is_active: Some(false),
                ..upsert("enc-1")
            },
        )
        .await
        .unwrap();
    assert!(created);
    assert_eq!(row.model, "gpt-4o");
    assert_eq!(row.name.as_deref(), Some("openai"));
    assert_eq!(row.base_url.as_deref(), Some("https://api.openai.com/v1"));
    assert!(!row.is_active);

    let (again, created) = store
        .upsert_integration(
            alice.id,
            IntegrationUpsert {
                name: Some("Personal".to_string()),
                ..upsert("enc-2")
            },
        )
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(again.id, row.id);
    assert_eq!(again.encrypted_api_key, "enc-2");
    assert_eq!(again.model, "gpt-4o");
    assert_eq!(again.name.as_deref(), Some("Personal"));
    assert!(!again.is_active);
    assert_eq!(again.created_at, row.created_at);

    assert_eq!(store.list_integrations(alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_patch_only_touches_supplied_columns() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    store.upsert_integration(alice.id, upsert("enc-1")).await.unwrap();

    let updated = store
        .update_integration(
            alice.id,
            "openai",
            IntegrationPatch {
                base_url: Some(None),
                ..IntegrationPatch::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.base_url, None);
    assert_eq!(updated.model, "gpt-4");
    assert_eq!(updated.encrypted_api_key, "enc-1");

    let missing = store
        .update_integration(alice.id, "anthropic", IntegrationPatch::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_snapshot_and_restore() {
    let dir = std::env::temp_dir().join(format!("larder-restore-test-{}", uuid::Uuid::new_v4()));
    let db_path = dir.join("larder.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let store = Store::new(&db_url).await.unwrap();
    user(&store, "alice").await;

    let manager = BackupManager::for_database(&db_path);
    let snapshot = manager.snapshot(&store.conn, BACKUP_PREFIX).await.unwrap();
    assert!(snapshot.starts_with(manager.dir()));

    user(&store, "bob").await;

    let backups = manager.list().unwrap();
    assert_eq!(backups.len(), 1);

    let saved = manager
        .restore(&backups[0], Some(store.conn.clone()))
        .await
        .unwrap()
        .expect("current database should be saved before restoring");
    assert!(saved.exists());

    let restored = Store::new(&db_url).await.unwrap();
    assert!(restored.username_exists("alice").await.unwrap());
    assert!(!restored.username_exists("bob").await.unwrap());

    // The pre-restore copy is not listed as a regular backup.
    assert_eq!(manager.list().unwrap().len(), 1);

    std::fs::remove_dir_all(dir).ok();
}
