//! Integration tests for LibsqlTreeStore
//!
//! Tests cover:
//! - Root and child insertion (depth, sort order, sibling uniqueness)
//! - Rename and payload updates
//! - Cascading subtree deletion with dependents
//! - Recursive tree reads and assembly against a real database

use anyhow::Result;
use spectree_core::db::{DatabaseService, LibsqlTreeStore, StoreError, TreeStore};
use spectree_core::models::{
    assemble, DevSpecPayload, OrganizationPayload, SpecStatus, TreeScope, ValidationError,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Test helper: Create a test environment
async fn create_test_env() -> Result<(Arc<DatabaseService>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Arc::new(DatabaseService::new(db_path).await?);
    Ok((db, temp_dir))
}

fn org_store(db: &Arc<DatabaseService>) -> LibsqlTreeStore<OrganizationPayload> {
    LibsqlTreeStore::new(Arc::clone(db))
}

// =========================================================================
// Insertion
// =========================================================================

#[tokio::test]
async fn test_insert_root_defaults() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = org_store(&db);

    let root = store.insert_root("HQ", OrganizationPayload).await?;
    assert!(root.is_root());
    assert_eq!(root.depth, 0);
    assert_eq!(root.sort_order, 0);

    let found = store.find_by_id(root.id).await?.expect("root exists");
    assert_eq!(found.name, "HQ");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_root_name_rejected() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = org_store(&db);

    store.insert_root("Alpha", OrganizationPayload).await?;
    let err = store.insert_root("Alpha", OrganizationPayload).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejected(ValidationError::DuplicateSiblingName { .. })
    ));
    assert_eq!(store.find_roots().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_children_get_append_positions() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = org_store(&db);

    let root = store.insert_root("HQ", OrganizationPayload).await?;
    let a = store.insert_child(root.id, "A", OrganizationPayload).await?;
    let b = store.insert_child(root.id, "B", OrganizationPayload).await?;
    let c = store.insert_child(root.id, "C", OrganizationPayload).await?;

    assert_eq!((a.sort_order, b.sort_order, c.sort_order), (0, 1, 2));
    assert_eq!(a.depth, 1);

    let names: Vec<_> = store
        .find_children(root.id)
        .await?
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    let grandchild = store.insert_child(a.id, "A1", OrganizationPayload).await?;
    assert_eq!(grandchild.depth, 2);
    assert_eq!(grandchild.parent_id, Some(a.id));
    Ok(())
}

#[tokio::test]
async fn test_same_name_allowed_under_different_parents() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = org_store(&db);

    let left = store.insert_root("Left", OrganizationPayload).await?;
    let right = store.insert_root("Right", OrganizationPayload).await?;
    store.insert_child(left.id, "Sales", OrganizationPayload).await?;
    store.insert_child(right.id, "Sales", OrganizationPayload).await?;

    let err = store
        .insert_child(right.id, "Sales", OrganizationPayload)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Rejected(_)));
    Ok(())
}

#[tokio::test]
async fn test_insert_child_rules() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store: LibsqlTreeStore<DevSpecPayload> = LibsqlTreeStore::new(Arc::clone(&db));

    let err = store
        .insert_child(77, "Orphan", DevSpecPayload::page())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejected(ValidationError::ParentNotFound(77))
    ));

    let project = store.insert_root("Shop", DevSpecPayload::project()).await?;
    let page = store
        .insert_child(project.id, "Cart", DevSpecPayload::page())
        .await?;
    let err = store
        .insert_child(page.id, "Nested", DevSpecPayload::page())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejected(ValidationError::ChildrenNotPermitted { .. })
    ));

    let err = store
        .insert_root("   ", DevSpecPayload::project())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejected(ValidationError::MissingField(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_inserts_get_distinct_sort_orders() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = Arc::new(org_store(&db));
    let root = store.insert_root("HQ", OrganizationPayload).await?;

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let parent = root.id;
        handles.push(tokio::spawn(async move {
            store
                .insert_child(parent, &format!("team-{i}"), OrganizationPayload)
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let mut orders: Vec<_> = store
        .find_children(root.id)
        .await?
        .into_iter()
        .map(|n| n.sort_order)
        .collect();
    orders.sort_unstable();
    assert_eq!(orders, (0..8).collect::<Vec<_>>());
    Ok(())
}

// =========================================================================
// Updates
// =========================================================================

#[tokio::test]
async fn test_rename() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = org_store(&db);

    let root = store.insert_root("HQ", OrganizationPayload).await?;
    let a = store.insert_child(root.id, "A", OrganizationPayload).await?;
    store.insert_child(root.id, "B", OrganizationPayload).await?;
    let a1 = store.insert_child(a.id, "A1", OrganizationPayload).await?;

    assert!(store.rename(a.id, "B").await.is_err());
    assert!(store.rename(a.id, "A").await?);
    assert!(store.rename(a.id, "Alpha").await?);
    assert!(!store.rename(9999, "Ghost").await?);

    let renamed = store.find_by_id(a.id).await?.expect("exists");
    assert_eq!(renamed.name, "Alpha");
    // descendants unaffected
    let child = store.find_by_id(a1.id).await?.expect("exists");
    assert_eq!(child.parent_id, Some(a.id));
    assert_eq!(child.name, "A1");
    Ok(())
}

#[tokio::test]
async fn test_update_payload() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store: LibsqlTreeStore<DevSpecPayload> = LibsqlTreeStore::new(Arc::clone(&db));

    let project = store.insert_root("Shop", DevSpecPayload::project()).await?;
    let done = DevSpecPayload::project().with_status(SpecStatus::Done);
    assert!(store.update_payload(project.id, done).await?);
    assert!(!store.update_payload(12345, done).await?);

    let stored = store.find_by_id(project.id).await?.expect("exists");
    assert_eq!(stored.payload.status, SpecStatus::Done);
    Ok(())
}

// =========================================================================
// Deletion
// =========================================================================

#[tokio::test]
async fn test_delete_subtree_cascades() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = org_store(&db);

    let root = store.insert_root("HQ", OrganizationPayload).await?;
    let other = store.insert_root("Branch", OrganizationPayload).await?;
    let a = store.insert_child(root.id, "A", OrganizationPayload).await?;
    let b = store.insert_child(root.id, "B", OrganizationPayload).await?;
    let a1 = store.insert_child(a.id, "A1", OrganizationPayload).await?;

    assert_eq!(store.delete_subtree(root.id).await?, 4);
    for id in [root.id, a.id, b.id, a1.id] {
        assert!(store.find_by_id(id).await?.is_none());
    }
    assert!(store.find_by_id(other.id).await?.is_some());
    assert_eq!(store.delete_subtree(root.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_sort_order_is_sibling_count_after_delete() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = org_store(&db);

    let root = store.insert_root("HQ", OrganizationPayload).await?;
    let a = store.insert_child(root.id, "A", OrganizationPayload).await?;
    store.insert_child(root.id, "B", OrganizationPayload).await?;
    store.insert_child(root.id, "C", OrganizationPayload).await?;
    store.delete_subtree(a.id).await?;

    let siblings_before = store.find_children(root.id).await?.len() as i64;
    let d = store.insert_child(root.id, "D", OrganizationPayload).await?;
    assert_eq!(d.sort_order, siblings_before);
    assert_eq!(d.sort_order, 2);

    // survivors are not renumbered; the tie with C is broken by id
    let children: Vec<_> = store
        .find_children(root.id)
        .await?
        .into_iter()
        .map(|n| (n.name, n.sort_order))
        .collect();
    assert_eq!(
        children,
        vec![
            ("B".to_string(), 1),
            ("C".to_string(), 2),
            ("D".to_string(), 2)
        ]
    );
    Ok(())
}

// =========================================================================
// Recursive reads
// =========================================================================

#[tokio::test]
async fn test_fetch_tree_rows_order_and_assembly() -> Result<()> {
    let (db, _temp_dir) = create_test_env().await?;
    let store = org_store(&db);

    let r1 = store.insert_root("R1", OrganizationPayload).await?;
    let r2 = store.insert_root("R2", OrganizationPayload).await?;
    let c1 = store.insert_child(r1.id, "C1", OrganizationPayload).await?;
    let c2 = store.insert_child(r2.id, "C2", OrganizationPayload).await?;
    let g1 = store.insert_child(c1.id, "G1", OrganizationPayload).await?;

    let rows = store.fetch_tree_rows(TreeScope::Forest).await?;
    let keys: Vec<_> = rows
        .iter()
        .map(|r| (r.node.depth, r.node.sort_order, r.node.id))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert!(rows.iter().all(|r| r.leaf.is_none()));

    let assembly = assemble(rows, TreeScope::Forest);
    assert!(assembly.is_consistent());
    assert_eq!(assembly.roots.len(), 2);
    assert_eq!(assembly.roots[0].node.id, r1.id);
    assert_eq!(assembly.roots[0].children[0].node.id, c1.id);
    assert_eq!(assembly.roots[0].children[0].children[0].node.id, g1.id);
    assert_eq!(assembly.roots[1].children[0].node.id, c2.id);

    let subtree = assemble(
        store.fetch_tree_rows(TreeScope::Subtree(c1.id)).await?,
        TreeScope::Subtree(c1.id),
    );
    assert_eq!(subtree.roots.len(), 1);
    assert_eq!(subtree.roots[0].count(), 2);
    Ok(())
}
