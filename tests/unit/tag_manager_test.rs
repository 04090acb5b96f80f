//! Unit tests for the TagManager: name resolution, back-references, and
//! colour assignment.

use linkvault::database::Database;
use linkvault::managers::folder_manager::{FolderManager, FolderManagerTrait};
use linkvault::managers::link_manager::{LinkManager, LinkManagerTrait};
use linkvault::managers::tag_manager::{random_color, TagManager, TagManagerTrait};
use linkvault::types::errors::TagError;
use linkvault::types::link::{BookmarkLink, LinkFields};
use linkvault::types::tag::TAG_PALETTE;
use linkvault::types::Scope;
use ring::rand::SystemRandom;

fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn new_link(db: &Database, scope: &Scope, url: &str) -> BookmarkLink {
    let conn = db.connection();
    LinkManager::new(&conn).insert_link(scope, LinkFields::blank(url)).unwrap()
}

#[test]
fn test_duplicate_names_resolve_to_one_tag() {
    let db = setup();
    let scope = Scope::uncategorized("u1");
    let link = new_link(&db, &scope, "https://a.com");
    let conn = db.connection();

    let ids = TagManager::new(&conn)
        .reconcile("u1", &link.id, None, &names(&["work", "work"]))
        .unwrap();

    assert_eq!(ids.len(), 1);
    assert_eq!(TagManager::new(&conn).list_tags("u1").unwrap().len(), 1);
    assert_eq!(LinkManager::new(&conn).get_link(&scope, &link.id).unwrap().tags, ids);
}

#[test]
fn test_existing_tag_is_reused_across_links() {
    let db = setup();
    let scope = Scope::uncategorized("u1");
    let a = new_link(&db, &scope, "https://a.com");
    let b = new_link(&db, &scope, "https://b.com");
    let conn = db.connection();
    let mut tags = TagManager::new(&conn);

    let first = tags.reconcile("u1", &a.id, None, &names(&["rust"])).unwrap();
    let second = tags.reconcile("u1", &b.id, None, &names(&["rust"])).unwrap();

    assert_eq!(first, second);
    let tag = tags.get_tag(&first[0]).unwrap().unwrap();
    assert_eq!(tag.links, vec![a.id, b.id]);
}

#[test]
fn test_names_are_case_sensitive() {
    let db = setup();
    let scope = Scope::uncategorized("u1");
    let link = new_link(&db, &scope, "https://a.com");
    let conn = db.connection();

    let ids = TagManager::new(&conn)
        .reconcile("u1", &link.id, None, &names(&["Rust", "rust"]))
        .unwrap();
    assert_eq!(ids.len(), 2);
}

#[test]
fn test_blank_names_are_skipped_and_trimmed() {
    let db = setup();
    let scope = Scope::uncategorized("u1");
    let link = new_link(&db, &scope, "https://a.com");
    let conn = db.connection();
    let mut tags = TagManager::new(&conn);

    let ids = tags
        .reconcile("u1", &link.id, None, &names(&["", "  ", " work "]))
        .unwrap();

    assert_eq!(ids.len(), 1);
    assert_eq!(tags.get_tag(&ids[0]).unwrap().unwrap().name, "work");
    assert_eq!(tags.find_by_name("u1", "work").unwrap(), Some(ids[0].clone()));
}

#[test]
fn test_tag_set_is_replaced_not_merged() {
    let db = setup();
    let scope = Scope::uncategorized("u1");
    let link = new_link(&db, &scope, "https://a.com");
    let conn = db.connection();
    let mut tags = TagManager::new(&conn);

    tags.reconcile("u1", &link.id, None, &names(&["a", "b"])).unwrap();
    let latest = tags.reconcile("u1", &link.id, None, &names(&["c"])).unwrap();

    let stored = LinkManager::new(&conn).get_link(&scope, &link.id).unwrap();
    assert_eq!(stored.tags, latest);
    // Dropped tags still remember the link.
    let a = tags.find_by_name("u1", "a").unwrap().unwrap();
    assert_eq!(tags.get_tag(&a).unwrap().unwrap().links, vec![link.id]);
}

#[test]
fn test_empty_name_list_clears_link_tags() {
    let db = setup();
    let scope = Scope::uncategorized("u1");
    let link = new_link(&db, &scope, "https://a.com");
    let conn = db.connection();
    let mut tags = TagManager::new(&conn);

    tags.reconcile("u1", &link.id, None, &names(&["a"])).unwrap();
    tags.reconcile("u1", &link.id, None, &[]).unwrap();

    assert!(LinkManager::new(&conn).get_link(&scope, &link.id).unwrap().tags.is_empty());
    assert_eq!(tags.list_tags("u1").unwrap().len(), 1);
}

#[test]
fn test_folder_back_reference_recorded() {
    let db = setup();
    let folder = {
        let conn = db.connection();
        FolderManager::new(&conn).create_folder("u1", "Work").unwrap()
    };
    let scope = Scope::new("u1", Some(folder.id.clone()));
    let link = new_link(&db, &scope, "https://a.com");
    let conn = db.connection();

    let ids = TagManager::new(&conn)
        .reconcile("u1", &link.id, Some(&folder.id), &names(&["work"]))
        .unwrap();
    let tag = TagManager::new(&conn).get_tag(&ids[0]).unwrap().unwrap();
    assert_eq!(tag.folders, vec![folder.id]);
}

#[test]
fn test_tags_are_scoped_per_user() {
    let db = setup();
    let a = new_link(&db, &Scope::uncategorized("u1"), "https://a.com");
    let b = new_link(&db, &Scope::uncategorized("u2"), "https://a.com");
    let conn = db.connection();
    let mut tags = TagManager::new(&conn);

    let first = tags.reconcile("u1", &a.id, None, &names(&["work"])).unwrap();
    let second = tags.reconcile("u2", &b.id, None, &names(&["work"])).unwrap();

    assert_ne!(first, second);
    assert_eq!(tags.list_tags("u1").unwrap().len(), 1);
    assert_eq!(tags.list_tags("u2").unwrap().len(), 1);
}

#[test]
fn test_reconcile_for_missing_link_rolls_back() {
    let db = setup();
    let conn = db.connection();
    let mut tags = TagManager::new(&conn);

    let err = tags.reconcile("u1", "ghost", None, &names(&["work"])).unwrap_err();
    assert!(matches!(err, TagError::DatabaseError(_)));
    assert!(tags.list_tags("u1").unwrap().is_empty());
}

#[test]
fn test_random_color_is_from_palette() {
    let rng = SystemRandom::new();
    for _ in 0..50 {
        let color = random_color(&rng).unwrap();
        assert!(TAG_PALETTE.contains(&color));
    }
}

#[test]
fn test_get_unknown_tag_is_none() {
    let db = setup();
    let conn = db.connection();
    assert!(TagManager::new(&conn).get_tag("nope").unwrap().is_none());
}
