use packlist_core::db::{open_db, open_db_in_memory};
use packlist_core::{
    CategoryId, CategoryItemId, CategoryItemPatch, CategoryItemService, CategoryService,
    ListService, NewItem, NewList, UserId, UserService,
};
use rusqlite::Connection;
use std::path::Path;
use std::thread;

fn seed(conn: &Connection) -> (UserId, CategoryId, Vec<CategoryItemId>) {
    let owner = UserService::try_new(conn)
        .unwrap()
        .register("owner@example.com", "Owner")
        .unwrap()
        .id;
    let list_id = ListService::try_new(conn)
        .unwrap()
        .create(owner, NewList::default())
        .unwrap()
        .id;
    let category_id = CategoryService::try_new(conn)
        .unwrap()
        .create(owner, list_id, "Gear")
        .unwrap()
        .id;
    let items = CategoryItemService::try_new(conn).unwrap();
    let ids = ["A", "B", "C", "D"]
        .iter()
        .map(|name| {
            items
                .create_and_add(
                    owner,
                    category_id,
                    NewItem {
                        name: name.to_string(),
                        ..NewItem::default()
                    },
                )
                .unwrap()
                .category_item
                .id
        })
        .collect();
    (owner, category_id, ids)
}

fn positions(conn: &Connection, category_id: CategoryId) -> Vec<i64> {
    let mut stmt = conn
        .prepare("SELECT sort_order FROM category_items WHERE category_id = ?1 ORDER BY sort_order;")
        .unwrap();
    let rows = stmt
        .query_map([category_id.to_string()], |row| row.get(0))
        .unwrap();
    rows.map(Result::unwrap).collect()
}

fn run_moves(path: &Path, owner: UserId, moves: Vec<(CategoryItemId, i64)>) {
    let conn = open_db(path).unwrap();
    let service = CategoryItemService::try_new(&conn).unwrap();
    for (id, target) in moves {
        service
            .update(
                owner,
                id,
                CategoryItemPatch {
                    sort_order: Some(target),
                    ..CategoryItemPatch::default()
                },
            )
            .unwrap();
    }
}

#[test]
fn concurrent_moves_on_one_category_leave_dense_positions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    let conn = open_db(&path).unwrap();
    let (owner, category_id, ids) = seed(&conn);

    let first: Vec<(CategoryItemId, i64)> = (0..20).map(|round| (ids[2], round % 4)).collect();
    let second: Vec<(CategoryItemId, i64)> =
        (0..20).map(|round| (ids[0], 3 - round % 4)).collect();

    let first_path = path.clone();
    let second_path = path.clone();
    let first_worker = thread::spawn(move || run_moves(&first_path, owner, first));
    let second_worker = thread::spawn(move || run_moves(&second_path, owner, second));
    first_worker.join().unwrap();
    second_worker.join().unwrap();

    assert_eq!(positions(&conn, category_id), vec![0, 1, 2, 3]);
}

#[test]
fn in_memory_databases_are_isolated() {
    let first = open_db_in_memory().unwrap();
    let second = open_db_in_memory().unwrap();
    let (_owner, category_id, _ids) = seed(&first);

    assert_eq!(positions(&first, category_id), vec![0, 1, 2, 3]);
    assert!(positions(&second, category_id).is_empty());
}
