use packlist_core::db::open_db_in_memory;
use packlist_core::repo::ordering_store::{CategoryItemScopeResolver, SqliteAccessPolicy};
use packlist_core::{
    CategoryId, CategoryItemId, CategoryItemPatch, CategoryItemService, CategoryService,
    EntityKind, ListService, MoveCoordinator, MoveError, NewItem, NewList, ServiceError, UserId,
    UserService,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    conn: Connection,
    owner: UserId,
    category_id: CategoryId,
}

fn setup() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let owner = UserService::try_new(&conn)
        .unwrap()
        .register("owner@example.com", "Owner")
        .unwrap()
        .id;
    let list = ListService::try_new(&conn)
        .unwrap()
        .create(
            owner,
            NewList {
                name: "Alps".to_string(),
                ..NewList::default()
            },
        )
        .unwrap();
    let category_id = CategoryService::try_new(&conn)
        .unwrap()
        .create(owner, list.id, "Kitchen")
        .unwrap()
        .id;
    Fixture {
        conn,
        owner,
        category_id,
    }
}

fn add_named(fixture: &Fixture, names: &[&str]) -> Vec<CategoryItemId> {
    let service = CategoryItemService::try_new(&fixture.conn).unwrap();
    names
        .iter()
        .map(|name| {
            service
                .create_and_add(
                    fixture.owner,
                    fixture.category_id,
                    NewItem {
                        name: name.to_string(),
                        weight: 100.0,
                        ..NewItem::default()
                    },
                )
                .unwrap()
                .category_item
                .id
        })
        .collect()
}

fn ordered(conn: &Connection, category_id: CategoryId) -> Vec<(Uuid, i64)> {
    let mut stmt = conn
        .prepare(
            "SELECT id, sort_order FROM category_items
             WHERE category_id = ?1
             ORDER BY sort_order ASC, id ASC;",
        )
        .unwrap();
    let mut rows = stmt.query([category_id.to_string()]).unwrap();
    let mut result = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let id: String = row.get(0).unwrap();
        result.push((Uuid::parse_str(&id).unwrap(), row.get(1).unwrap()));
    }
    result
}

fn move_to(fixture: &Fixture, id: CategoryItemId, target: i64) -> Result<i64, ServiceError> {
    CategoryItemService::try_new(&fixture.conn)
        .unwrap()
        .update(
            fixture.owner,
            id,
            CategoryItemPatch {
                sort_order: Some(target),
                ..CategoryItemPatch::default()
            },
        )
        .map(|category_item| category_item.sort_order)
}

#[test]
fn moving_third_item_to_front_shifts_the_rest_down() {
    let fixture = setup();
    let ids = add_named(&fixture, &["A", "B", "C", "D"]);
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);

    assert_eq!(move_to(&fixture, c, 0).unwrap(), 0);

    assert_eq!(
        ordered(&fixture.conn, fixture.category_id),
        vec![(c, 0), (a, 1), (b, 2), (d, 3)]
    );
}

#[test]
fn moving_to_last_index_appends_and_keeps_density() {
    let fixture = setup();
    let ids = add_named(&fixture, &["A", "B", "C"]);

    assert_eq!(move_to(&fixture, ids[0], 2).unwrap(), 2);

    assert_eq!(
        ordered(&fixture.conn, fixture.category_id),
        vec![(ids[1], 0), (ids[2], 1), (ids[0], 2)]
    );
}

#[test]
fn moving_to_current_position_rewrites_dense_positions() {
    let fixture = setup();
    let ids = add_named(&fixture, &["A", "B", "C"]);
    fixture
        .conn
        .execute(
            "UPDATE category_items SET sort_order = sort_order * 10;",
            [],
        )
        .unwrap();

    assert_eq!(move_to(&fixture, ids[1], 1).unwrap(), 1);

    assert_eq!(
        ordered(&fixture.conn, fixture.category_id),
        vec![(ids[0], 0), (ids[1], 1), (ids[2], 2)]
    );
}

#[test]
fn duplicate_positions_are_healed_by_the_next_move() {
    let fixture = setup();
    let ids = add_named(&fixture, &["A", "B", "C"]);
    fixture
        .conn
        .execute("UPDATE category_items SET sort_order = 0;", [])
        .unwrap();

    let mut tie_order: Vec<Uuid> = ids.clone();
    tie_order.sort();
    move_to(&fixture, tie_order[2], 0).unwrap();

    let positions: Vec<i64> = ordered(&fixture.conn, fixture.category_id)
        .into_iter()
        .map(|(_, position)| position)
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(ordered(&fixture.conn, fixture.category_id)[0].0, tie_order[2]);
}

#[test]
fn out_of_range_target_is_rejected_without_writes() {
    let fixture = setup();
    let ids = add_named(&fixture, &["A", "B", "C"]);
    let before = ordered(&fixture.conn, fixture.category_id);

    let err = move_to(&fixture, ids[0], 5).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidArgument {
            target_position: 5,
            sibling_count: 3
        }
    ));
    let err = move_to(&fixture, ids[0], -1).unwrap_err();
    assert_eq!(err.code(), "invalid_argument");

    assert_eq!(ordered(&fixture.conn, fixture.category_id), before);
}

#[test]
fn unknown_entity_is_not_found() {
    let fixture = setup();
    add_named(&fixture, &["A"]);
    let missing = Uuid::new_v4();

    let coordinator = MoveCoordinator::new(
        CategoryItemScopeResolver::try_new(&fixture.conn).unwrap(),
        SqliteAccessPolicy::try_new(&fixture.conn).unwrap(),
    );
    match coordinator.move_entity(fixture.owner, missing, 0) {
        Err(MoveError::NotFound { kind, id }) => {
            assert_eq!(kind, EntityKind::CategoryItem);
            assert_eq!(id, missing);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn non_member_is_forbidden_and_nothing_changes() {
    let fixture = setup();
    let ids = add_named(&fixture, &["A", "B"]);
    let stranger = UserService::try_new(&fixture.conn)
        .unwrap()
        .register("stranger@example.com", "")
        .unwrap()
        .id;
    let before = ordered(&fixture.conn, fixture.category_id);

    let coordinator = MoveCoordinator::new(
        CategoryItemScopeResolver::try_new(&fixture.conn).unwrap(),
        SqliteAccessPolicy::try_new(&fixture.conn).unwrap(),
    );
    let err = coordinator.move_entity(stranger, ids[1], 0).unwrap_err();
    assert!(matches!(err, MoveError::Forbidden { .. }));
    assert_eq!(err.code(), "forbidden");
    assert_eq!(ordered(&fixture.conn, fixture.category_id), before);
}

#[test]
fn other_categories_are_untouched_by_a_move() {
    let fixture = setup();
    let ids = add_named(&fixture, &["A", "B", "C"]);

    let list_id: String = fixture
        .conn
        .query_row(
            "SELECT list_id FROM categories WHERE id = ?1;",
            [fixture.category_id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    let other_category = CategoryService::try_new(&fixture.conn)
        .unwrap()
        .create(fixture.owner, Uuid::parse_str(&list_id).unwrap(), "Sleep")
        .unwrap();
    let sibling_service = CategoryItemService::try_new(&fixture.conn).unwrap();
    let pad = sibling_service
        .create_and_add(
            fixture.owner,
            other_category.id,
            NewItem {
                name: "Pad".to_string(),
                ..NewItem::default()
            },
        )
        .unwrap();
    let before_other = ordered(&fixture.conn, other_category.id);

    move_to(&fixture, ids[2], 0).unwrap();

    assert_eq!(ordered(&fixture.conn, other_category.id), before_other);
    assert_eq!(before_other, vec![(pad.category_item.id, 0)]);
}
