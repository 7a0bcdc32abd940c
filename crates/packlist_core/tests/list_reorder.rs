use packlist_core::db::open_db_in_memory;
use packlist_core::{ListId, ListPatch, ListService, NewList, ServiceError, UserId, UserService};
use rusqlite::Connection;

fn setup() -> (Connection, UserId) {
    let conn = open_db_in_memory().unwrap();
    let user = UserService::try_new(&conn)
        .unwrap()
        .register("hiker@example.com", "Hiker")
        .unwrap();
    (conn, user.id)
}

fn create_lists(conn: &Connection, owner: UserId, names: &[&str]) -> Vec<ListId> {
    let service = ListService::try_new(conn).unwrap();
    names
        .iter()
        .map(|name| {
            service
                .create(
                    owner,
                    NewList {
                        name: name.to_string(),
                        description: String::new(),
                    },
                )
                .unwrap()
                .id
        })
        .collect()
}

fn visible(conn: &Connection, user: UserId) -> Vec<(ListId, i64)> {
    ListService::try_new(conn)
        .unwrap()
        .list_for_user(user)
        .unwrap()
        .into_iter()
        .map(|list| (list.id, list.sort_order))
        .collect()
}

#[test]
fn new_lists_are_appended_in_creation_order() {
    let (conn, owner) = setup();
    let ids = create_lists(&conn, owner, &["Alps", "Coast", "Desert"]);

    assert_eq!(
        visible(&conn, owner),
        vec![(ids[0], 0), (ids[1], 1), (ids[2], 2)]
    );
}

#[test]
fn patch_with_sort_order_moves_list_and_applies_fields() {
    let (conn, owner) = setup();
    let ids = create_lists(&conn, owner, &["Alps", "Coast", "Desert"]);
    let service = ListService::try_new(&conn).unwrap();

    let moved = service
        .update(
            owner,
            ids[2],
            ListPatch {
                name: Some("  Desert 2026 ".to_string()),
                sort_order: Some(0),
                ..ListPatch::default()
            },
        )
        .unwrap();

    assert_eq!(moved.name, "Desert 2026");
    assert_eq!(moved.sort_order, 0);
    assert_eq!(
        visible(&conn, owner),
        vec![(ids[2], 0), (ids[0], 1), (ids[1], 2)]
    );
}

#[test]
fn lists_of_other_users_do_not_count_as_siblings() {
    let (conn, owner) = setup();
    let other = UserService::try_new(&conn)
        .unwrap()
        .register("other@example.com", "")
        .unwrap()
        .id;
    let foreign = create_lists(&conn, other, &["Foreign A", "Foreign B"]);
    let ids = create_lists(&conn, owner, &["Alps", "Coast"]);

    let service = ListService::try_new(&conn).unwrap();
    let err = service
        .update(
            owner,
            ids[0],
            ListPatch {
                sort_order: Some(2),
                ..ListPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidArgument {
            target_position: 2,
            sibling_count: 2
        }
    ));

    service
        .update(
            owner,
            ids[0],
            ListPatch {
                sort_order: Some(1),
                ..ListPatch::default()
            },
        )
        .unwrap();
    assert_eq!(visible(&conn, owner), vec![(ids[1], 0), (ids[0], 1)]);
    assert_eq!(
        visible(&conn, other),
        vec![(foreign[0], 0), (foreign[1], 1)]
    );
}

#[test]
fn non_member_cannot_move_or_edit_a_list() {
    let (conn, owner) = setup();
    let ids = create_lists(&conn, owner, &["Alps"]);
    let stranger = UserService::try_new(&conn)
        .unwrap()
        .register("stranger@example.com", "")
        .unwrap()
        .id;

    let err = ListService::try_new(&conn)
        .unwrap()
        .update(
            stranger,
            ids[0],
            ListPatch {
                name: Some("Mine now".to_string()),
                sort_order: Some(0),
                ..ListPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), "forbidden");
    assert_eq!(
        ListService::try_new(&conn)
            .unwrap()
            .get_expanded(owner, ids[0])
            .unwrap()
            .list
            .name,
        "Alps"
    );
}

#[test]
fn pending_member_sees_list_only_after_accepting() {
    let (conn, owner) = setup();
    let ids = create_lists(&conn, owner, &["Shared"]);
    let friend = UserService::try_new(&conn)
        .unwrap()
        .register("friend@example.com", "Friend")
        .unwrap()
        .id;
    let own = create_lists(&conn, friend, &["Friend's own"]);
    let service = ListService::try_new(&conn).unwrap();

    let invited = service.add_member(owner, ids[0], friend, false).unwrap();
    assert!(invited.is_pending);
    assert_eq!(visible(&conn, friend), vec![(own[0], 0)]);
    assert_eq!(
        service
            .update(
                friend,
                ids[0],
                ListPatch {
                    sort_order: Some(0),
                    ..ListPatch::default()
                },
            )
            .unwrap_err()
            .code(),
        "forbidden"
    );

    let accepted = service.accept_invite(friend, ids[0]).unwrap();
    assert!(!accepted.is_pending);
    let friend_view: Vec<ListId> = visible(&conn, friend)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(friend_view.len(), 2);
    assert!(friend_view.contains(&ids[0]));

    let err = service.add_member(friend, ids[0], owner, true).unwrap_err();
    assert_eq!(err.code(), "forbidden");
    let err = service.add_member(owner, ids[0], friend, true).unwrap_err();
    assert_eq!(err.code(), "conflict");
}

#[test]
fn shared_list_position_is_one_column_for_all_members() {
    let (conn, owner) = setup();
    let owned = create_lists(&conn, owner, &["Shared", "Owner only"]);
    let friend = UserService::try_new(&conn)
        .unwrap()
        .register("friend@example.com", "Friend")
        .unwrap()
        .id;
    let own = create_lists(&conn, friend, &["Friend one", "Friend two"]);
    let service = ListService::try_new(&conn).unwrap();
    service.add_member(owner, owned[0], friend, false).unwrap();
    service.accept_invite(friend, owned[0]).unwrap();

    service
        .update(
            owner,
            owned[0],
            ListPatch {
                sort_order: Some(1),
                ..ListPatch::default()
            },
        )
        .unwrap();
    assert_eq!(visible(&conn, owner), vec![(owned[1], 0), (owned[0], 1)]);

    // The friend now sees a tie at 1; it resolves by id, the same on every read.
    let friend_view = visible(&conn, friend);
    let mut expected = vec![(own[0], 0), (own[1], 1), (owned[0], 1)];
    expected.sort_by_key(|(id, position)| (*position, id.to_string()));
    assert_eq!(friend_view, expected);
    assert_eq!(visible(&conn, friend), friend_view);

    service
        .update(
            friend,
            own[1],
            ListPatch {
                sort_order: Some(0),
                ..ListPatch::default()
            },
        )
        .unwrap();
    assert_eq!(
        visible(&conn, friend),
        vec![(own[1], 0), (own[0], 1), (owned[0], 2)]
    );
    // The owner's view keeps its order but now has a gap.
    assert_eq!(visible(&conn, owner), vec![(owned[1], 0), (owned[0], 2)]);
}
