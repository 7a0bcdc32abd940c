use packlist_core::db::open_db_in_memory;
use packlist_core::{
    EntityKind, FeedbackService, ItemService, ListService, NewItem, NewList, ServiceError,
    UserService,
};

#[test]
fn register_normalizes_email_and_rejects_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::try_new(&conn).unwrap();

    let user = users.register("  Hiker@Example.COM ", " Hiker ").unwrap();
    assert_eq!(user.email, "hiker@example.com");
    assert_eq!(user.name, "Hiker");
    assert_eq!(users.get(user.id).unwrap(), user);

    match users.register("hiker@example.com", "Again") {
        Err(ServiceError::Conflict { kind, id }) => {
            assert_eq!(kind, EntityKind::User);
            assert_eq!(id, user.id);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let err = users.register("not-an-email", "").unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn removing_user_cascades_to_owned_rows() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::try_new(&conn).unwrap();
    let user = users.register("gone@example.com", "").unwrap();
    let list = ListService::try_new(&conn)
        .unwrap()
        .create(user.id, NewList::default())
        .unwrap();
    ItemService::try_new(&conn)
        .unwrap()
        .create(user.id, NewItem::default())
        .unwrap();
    FeedbackService::try_new(&conn)
        .unwrap()
        .submit(user.id, "Great app")
        .unwrap();

    users.remove(user.id).unwrap();

    assert_eq!(users.get(user.id).unwrap_err().code(), "not_found");
    for table in ["list_users", "items", "app_feedback"] {
        let remaining: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(remaining, 0, "{table} should be empty");
    }
    // The list itself survives without members.
    let lists: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM lists WHERE id = ?1;",
            [list.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(lists, 1);
    assert_eq!(users.remove(user.id).unwrap_err().code(), "not_found");
}

#[test]
fn feedback_is_trimmed_and_blank_text_rejected() {
    let conn = open_db_in_memory().unwrap();
    let user = UserService::try_new(&conn)
        .unwrap()
        .register("fan@example.com", "")
        .unwrap();
    let feedback = FeedbackService::try_new(&conn).unwrap();

    let stored = feedback.submit(user.id, "  Needs dark mode \n").unwrap();
    assert_eq!(stored.feedback, "Needs dark mode");
    assert_eq!(stored.user_id, user.id);

    let err = feedback.submit(user.id, "   ").unwrap_err();
    assert_eq!(err.code(), "validation_failed");

    let history = feedback.history(user.id).unwrap();
    assert_eq!(history, vec![stored]);
}

#[test]
fn item_validation_and_updates() {
    let conn = open_db_in_memory().unwrap();
    let user = UserService::try_new(&conn)
        .unwrap()
        .register("gear@example.com", "")
        .unwrap();
    let items = ItemService::try_new(&conn).unwrap();

    let err = items
        .create(
            user.id,
            NewItem {
                weight: -5.0,
                ..NewItem::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let stove = items
        .create(
            user.id,
            NewItem {
                name: "Stove".to_string(),
                weight: 80.0,
                ..NewItem::default()
            },
        )
        .unwrap();
    let updated = items
        .update(
            user.id,
            stove.id,
            packlist_core::ItemPatch {
                weight: Some(2.8),
                weight_unit: Some(packlist_core::WeightUnit::Oz),
                ..packlist_core::ItemPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Stove");
    assert_eq!(updated.weight, 2.8);
    assert_eq!(updated.weight_unit, packlist_core::WeightUnit::Oz);
    assert_eq!(items.list_for_user(user.id).unwrap(), vec![updated]);
}
