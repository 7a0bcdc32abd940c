use packlist_core::db::open_db_in_memory;
use packlist_core::{
    CategoryItemService, CategoryService, EntityKind, ListService, NewItem, NewList, UserService,
    WeightUnit,
};
use serde_json::Value;

#[test]
fn expanded_list_serializes_flat_records_with_nested_children() {
    let conn = open_db_in_memory().unwrap();
    let owner = UserService::try_new(&conn)
        .unwrap()
        .register("owner@example.com", "")
        .unwrap()
        .id;
    let list = ListService::try_new(&conn)
        .unwrap()
        .create(
            owner,
            NewList {
                name: "Coast".to_string(),
                ..NewList::default()
            },
        )
        .unwrap();
    let category = CategoryService::try_new(&conn)
        .unwrap()
        .create(owner, list.id, "Water")
        .unwrap();
    CategoryItemService::try_new(&conn)
        .unwrap()
        .create_and_add(
            owner,
            category.id,
            NewItem {
                name: "Filter".to_string(),
                weight: 1.5,
                weight_unit: WeightUnit::Kg,
                ..NewItem::default()
            },
        )
        .unwrap();

    let expanded = ListService::try_new(&conn)
        .unwrap()
        .get_expanded(owner, list.id)
        .unwrap();
    let json: Value = serde_json::to_value(&expanded).unwrap();

    assert_eq!(json["id"], list.id.to_string());
    assert_eq!(json["name"], "Coast");
    assert_eq!(json["sort_order"], 0);
    let category_json = &json["categories"][0];
    assert_eq!(category_json["name"], "Water");
    assert_eq!(category_json["packed"], false);
    let entry = &category_json["items"][0];
    assert_eq!(entry["quantity"], 1);
    assert_eq!(entry["packed"], false);
    assert_eq!(entry["item"]["name"], "Filter");
    assert_eq!(entry["item"]["weight_unit"], "kg");
}

#[test]
fn entity_kind_uses_snake_case_on_the_wire() {
    assert_eq!(
        serde_json::to_string(&EntityKind::CategoryItem).unwrap(),
        "\"category_item\""
    );
    let kind: EntityKind = serde_json::from_str("\"list\"").unwrap();
    assert_eq!(kind, EntityKind::List);
    assert_eq!(EntityKind::CategoryItem.to_string(), "category_item");
}
