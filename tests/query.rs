//! Integration tests for the fluent query builder against `MockDriver`

mod common;

use common::{join_entity, tag_entity, test_entity};
use fake::faker::name::en::Name;
use fake::Fake;
use rowfold::{
    row, Condition, Database, EntityRegistry, FromRecord, MockDriver, OrmError, Record, Relation,
    Result, SortOrder, Value,
};

// ============================================================================
// Binding and validation
// ============================================================================

#[test]
fn builder_calls_require_an_entity() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    assert_eq!(query.filter_eq("a", 1).err(), Some(OrmError::EntityNotBound));
    assert_eq!(query.limit(1, 0).err(), Some(OrmError::EntityNotBound));
    assert_eq!(query.sql().err(), Some(OrmError::EntityNotBound));
    assert_eq!(query.find().err(), Some(OrmError::EntityNotBound));
}

#[test]
fn unknown_columns_fail_at_the_call_that_names_them() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query.entity(test_entity());
    assert!(matches!(
        query.select("nope"),
        Err(OrmError::ColumnNotFound { ref column, .. }) if column == "nope"
    ));
    assert!(query.order_by("nope", SortOrder::Asc).is_err());
    assert!(query.join(join_entity(), "primary", "nope").is_err());
}

#[test]
fn filter_rejects_null_and_unary_relations() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query.entity(test_entity());
    assert!(matches!(
        query.filter("testColumn", Value::Null, Relation::Equal),
        Err(OrmError::InvalidArgument(_))
    ));
    assert!(query.filter("testColumn", 1, Relation::IsNull).is_err());
    assert!(query.filter("testColumn", 1, Relation::Own).is_err());
    assert!(query.filter("testColumn", vec![1], Relation::Greater).is_err());
    assert!(query.condition().is_empty());
}

#[test]
fn filter_condition_validates_nested_arguments() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query.entity(test_entity());

    let mut bad = Condition::any();
    bad.add("testColumn", 1, Relation::Equal)
        .add_condition({
            let mut inner = Condition::all();
            inner.add("ghost", 1, Relation::Equal);
            inner
        });
    assert!(matches!(
        query.filter_condition(bad),
        Err(OrmError::ColumnNotFound { .. })
    ));

    let mut raw = Condition::all();
    raw.add_argument(rowfold::Argument::raw("1 = 1"));
    assert!(query.filter_condition(raw).is_err());
    assert!(query.condition().is_empty());
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn query_without_filters_has_no_where() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query.entity(test_entity());
    let sql = query.sql().unwrap();
    assert!(!sql.contains("WHERE"), "{sql}");
    assert_eq!(
        sql,
        "SELECT `testTable`.`primary`, `testTable`.`testColumn`, `testTable`.`testColumn2`, \
         `testTable`.`testColumn3`, `testTable`.`created` FROM `testTable`"
    );
}

#[test]
fn custom_selection_always_includes_primary() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query
        .entity(test_entity())
        .select("TestField2")
        .unwrap()
        .select("testColumn2")
        .unwrap();
    assert_eq!(
        query.sql().unwrap(),
        "SELECT `testTable`.`primary`, `testTable`.`testColumn2` FROM `testTable`"
    );
}

#[test]
fn filters_combine_with_and() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    let mut either = Condition::any();
    either
        .add("TestField2", "a", Relation::Equal)
        .add("TestField2", "b", Relation::Equal);
    query
        .entity(test_entity())
        .filter("TestField", 5, Relation::GreaterEq)
        .unwrap()
        .filter_condition(either)
        .unwrap()
        .is_null("TestField3")
        .unwrap()
        .filter_raw("testColumn < 100")
        .unwrap()
        .group_by("testColumn")
        .unwrap()
        .limit(20, 40)
        .unwrap();

    let sql = query.sql().unwrap();
    assert!(sql.ends_with(
        r#"FROM `testTable` WHERE (testColumn >= 5) AND ((testColumn2 = "a") OR (testColumn2 = "b")) AND (testColumn3 IS NULL) AND (testColumn < 100) GROUP BY `testTable`.`testColumn` LIMIT 40, 20"#
    ), "{sql}");
}

#[test]
fn joins_qualify_columns_and_allow_ordering_by_child() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query
        .entity(test_entity())
        .join(join_entity(), "primary", "parent_primary")
        .unwrap()
        .inner_join(tag_entity(), "primary", "owner")
        .unwrap()
        .primary(3)
        .unwrap()
        .order_by("JoinTestEntity.label", SortOrder::Desc)
        .unwrap();

    assert_eq!(
        query.sql().unwrap(),
        "SELECT `testTable`.`primary` AS `testTable.primary`, \
         `testTable`.`testColumn` AS `testTable.testColumn`, \
         `testTable`.`testColumn2` AS `testTable.testColumn2`, \
         `testTable`.`testColumn3` AS `testTable.testColumn3`, \
         `testTable`.`created` AS `testTable.created`, \
         `testTable2`.`primary2` AS `testTable2.primary2`, \
         `testTable2`.`parent_primary` AS `testTable2.parent_primary`, \
         `testTable2`.`label` AS `testTable2.label`, \
         `tags`.`tag_id` AS `tags.tag_id`, `tags`.`owner` AS `tags.owner`, `tags`.`name` AS `tags.name` \
         FROM `testTable` \
         LEFT JOIN `testTable2` ON `testTable`.`primary` = `testTable2`.`parent_primary` \
         INNER JOIN `tags` ON `testTable`.`primary` = `tags`.`owner` \
         WHERE (`testTable`.`primary` = 3) \
         ORDER BY `testTable2`.`label` DESC"
    );
}

#[test]
fn filters_reach_joined_entity_columns() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query.entity(test_entity());
    assert!(matches!(
        query.filter_eq("JoinTestEntity.label", "x"),
        Err(OrmError::ColumnNotFound { .. })
    ));

    let mut either = Condition::any();
    either
        .add("Tag.name", "red", Relation::Equal)
        .add("tags.owner", vec![1, 2], Relation::Equal);
    query
        .join(join_entity(), "primary", "parent_primary")
        .unwrap()
        .join(tag_entity(), "primary", "owner")
        .unwrap()
        .like("JoinTestEntity.Label", "a%")
        .unwrap()
        .is_null("testTable2.parent_primary")
        .unwrap()
        .filter_condition(either)
        .unwrap()
        .filter_eq("TestEntity.TestField", 2)
        .unwrap();

    let sql = query.sql().unwrap();
    assert!(sql.ends_with(
        r#"WHERE (`testTable2`.`label` LIKE "a%") AND (`testTable2`.`parent_primary` IS NULL) AND ((`tags`.`name` = "red") OR (`tags`.`owner` IN (1,2))) AND (`testTable`.`testColumn` = 2)"#
    ), "{sql}");
}

#[test]
fn computed_fields_and_random_order_render() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query.entity(test_entity());
    assert!(query.add_field("1", "TestField").is_err());
    assert!(query.add_field(" ", "n").is_err());

    query
        .select("TestField")
        .unwrap()
        .add_field("testColumn * 2", "doubled")
        .unwrap()
        .order_by("TestField", SortOrder::Desc)
        .unwrap()
        .random()
        .unwrap();
    assert_eq!(
        query.sql().unwrap(),
        "SELECT `testTable`.`primary`, `testTable`.`testColumn`, testColumn * 2 AS `doubled` \
         FROM `testTable` ORDER BY `testTable`.`testColumn` DESC, RAND()"
    );
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn find_hydrates_records_and_resets() {
    let name: String = Name().fake();
    let driver = MockDriver::new().append_query_results(vec![vec![
        row! { "primary" => 1, "testColumn" => 4, "testColumn2" => name.clone() },
        row! { "primary" => 2, "testColumn" => 5, "testColumn2" => "other" },
    ]]);
    let db = Database::new(driver);
    let mut query = db.query();
    query.entity(test_entity()).filter_eq("TestField", vec![4, 5]).unwrap();

    let found = query.find().unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].get::<String>("TestField2").unwrap(), name);
    assert!(found.iter().all(Record::is_attached));
    assert!(query.condition().is_empty());
}

#[test]
fn first_returns_none_without_rows() {
    let db = Database::new(MockDriver::new());
    let mut query = db.query();
    query.entity(test_entity()).primary(99).unwrap();
    assert!(query.first().unwrap().is_none());
    assert!(db.driver().last_statement().unwrap().ends_with("LIMIT 0, 1"));
}

#[test]
fn entity_by_name_uses_registry() {
    let mut registry = EntityRegistry::new();
    registry.register(test_entity());
    let db = Database::new(MockDriver::new()).with_registry(registry);

    let mut query = db.query();
    query.entity_by_name("TestEntity").unwrap();
    assert!(query.is_bound());
    assert!(matches!(
        db.query().entity_by_name("Missing"),
        Err(OrmError::UnknownEntity(_))
    ));
}

struct Summary {
    primary: i64,
    value: Option<i32>,
}

impl FromRecord for Summary {
    fn from_record(record: &Record) -> Result<Self> {
        Ok(Summary {
            primary: record.get("primary")?,
            value: record.get_opt("TestField")?,
        })
    }
}

#[test]
fn find_as_converts_records() {
    let value: i32 = (1..1000).fake();
    let driver = MockDriver::new().append_query_results(vec![
        vec![
            row! { "primary" => 1, "testColumn" => value },
            row! { "primary" => 2, "testColumn" => Value::Null },
        ],
        vec![row! { "primary" => "7" }],
    ]);
    let db = Database::new(driver);
    let mut query = db.query();
    query.entity(test_entity());

    let summaries: Vec<Summary> = query.find_as().unwrap();
    assert_eq!(summaries[0].primary, 1);
    assert_eq!(summaries[0].value, Some(value));
    assert_eq!(summaries[1].value, None);

    let first: Option<Summary> = query.first_as().unwrap();
    assert_eq!(first.map(|s| s.primary), Some(7));
}

#[test]
fn computed_fields_are_readable_after_find() {
    let driver = MockDriver::new().append_query_results(vec![vec![
        row! { "primary" => 1, "testColumn" => 4, "doubled" => 8 },
    ]]);
    let db = Database::new(driver);
    let mut query = db.query();
    query
        .entity(test_entity())
        .add_field("testColumn * 2", "doubled")
        .unwrap();

    let found = query.first().unwrap().unwrap();
    assert_eq!(found.get::<i64>("doubled").unwrap(), 8);
    assert_eq!(found.computed().len(), 1);
    assert!(found.values().get("doubled").is_none());
}
