use rowbind::{
    BoxError, Decode, Json, JsonValue, Map, MemoryRows, RowScanner, RowSource, Scan, ScanConfig,
    Scanner, Shape, Value, classify,
    error::{ErrorKind, ShapeViolation},
};
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Default, Clone, PartialEq, Scan)]
pub struct Item {
    pub foo: String,
    pub bar: String,
}

#[derive(Debug, Default, PartialEq, Scan)]
pub struct Profile {
    pub avatar_url: Option<String>,
    pub bio: String,
}

#[derive(Debug, Default, PartialEq, Scan)]
pub struct Audit {
    pub created_by: String,
}

#[derive(Debug, Default, PartialEq, Scan)]
pub struct Account {
    #[scan(db = "account_id")]
    pub id: i64,
    pub r#type: String,
    #[scan(flatten, db = "profile")]
    pub profile: Profile,
    #[scan(flatten)]
    pub audit: Option<Box<Audit>>,
    #[scan(skip)]
    pub cached: u8,
    #[scan(db = "-")]
    pub ignored: String,
    #[allow(dead_code)]
    secret: String,
}

#[derive(Debug, PartialEq, Scan)]
pub struct Counter {
    pub name: String,
    pub step: i32,
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            name: String::new(),
            step: 7,
        }
    }
}

#[derive(Debug, Default, PartialEq, Scan)]
pub struct Conflict {
    pub bio: String,
    #[scan(flatten)]
    pub profile: Profile,
}

#[derive(Debug, Default, PartialEq, Scan)]
pub struct Tagged {
    #[scan(db = "user_id", json = "uid")]
    pub id: i64,
}

#[derive(Debug, Default, PartialEq, Scan)]
pub struct Document {
    pub tags: Json<Vec<String>>,
    pub extra: JsonValue,
    pub attrs: Option<Json<HashMap<String, String>>>,
}

#[derive(Debug, Default, PartialEq, Scan)]
#[scan(primitive)]
pub struct Email(String);

impl Decode for Email {
    fn decode(value: Value) -> Result<Self, BoxError> {
        let email = String::decode(value)?;
        if email.contains('@') {
            Ok(Email(email))
        } else {
            Err(format!("invalid email `{email}`").into())
        }
    }
}

#[derive(Debug, Default, PartialEq, Scan)]
pub struct Contact {
    pub email: Email,
}

fn foo_bar_rows(count: usize) -> MemoryRows {
    let mut rows = MemoryRows::new(["foo", "bar"]);
    for i in 0..count {
        let suffix = if i == 0 {
            String::new()
        } else {
            format!(" {}", i + 1)
        };
        rows.push_row(vec![
            Value::from(format!("foo val{suffix}")),
            Value::from(format!("bar val{suffix}")),
        ]);
    }
    rows
}

#[test]
fn it_scans_rows_into_structs() {
    let mut items = Vec::<Item>::new();
    rowbind::scan_all(&mut items, foo_bar_rows(2)).unwrap();
    assert_eq!(
        items,
        [
            Item {
                foo: "foo val".to_owned(),
                bar: "bar val".to_owned(),
            },
            Item {
                foo: "foo val 2".to_owned(),
                bar: "bar val 2".to_owned(),
            },
        ]
    );
}

#[test]
fn it_scans_rows_into_maps() {
    let mut maps = Vec::<HashMap<String, Value>>::new();
    rowbind::scan_all(&mut maps, foo_bar_rows(2)).unwrap();
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0]["foo"], Value::from("foo val"));
    assert_eq!(maps[1]["bar"], Value::from("bar val 2"));

    let mut objects = Vec::<Map>::new();
    rowbind::scan_all(&mut objects, foo_bar_rows(2)).unwrap();
    assert_eq!(objects[1]["foo"], json!("foo val 2"));

    let mut map = HashMap::<String, String>::new();
    rowbind::scan_one(&mut map, foo_bar_rows(1)).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["bar"], "bar val");
}

#[test]
fn it_discards_previous_elements() {
    let mut items = vec![Item::default(); 5];
    rowbind::scan_all(&mut items, foo_bar_rows(2)).unwrap();
    assert_eq!(items.len(), 2);

    rowbind::scan_all(&mut items, foo_bar_rows(0)).unwrap();
    assert!(items.is_empty());
}

#[test]
fn it_scans_exactly_one_row() {
    let mut item = Item::default();
    let err = rowbind::scan_one(&mut item, foo_bar_rows(0)).unwrap_err();
    assert!(err.is_not_found());
    assert!(rowbind::not_found(&err));

    rowbind::scan_one(&mut item, foo_bar_rows(1)).unwrap();
    assert_eq!(item.foo, "foo val");
    assert_eq!(item.bar, "bar val");

    let err = rowbind::scan_one(&mut item, foo_bar_rows(3)).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::TooManyRows { count: 3 });
    assert_eq!(err.to_string(), "expected 1 row, got: 3");
    assert!(!rowbind::not_found(&err));
}

#[test]
fn it_checks_null_values() {
    let rows = MemoryRows::new(["avatar_url", "bio"])
        .with_row(vec![Value::Null, Value::from("hello")]);
    let mut profile = Profile {
        avatar_url: Some("junk".to_owned()),
        ..Profile::default()
    };
    rowbind::scan_one(&mut profile, rows).unwrap();
    assert_eq!(profile.avatar_url, None);
    assert_eq!(profile.bio, "hello");

    let rows = MemoryRows::new(["avatar_url", "bio"])
        .with_row(vec![Value::from("a.png"), Value::Null]);
    let err = rowbind::scan_one(&mut profile, rows).unwrap_err();
    assert!(err.is_null_value());
    match err.kind() {
        ErrorKind::NullValue {
            column,
            field,
            type_name,
        } => {
            assert_eq!(column, "bio");
            assert_eq!(field.as_ref().map(|path| path.to_string()).as_deref(), Some("bio"));
            assert_eq!(*type_name, "alloc::string::String");
        }
        kind => panic!("unexpected error kind: {kind:?}"),
    }
}

#[test]
fn it_rejects_unmapped_columns() {
    let rows = MemoryRows::new(["foo", "bar", "baz"]).with_row(vec![
        Value::from("foo val"),
        Value::from("bar val"),
        Value::from("baz val"),
    ]);
    let mut item = Item {
        foo: "old foo".to_owned(),
        bar: "old bar".to_owned(),
    };
    let err = rowbind::scan_one(&mut item, rows).unwrap_err();
    match err.kind() {
        ErrorKind::UnmappedColumn { type_name, column } => {
            assert!(type_name.ends_with("Item"));
            assert_eq!(column, "baz");
        }
        kind => panic!("unexpected error kind: {kind:?}"),
    }
    assert_eq!(item.foo, "old foo");

    let rows = MemoryRows::new(["account_id", "secret"])
        .with_row(vec![Value::Int(1), Value::from("hidden")]);
    let mut account = Account::default();
    let err = rowbind::scan_one(&mut account, rows).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnmappedColumn { column, .. } if column == "secret"));
}

#[test]
fn it_writes_duplicate_columns_in_order() {
    let rows = MemoryRows::new(["foo", "foo"]).with_row(vec![Value::from("a"), Value::from("b")]);
    let mut map = HashMap::<String, String>::new();
    rowbind::scan_one(&mut map, rows).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map["foo"], "b");

    let rows = MemoryRows::new(["foo", "foo"]).with_row(vec![Value::from("a"), Value::from("b")]);
    let mut item = Item::default();
    rowbind::scan_one(&mut item, rows).unwrap();
    assert_eq!(
        item,
        Item {
            foo: "b".to_owned(),
            bar: String::new(),
        }
    );
}

#[test]
fn it_keeps_defaults_for_missing_columns() {
    let rows = MemoryRows::new(["name"])
        .with_row(vec![Value::from("clicks")])
        .with_row(vec![Value::from("views")]);
    let mut counters = Vec::<Counter>::new();
    rowbind::scan_all(&mut counters, rows).unwrap();
    assert_eq!(counters.len(), 2);
    assert_eq!(counters[1].name, "views");
    assert!(counters.iter().all(|counter| counter.step == 7));
}

#[test]
fn it_flattens_embedded_structs() {
    let rows = MemoryRows::new([
        "account_id",
        "type",
        "profile.avatar_url",
        "profile.bio",
        "created_by",
    ])
    .with_row(vec![
        Value::Int(7),
        Value::from("admin"),
        Value::Null,
        Value::from("hello"),
        Value::from("root"),
    ]);
    let mut account = Account::default();
    rowbind::scan_one(&mut account, rows).unwrap();
    assert_eq!(account.id, 7);
    assert_eq!(account.r#type, "admin");
    assert_eq!(account.profile.avatar_url, None);
    assert_eq!(account.profile.bio, "hello");
    assert_eq!(account.audit.as_deref().map(|audit| audit.created_by.as_str()), Some("root"));
    assert_eq!(account.cached, 0);
    assert!(account.ignored.is_empty());

    let rows = MemoryRows::new(["account_id", "profile.bio"])
        .with_row(vec![Value::Int(8), Value::from("bye")]);
    let mut accounts = Vec::<Account>::new();
    rowbind::scan_all(&mut accounts, rows).unwrap();
    assert_eq!(accounts[0].id, 8);
    assert_eq!(accounts[0].audit, None);

    let rows = MemoryRows::new(["cached"]).with_row(vec![Value::Int(1)]);
    let err = rowbind::scan_all(&mut accounts, rows).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnmappedColumn { column, .. } if column == "cached"));
}

#[test]
fn it_rejects_duplicate_columns() {
    let rows = MemoryRows::new(["bio"]).with_row(vec![Value::from("hello")]);
    let mut conflict = Conflict::default();
    let err = rowbind::scan_one(&mut conflict, rows).unwrap_err();
    match err.kind() {
        ErrorKind::DuplicateColumn {
            type_name,
            column,
            first,
            second,
        } => {
            assert!(type_name.ends_with("Conflict"));
            assert_eq!(column, "bio");
            assert_eq!(first.to_string(), "bio");
            assert_eq!(second.to_string(), "profile.bio");
        }
        kind => panic!("unexpected error kind: {kind:?}"),
    }
}

#[test]
fn it_scans_nullable_elements() {
    let rows = MemoryRows::new(["n"])
        .with_row(vec![Value::Int(1)])
        .with_row(vec![Value::Null])
        .with_row(vec![Value::Int(3)]);
    let mut numbers = Vec::<Option<i64>>::new();
    rowbind::scan_all(&mut numbers, rows).unwrap();
    assert_eq!(numbers, [Some(1), None, Some(3)]);

    let rows = MemoryRows::new(["n"]).with_row(vec![Value::Null]);
    let mut numbers = Vec::<i64>::new();
    let err = rowbind::scan_all(&mut numbers, rows).unwrap_err();
    assert!(err.is_null_value());

    let mut items = Vec::<Option<Item>>::new();
    rowbind::scan_all(&mut items, foo_bar_rows(2)).unwrap();
    assert_eq!(items[1].as_ref().map(|item| item.foo.as_str()), Some("foo val 2"));
}

#[test]
fn it_classifies_all_shapes_idempotently() {
    fn check<D: Scan>(shape: Shape) {
        let first = classify::<D>().unwrap();
        let second = classify::<D>().unwrap();
        assert_eq!(first.shape(), shape);
        assert_eq!(first.shape(), second.shape());
        assert_eq!(first.type_id(), second.type_id());
        assert_eq!(first.element().type_id(), second.element().type_id());
    }

    check::<i64>(Shape::Primitive);
    check::<Email>(Shape::Primitive);
    check::<Json<Vec<String>>>(Shape::Primitive);
    check::<HashMap<String, Value>>(Shape::Map);
    check::<Item>(Shape::Struct);
    check::<Vec<Option<String>>>(Shape::SliceOfPrimitive);
    check::<Vec<Map>>(Shape::SliceOfMap);
    check::<Vec<Account>>(Shape::SliceOfStruct);

    let err = classify::<Option<Item>>().unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::InvalidDestination {
            reason: ShapeViolation::NestedIndirection,
            ..
        }
    ));
}

#[test]
fn it_uses_the_configured_tag_key() {
    let scanner = Scanner::new(ScanConfig::new().with_tag_key("json"));
    let rows = MemoryRows::new(["uid"]).with_row(vec![Value::Int(42)]);
    let mut tagged = Tagged::default();
    scanner.scan_one(&mut tagged, rows).unwrap();
    assert_eq!(tagged.id, 42);

    let rows = MemoryRows::new(["uid"]).with_row(vec![Value::Int(42)]);
    let err = rowbind::scan_one(&mut tagged, rows).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnmappedColumn { .. }));

    let rows = MemoryRows::new(["user_id"]).with_row(vec![Value::Int(43)]);
    rowbind::scan_one(&mut tagged, rows).unwrap();
    assert_eq!(tagged.id, 43);
}

#[test]
fn it_decodes_json_columns() {
    let rows = MemoryRows::new(["tags", "extra", "attrs"]).with_row(vec![
        Value::from(r#"["a","b"]"#),
        Value::from(json!({"key": "key val"})),
        Value::Null,
    ]);
    let mut document = Document::default();
    rowbind::scan_one(&mut document, rows).unwrap();
    assert_eq!(document.tags.0, ["a", "b"]);
    assert_eq!(document.extra, json!({"key": "key val"}));
    assert_eq!(document.attrs, None);
}

#[test]
fn it_scans_custom_primitives() {
    let rows = MemoryRows::new(["email"])
        .with_row(vec![Value::from("alice@example.com")])
        .with_row(vec![Value::from("bob@example.com")]);
    let mut emails = Vec::<Email>::new();
    rowbind::scan_all(&mut emails, rows).unwrap();
    assert_eq!(emails[1], Email("bob@example.com".to_owned()));

    let rows = MemoryRows::new(["email"]).with_row(vec![Value::from("nobody")]);
    let mut contact = Contact::default();
    let err = rowbind::scan_one(&mut contact, rows).unwrap_err();
    match err.kind() {
        ErrorKind::Decode { column, field } => {
            assert_eq!(column, "email");
            assert_eq!(field.as_ref().map(|path| path.to_string()).as_deref(), Some("email"));
        }
        kind => panic!("unexpected error kind: {kind:?}"),
    }
    assert!(err.to_string().contains("invalid email `nobody`"));
}

#[test]
fn it_reports_type_mismatches() {
    let rows = MemoryRows::new(["foo", "bar"]).with_row(vec![Value::Int(1), Value::from("b")]);
    let mut item = Item::default();
    let err = rowbind::scan_one(&mut item, rows).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Decode { column, .. } if column == "foo"));

    let source = std::error::Error::source(&err)
        .and_then(|source| source.downcast_ref::<rowbind::Error>())
        .unwrap();
    assert_eq!(
        source.kind(),
        &ErrorKind::TypeMismatch {
            expected: "alloc::string::String",
            found: "int",
        }
    );
}

#[test]
fn it_scans_rows_one_session_at_a_time() {
    let mut scanner = RowScanner::new(foo_bar_rows(2));
    let mut items = Vec::new();
    assert!(scanner.destination().is_none());
    while scanner.advance().unwrap() {
        let mut item = Item::default();
        scanner.scan(&mut item).unwrap();
        assert_eq!(scanner.destination().unwrap().shape(), Shape::Struct);
        items.push(item);
    }
    assert!(scanner.is_closed());
    scanner.close().unwrap();
    assert_eq!(items.len(), 2);

    let mut scanner = RowScanner::new(foo_bar_rows(1));
    assert!(scanner.advance().unwrap());
    let mut item = Item::default();
    scanner.scan(&mut item).unwrap();
    let mut map = HashMap::<String, Value>::new();
    let err = scanner.scan(&mut map).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::DestinationChanged { .. }));

    scanner.close().unwrap();
    let err = scanner.scan(&mut item).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ScannerClosed);
}

#[test]
fn it_scans_the_current_row() {
    let mut rows = foo_bar_rows(2);
    assert!(rows.next_row());
    let mut item = Item::default();
    rowbind::scan_row(&mut item, &mut rows).unwrap();
    assert_eq!(item.foo, "foo val");
    assert_eq!(rows.len(), 1);
    assert!(!rows.is_closed());
}
