mod common;

use common::*;
use reltree::*;

#[test]
fn lists_every_type_with_relationships_and_fields() {
    let types = discover(&shop_store(1), &Config::default());
    let names: Vec<_> = types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Order", "Post", "Profile", "User"]);

    let user = &types[3];
    let rels: Vec<_> = user.relationships.iter().map(|r| (r.name.as_str(), r.macro_kind)).collect();
    assert_eq!(rels, [("orders", Macro::HasMany), ("posts", Macro::HasMany), ("profile", Macro::HasOne)]);
    assert_eq!(user.fields, ["id", "name", "email", "deleted"]);

    let order = &types[0];
    assert_eq!(order.relationships[0].foreign_key, "user_id");
    assert_eq!(order.fields, ["id", "user_id", "total", "paid"]);
}

#[test]
fn excluded_types_are_left_out() {
    let config = Config::from_toml_str(r#"excluded_types = ["Post", "Profile", "Nothing"]"#).unwrap();
    assert_eq!(config.excluded_types, ["Post", "Profile", "Nothing"]);

    let names: Vec<_> = discover(&shop_store(1), &config).into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["Order", "User"]);
}

#[test]
fn empty_store_lists_nothing() {
    assert!(discover(&MemoryStore::new("empty"), &Config::default()).is_empty());
}
