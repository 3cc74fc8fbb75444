//! Integration coverage for the sampling engine, resolver, and emitter
//! working together end-to-end, driven against an in-memory `FakeDriver`
//! rather than a live MySQL server.

use dbsample::driver::{FakeDriver, QueryRow};
use dbsample::emitter::{self, EmitOptions};
use dbsample::error::DumpError;
use dbsample::filter::FilterController;
use dbsample::resolver;
use dbsample::sample::{self, SampleConfig};
use dbsample::schema::{Column, Constraint, DataType, Field, Row, Schema, Table};

fn int_col(name: &str, ordinal: usize) -> Column {
    Column { name: name.to_string(), ordinal, declared_type: "int(11)".to_string(), data_type: DataType::Integer }
}

fn text_col(name: &str, ordinal: usize) -> Column {
    Column { name: name.to_string(), ordinal, declared_type: "varchar(255)".to_string(), data_type: DataType::Other("varchar".to_string()) }
}

fn query_row(pairs: &[(&str, Option<&str>)]) -> QueryRow {
    QueryRow {
        columns: pairs.iter().map(|(c, _)| c.to_string()).collect(),
        values: pairs.iter().map(|(_, v)| v.map(|s| s.to_string())).collect(),
    }
}

/// `users` (parent) <- `posts` (child via `posts.user_id -> users.id`).
fn users_posts_schema() -> Schema {
    let users = Table {
        name: "users".to_string(),
        charset: "utf8".to_string(),
        collation: "utf8_general_ci".to_string(),
        create_ddl: "CREATE TABLE `users` (`id` int, `password` varchar(255))".to_string(),
        columns: vec![int_col("id", 0), text_col("password", 1)],
        incoming_edges: vec![Constraint {
            referenced_column: "id".to_string(),
            referencing_table: "posts".to_string(),
            referencing_column: "user_id".to_string(),
        }],
        triggers: Vec::new(),
        rows: Vec::new(),
    };
    let posts = Table {
        name: "posts".to_string(),
        charset: "utf8".to_string(),
        collation: "utf8_general_ci".to_string(),
        create_ddl: "CREATE TABLE `posts` (`id` int, `user_id` int)".to_string(),
        columns: vec![int_col("id", 0), int_col("user_id", 1)],
        incoming_edges: Vec::new(),
        triggers: Vec::new(),
        rows: Vec::new(),
    };
    Schema {
        database: "blog".to_string(),
        charset: "utf8".to_string(),
        collation: "utf8_general_ci".to_string(),
        create_ddl: "CREATE DATABASE `blog` CHARACTER SET utf8".to_string(),
        tables: vec![posts, users],
        views: Vec::new(),
        routines: Vec::new(),
    }
}

// S1: referential closure is preserved across a two-table limit-2 sample.
#[test]
fn referential_closure_with_small_limit() {
    let mut schema = users_posts_schema();
    let order = resolver::resolve(&schema).unwrap();

    let users_rows: Vec<QueryRow> = (1..=5)
        .map(|i| query_row(&[("id", Some(&i.to_string())), ("password", Some("secret"))]))
        .collect();
    let posts_rows: Vec<QueryRow> = (1..=5)
        .map(|i| query_row(&[("id", Some(&i.to_string())), ("user_id", Some(&i.to_string()))]))
        .collect();

    let mut driver = FakeDriver::new().with_table("users", users_rows).with_table("posts", posts_rows);

    let config = SampleConfig { limit: 2, skip_lock_tables: true, null_parents_skip_children: true };
    let filters = FilterController::new();
    sample::sample(&mut driver, &mut schema, &order, &config, &filters).unwrap();

    let users = schema.table("users").unwrap();
    let posts = schema.table("posts").unwrap();
    assert_eq!(users.rows.len(), 2);

    let sampled_user_ids: Vec<&str> = users
        .rows
        .iter()
        .filter_map(|r| r.get("id"))
        .filter_map(|f| f.value.as_deref())
        .collect();
    for row in &posts.rows {
        let user_id = row.get("user_id").and_then(|f| f.value.as_deref()).unwrap();
        assert!(sampled_user_ids.contains(&user_id), "post references a user_id not in the sample: {user_id}");
    }
}

// S2: an empty parent table causes its dependents to be skipped with a warning.
#[test]
fn empty_parent_table_skips_dependents() {
    let mut schema = users_posts_schema();
    let order = resolver::resolve(&schema).unwrap();

    let mut driver = FakeDriver::new()
        .with_table("users", vec![])
        .with_table("posts", vec![query_row(&[("id", Some("1")), ("user_id", Some("1"))])]);

    let config = SampleConfig { limit: 10, skip_lock_tables: true, null_parents_skip_children: true };
    let filters = FilterController::new();
    let stats = sample::sample(&mut driver, &mut schema, &order, &config, &filters).unwrap();

    assert!(schema.table("posts").unwrap().rows.is_empty());
    assert!(stats.warnings.iter().any(|w| w.contains("posts")));
}

// S3: a foreign-key cycle is rejected before any query runs.
#[test]
fn circular_dependency_is_rejected() {
    let a = Table {
        name: "a".to_string(),
        charset: String::new(),
        collation: String::new(),
        create_ddl: String::new(),
        columns: vec![int_col("id", 0)],
        incoming_edges: vec![Constraint {
            referenced_column: "id".to_string(),
            referencing_table: "b".to_string(),
            referencing_column: "a_id".to_string(),
        }],
        triggers: Vec::new(),
        rows: Vec::new(),
    };
    let b = Table {
        name: "b".to_string(),
        charset: String::new(),
        collation: String::new(),
        create_ddl: String::new(),
        columns: vec![int_col("id", 0)],
        incoming_edges: vec![Constraint {
            referenced_column: "id".to_string(),
            referencing_table: "a".to_string(),
            referencing_column: "b_id".to_string(),
        }],
        triggers: Vec::new(),
        rows: Vec::new(),
    };
    let schema = Schema {
        database: "cyclic".to_string(),
        charset: "utf8".to_string(),
        collation: "utf8_general_ci".to_string(),
        create_ddl: String::new(),
        tables: vec![a, b],
        views: Vec::new(),
        routines: Vec::new(),
    };

    let err = resolver::resolve(&schema).unwrap_err();
    assert!(matches!(err, DumpError::CircularDependency { .. }));
}

// S5: a `--filter empty users.password` binding empties the targeted column only.
#[test]
fn filter_empties_only_the_targeted_column() {
    let mut schema = users_posts_schema();
    let order = resolver::resolve(&schema).unwrap();

    let mut driver = FakeDriver::new()
        .with_table("users", vec![query_row(&[("id", Some("1")), ("password", Some("hunter2"))])])
        .with_table("posts", vec![]);

    let mut filters = FilterController::new();
    filters.set_commands(&["empty users.password".to_string()]).unwrap();

    let config = SampleConfig { limit: 10, skip_lock_tables: true, null_parents_skip_children: true };
    sample::sample(&mut driver, &mut schema, &order, &config, &filters).unwrap();

    let users = schema.table("users").unwrap();
    let row = &users.rows[0];
    assert_eq!(row.get("password").unwrap().value.as_deref(), Some(""));
    assert_eq!(row.get("id").unwrap().value.as_deref(), Some("1"));
}

// S6: renaming the database rewrites the CREATE DATABASE section and is
// idempotent across repeated runs with the same target name.
#[test]
fn rename_database_is_idempotent() {
    let mut schema = users_posts_schema();
    schema.tables[1].rows.push(Row {
        fields: vec![
            Field { column: "id".to_string(), value: Some("1".to_string()) },
            Field { column: "password".to_string(), value: Some("x".to_string()) },
        ],
    });

    let opts = EmitOptions {
        create_database: true,
        add_drop_table: true,
        extended_insert: false,
        rename_database: Some("blog_sample".to_string()),
    };

    let mut first = Vec::new();
    emitter::emit(&mut first, &schema, &opts).unwrap();
    let mut second = Vec::new();
    emitter::emit(&mut second, &schema, &opts).unwrap();

    assert_eq!(first, second);
    let text = String::from_utf8(first).unwrap();
    assert!(text.contains("CREATE DATABASE `blog_sample`"));
    assert!(!text.contains("`blog`"));
}
