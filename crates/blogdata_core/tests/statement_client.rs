use blogdata_core::db::{ConnectionProvider, SharedConnection};
use blogdata_core::{
    BindingError, DataError, DataResult, Params, Post, QueryTemplate, ResultRow, SqlClient,
};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::cell::Cell;

/// Counts how often a connection is lent out.
struct CountingProvider {
    inner: SharedConnection,
    acquired: Cell<usize>,
}

impl CountingProvider {
    fn new() -> Self {
        Self {
            inner: SharedConnection::open_in_memory().unwrap(),
            acquired: Cell::new(0),
        }
    }
}

impl ConnectionProvider for CountingProvider {
    fn with_connection<T, F>(&self, work: F) -> DataResult<T>
    where
        F: FnOnce(&Connection) -> DataResult<T>,
    {
        self.acquired.set(self.acquired.get() + 1);
        self.inner.with_connection(work)
    }
}

fn seeded_client() -> SqlClient<CountingProvider> {
    let client = SqlClient::new(CountingProvider::new());
    for (id, slug) in [("1", "one"), ("2", "two"), ("3", "dup"), ("4", "dup")] {
        client
            .sql(
                "INSERT INTO post (id, title, slug, date, time_to_read, tags, version)
                 VALUES (?, ?, ?, '2024-01-01', 7, NULL, 0)",
            )
            .bind(id.to_string())
            .bind(format!("Title {id}"))
            .bind(slug.to_string())
            .update()
            .unwrap();
    }
    client
}

fn acquisitions(client: &SqlClient<CountingProvider>) -> usize {
    client.provider().acquired.get()
}

#[test]
fn named_parameter_lookup_maps_entity() {
    let client = seeded_client();

    let post: Option<Post> = client
        .sql("SELECT * FROM post WHERE id = :id")
        .param("id", "2".to_string())
        .query()
        .optional()
        .unwrap();
    let post = post.unwrap();
    assert_eq!(post.slug, "two");
    assert_eq!(post.version, Some(0));
}

#[test]
fn repeated_named_parameter_binds_one_value() {
    let client = seeded_client();

    let posts: Vec<Post> = client
        .sql("SELECT * FROM post WHERE slug = :slug OR title = :slug")
        .param("slug", "one".to_string())
        .query()
        .list()
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "1");
}

#[test]
fn positional_list_preserves_all_rows() {
    let client = seeded_client();

    let posts: Vec<Post> = client
        .sql("SELECT * FROM post WHERE slug = ? ORDER BY id")
        .bind("dup".to_string())
        .query()
        .list()
        .unwrap();
    let ids = posts.iter().map(|post| post.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["3", "4"]);
}

#[test]
fn optional_with_many_rows_is_cardinality_error() {
    let client = seeded_client();

    let err = client
        .sql("SELECT * FROM post WHERE slug = :slug")
        .param("slug", "dup".to_string())
        .query::<Post>()
        .optional()
        .unwrap_err();
    assert!(matches!(err, DataError::Cardinality { actual: 2 }));
}

#[test]
fn single_requires_exactly_one_row() {
    let client = seeded_client();

    let post: Post = client
        .sql("SELECT * FROM post WHERE slug = :slug")
        .param("slug", "one".to_string())
        .query()
        .single()
        .unwrap();
    assert_eq!(post.id, "1");

    let none = client
        .sql("SELECT * FROM post WHERE slug = :slug")
        .param("slug", "absent".to_string())
        .query::<Post>()
        .single()
        .unwrap_err();
    assert!(matches!(none, DataError::NoRows));

    let many = client
        .sql("SELECT * FROM post WHERE slug = ?")
        .bind("dup".to_string())
        .query::<Post>()
        .single()
        .unwrap_err();
    assert!(matches!(many, DataError::Cardinality { actual: 2 }));
}

#[test]
fn update_with_zero_rows_is_not_an_error() {
    let client = seeded_client();

    let changed = client
        .sql("DELETE FROM post WHERE id = :id")
        .param("id", "missing".to_string())
        .update()
        .unwrap();
    assert_eq!(changed, 0);
}

#[test]
fn too_few_positional_values_fail_without_connection() {
    let client = seeded_client();
    let before = acquisitions(&client);

    let err = client
        .sql("UPDATE post SET title = ?, slug = ? WHERE id = ?")
        .bind("t".to_string())
        .bind("s".to_string())
        .update()
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::Binding(BindingError::PositionalCount {
            expected: 3,
            actual: 2
        })
    ));
    assert_eq!(acquisitions(&client), before);
}

#[test]
fn mixed_parameter_kinds_fail_without_connection() {
    let client = seeded_client();
    let before = acquisitions(&client);

    let err = client
        .sql("SELECT * FROM post WHERE id = :id")
        .bind("1".to_string())
        .param("id", "1".to_string())
        .query::<Post>()
        .list()
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::Binding(BindingError::MixedParameters)
    ));
    assert_eq!(acquisitions(&client), before);
}

#[test]
fn sqlite_prefixed_placeholders_fail_without_connection() {
    let client = seeded_client();
    let before = acquisitions(&client);

    let err = client
        .query::<Post>("SELECT * FROM post WHERE id = $id", Params::None)
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::Binding(BindingError::PrefixedPlaceholder(ref token)) if token == "$id"
    ));

    let err = client
        .query::<Post>(
            "SELECT * FROM post WHERE id = @id",
            Params::named([("id", "1".to_string())]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::Binding(BindingError::PrefixedPlaceholder(_))
    ));
    assert_eq!(acquisitions(&client), before);
}

#[test]
fn binding_problems_are_caught_by_prepare() {
    let client = seeded_client();

    let missing = client
        .sql("SELECT * FROM post WHERE id = :id AND slug = :slug")
        .param("id", "1".to_string())
        .prepare()
        .unwrap_err();
    assert_eq!(missing, BindingError::MissingNamed("slug".to_string()));

    let unused = client
        .sql("SELECT * FROM post WHERE id = :id")
        .param("id", "1".to_string())
        .param("slug", "one".to_string())
        .prepare()
        .unwrap_err();
    assert_eq!(unused, BindingError::UnusedNamed("slug".to_string()));

    let duplicate = client
        .sql("SELECT * FROM post WHERE id = :id")
        .param("id", "1".to_string())
        .param("id", "2".to_string())
        .prepare()
        .unwrap_err();
    assert_eq!(duplicate, BindingError::DuplicateNamed("id".to_string()));

    let mixed = client
        .sql("SELECT * FROM post WHERE id = ? AND slug = :slug")
        .bind("1".to_string())
        .prepare()
        .unwrap_err();
    assert_eq!(mixed, BindingError::MixedPlaceholders);
}

#[test]
fn prepare_rewrites_named_placeholders_in_order() {
    let client = seeded_client();

    let statement = client
        .sql("SELECT * FROM post WHERE slug = :slug AND id <> :id AND title <> ':id'")
        .param_map([("id", "9".to_string()), ("slug", "one".to_string())])
        .prepare()
        .unwrap();
    assert_eq!(
        statement.sql(),
        "SELECT * FROM post WHERE slug = ?1 AND id <> ?2 AND title <> ':id'"
    );
    assert_eq!(
        statement.values(),
        &[Value::Text("one".to_string()), Value::Text("9".to_string())]
    );
}

#[test]
fn raw_rows_expose_columns() {
    let client = seeded_client();

    let rows: Vec<ResultRow> = client
        .sql("SELECT COUNT(*) AS total FROM post")
        .query_rows()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].int("total").unwrap(), 4);
}

#[test]
fn direct_query_accepts_params_value() {
    let client = seeded_client();

    let post: Option<Post> = client
        .query_one(
            "SELECT * FROM post WHERE id = :id",
            Params::named([("id", "3".to_string())]),
        )
        .unwrap();
    assert_eq!(post.unwrap().slug, "dup");

    let err = client
        .query::<Post>("SELECT * FROM post WHERE id = :id", Params::positional(["3".to_string()]))
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::Binding(BindingError::ModeMismatch { .. })
    ));
}

#[test]
fn template_maps_rows_with_closure() {
    let client = seeded_client();
    let template = QueryTemplate::new(client.provider());

    let slugs = template
        .query(
            "SELECT slug FROM post WHERE time_to_read = ? ORDER BY id",
            &[Value::Integer(7)],
            |row| row.text("slug"),
        )
        .unwrap();
    assert_eq!(slugs, vec!["one", "two", "dup", "dup"]);

    let before = acquisitions(&client);
    let err = template
        .update("DELETE FROM post WHERE id = ? AND slug = ?", &[Value::Integer(1)])
        .unwrap_err();
    assert!(matches!(err, DataError::Binding(_)));
    assert_eq!(acquisitions(&client), before);

    let err = template
        .query_for_optional(
            "SELECT * FROM post WHERE slug = ?",
            &[Value::Text("dup".to_string())],
            |row| row.text("id"),
        )
        .unwrap_err();
    assert!(matches!(err, DataError::Cardinality { actual: 2 }));
}
