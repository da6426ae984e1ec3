//! Composable, immutable SQL statement builder for PostgreSQL.
//!
//! Builders are plain values: every chained call returns an extended copy
//! and leaves the previous one untouched, so prefixes can be cloned,
//! shared across threads and compiled independently. `compile()` produces
//! a [`Statement`] — SQL text with `$1…$n` placeholders plus the matching
//! ordered parameter list — which any driver behind the [`Driver`] trait
//! can execute.

mod binder;
pub mod error;
pub mod expr;
pub mod query;
pub mod schema;
pub mod table;
pub mod traits;
pub mod value;

pub use error::{Error, Result};
pub use expr::{and, col, cond, jsonb, not, or, Col, Expr, JsonChain, JsonCond, LogicKind, Op};
pub use query::{ConflictAction, InsertQuery, JoinKind, Row, SelectQuery, SortOrder, Statement};
pub use schema::Schema;
pub use table::{ColumnRef, TableRef};
pub use traits::Driver;
pub use value::Value;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn select(table: &str) -> SelectQuery {
        SelectQuery::from_table(table).unwrap()
    }

    /// Counts occurrences of `$k` not followed by another digit.
    fn count_placeholder(sql: &str, k: usize) -> usize {
        let needle = format!("${k}");
        let bytes = sql.as_bytes();
        let mut count = 0;
        let mut start = 0;
        while let Some(pos) = sql[start..].find(&needle) {
            let end = start + pos + needle.len();
            if !bytes.get(end).is_some_and(|b| b.is_ascii_digit()) {
                count += 1;
            }
            start = start + pos + 1;
        }
        count
    }

    #[test]
    fn test_select_all_from_aliased_table() {
        let stmt = select("users as u").compile().unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM users AS u");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_empty_projection_equals_select_all() {
        let explicit = select("users").select_all().compile().unwrap();
        let empty = select("users")
            .select(Vec::<&str>::new())
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(explicit, empty);
    }

    #[test]
    fn test_projection_replaces_not_appends() {
        let stmt = select("users")
            .select(["id"])
            .unwrap()
            .select(["name", "email"])
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT name, email FROM users");
    }

    #[test]
    fn test_inner_join_rendering() {
        let stmt = select("users as u")
            .inner_join("posts as p", "u.id", "p.user_id")
            .unwrap()
            .select(["u.name", "p.title"])
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT u.name, p.title FROM users AS u \
             INNER JOIN posts AS p ON u.id = p.user_id"
        );
    }

    #[test]
    fn test_join_kinds_in_append_order() {
        let stmt = select("a")
            .left_join("b", "a.id", "b.a_id")
            .unwrap()
            .full_join("c", "a.id", "c.a_id")
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM a LEFT JOIN b ON a.id = b.a_id FULL JOIN c ON a.id = c.a_id"
        );
    }

    #[test]
    fn test_single_condition_renders_bare() {
        let stmt = select("users")
            .filter(col("active").eq(true))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM users WHERE active = $1");
        assert_eq!(stmt.params, vec![Value::Bool(true)]);
    }

    #[test]
    fn test_and_group_parenthesized() {
        let stmt = select("users")
            .filter(and(vec![col("active").eq(true), col("id").gt(5)]))
            .compile()
            .unwrap();
        assert!(stmt.sql.contains("(active = $1 AND id > $2)"));
        assert_eq!(stmt.params, vec![Value::Bool(true), Value::Integer(5)]);
    }

    #[test]
    fn test_nested_groups() {
        let stmt = select("t")
            .filter(and(vec![
                or(vec![col("a").eq(1), col("b").eq(2)]),
                col("c").eq(3),
            ]))
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM t WHERE ((a = $1 OR b = $2) AND c = $3)"
        );
    }

    #[test]
    fn test_not_wraps_child() {
        let stmt = select("t")
            .filter(not(col("active").eq(true)))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE NOT (active = $1)");
    }

    #[test]
    fn test_repeated_filters_fold_in_call_order() {
        let stmt = select("t")
            .filter(cond("active", "=", true).unwrap())
            .filter(Expr::raw("x = ?", [1]).unwrap())
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE (active = $1 AND x = $2)");
        assert_eq!(stmt.params, vec![Value::Bool(true), Value::Integer(1)]);
    }

    #[test]
    fn test_placeholders_unique_and_sequential() {
        let stmt = select("t")
            .filter(and(vec![
                col("a").eq(1),
                or(vec![col("b").lt(2), col("c").gte(3)]),
                not(col("d").ne(4)),
                jsonb("e").field("k").eq("v"),
            ]))
            .compile()
            .unwrap();
        // Four comparison leaves plus one accessor key and one terminal
        // value for the JSON chain.
        assert_eq!(stmt.params.len(), 6);
        for k in 1..=6 {
            assert_eq!(count_placeholder(&stmt.sql, k), 1, "placeholder ${k}");
        }
        assert_eq!(count_placeholder(&stmt.sql, 7), 0);
    }

    #[test]
    fn test_empty_in_list_passes_through() {
        let stmt = select("t")
            .filter(cond("id", "in", Vec::<i64>::new()).unwrap())
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE id IN ()");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_in_list_one_placeholder_per_element() {
        let stmt = select("t")
            .filter(col("id").in_([10, 20, 30]))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE id IN ($1, $2, $3)");
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn test_null_checks_consume_no_placeholder() {
        let stmt = select("t")
            .filter(and(vec![
                col("deleted_at").null(),
                col("email").not_null(),
                col("id").gt(0),
            ]))
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM t WHERE (deleted_at IS NULL AND email IS NOT NULL AND id > $1)"
        );
        assert_eq!(stmt.params, vec![Value::Integer(0)]);
    }

    #[test]
    fn test_operator_from_text() {
        let stmt = select("t")
            .filter(cond("name", "not like", "%bot%").unwrap())
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE name NOT LIKE $1");

        assert!(matches!(
            cond("name", "resembles", 1),
            Err(Error::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_json_field_chain_equality() {
        let stmt = select("users")
            .filter(jsonb("settings").field("notifications").field("email").eq(true))
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM users WHERE settings -> $1 ->> $2 = $3"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::Text("notifications".into()),
                Value::Text("email".into()),
                Value::Bool(true),
            ]
        );
    }

    #[test]
    fn test_json_path_exists_and_is_null() {
        let stmt = select("t")
            .filter(jsonb("attrs").path(["a", "b"]).exists())
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE attrs #> $1 IS NOT NULL");
        assert_eq!(
            stmt.params,
            vec![Value::Array(vec![
                Value::Text("a".into()),
                Value::Text("b".into())
            ])]
        );

        let stmt = select("t")
            .filter(jsonb("attrs").field("a").is_null())
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE attrs -> $1 IS NULL");
    }

    #[test]
    fn test_json_as_text_forces_text_operator() {
        let stmt = select("t")
            .filter(jsonb("attrs").field("a").as_text().exists())
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE attrs ->> $1 IS NOT NULL");
    }

    #[test]
    fn test_json_key_operators_bypass_accessors() {
        let stmt = select("t")
            .filter(jsonb("settings").field("ignored").has_key("theme"))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE settings ? $1");
        assert_eq!(stmt.params, vec![Value::Text("theme".into())]);

        let stmt = select("t")
            .filter(jsonb("settings").has_any_key(["a", "b"]))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE settings ?| $1");

        let stmt = select("t")
            .filter(jsonb("settings").has_all_keys(["a", "b"]))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE settings ?& $1");
    }

    #[test]
    fn test_json_containment_single_placeholder() {
        let stmt = select("t")
            .filter(jsonb("tags").contains(json!(["rust", "sql"])))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE tags @> $1");
        assert_eq!(stmt.params, vec![Value::Json(json!(["rust", "sql"]))]);

        let stmt = select("t")
            .filter(jsonb("tags").contained_by(json!({"a": 1})))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE tags <@ $1");
    }

    #[test]
    fn test_json_interleaves_with_boolean_tree() {
        let stmt = select("t")
            .filter(and(vec![
                col("active").eq(true),
                jsonb("settings").field("lang").eq("en"),
                col("id").gt(7),
            ]))
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM t WHERE (active = $1 AND settings ->> $2 = $3 AND id > $4)"
        );
        assert_eq!(stmt.params.len(), 4);
    }

    #[test]
    fn test_order_limit_offset_clause_order() {
        let stmt = select("users")
            .order_by("created_at", SortOrder::Desc)
            .unwrap()
            .order_by("id", SortOrder::Asc)
            .unwrap()
            .limit(10)
            .offset(20)
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM users ORDER BY created_at DESC, id ASC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_page_sets_limit_and_offset() {
        let stmt = select("users").page(3, 25).compile().unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM users LIMIT 25 OFFSET 50");
    }

    #[test]
    fn test_column_alias_keeps_lowercase_as() {
        let stmt = select("users as u")
            .select(["u.id as user_id"])
            .unwrap()
            .compile()
            .unwrap();
        // Table aliases render uppercase AS; column aliases keep the
        // caller's lowercase `as`.
        assert_eq!(stmt.sql, "SELECT u.id as user_id FROM users AS u");
    }

    #[test]
    fn test_reserved_identifiers_quoted() {
        let stmt = select("t")
            .filter(col("weird-name").eq(1))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE \"weird-name\" = $1");
    }

    #[test]
    fn test_cloned_prefix_stays_independent() {
        let base = select("users").filter(col("active").eq(true));
        let page = base.clone().limit(10);

        let base_stmt = base.compile().unwrap();
        let page_stmt = page.compile().unwrap();
        assert_eq!(base_stmt.sql, "SELECT * FROM users WHERE active = $1");
        assert_eq!(page_stmt.sql, "SELECT * FROM users WHERE active = $1 LIMIT 10");
        // Re-render drifts nothing.
        assert_eq!(base.compile().unwrap(), base_stmt);
    }

    #[test]
    fn test_insert_single_row() {
        let stmt = InsertQuery::into_table("users")
            .unwrap()
            .row(Row::new().set("name", "alice").set("active", true))
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "INSERT INTO users (name, active) VALUES ($1, $2)");
        assert_eq!(
            stmt.params,
            vec![Value::Text("alice".into()), Value::Bool(true)]
        );
    }

    #[test]
    fn test_insert_rows_flatten_row_major() {
        let stmt = InsertQuery::into_table("users")
            .unwrap()
            .rows([
                Row::new().set("name", "alice").set("age", 30),
                Row::new().set("age", 41).set("name", "bob"),
            ])
            .compile()
            .unwrap();
        // The second row reorders to the first row's column order.
        assert_eq!(
            stmt.sql,
            "INSERT INTO users (name, age) VALUES ($1, $2), ($3, $4)"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::Text("alice".into()),
                Value::Integer(30),
                Value::Text("bob".into()),
                Value::Integer(41),
            ]
        );
    }

    #[test]
    fn test_insert_conflict_update_binds_after_rows() {
        let stmt = InsertQuery::into_table("users")
            .unwrap()
            .row(Row::new().set("id", 1).set("name", "alice"))
            .on_conflict(["id"], ConflictAction::do_update([("name", "renamed")]))
            .returning(["id"])
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO users (id, name) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET name = $3 RETURNING id"
        );
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn test_insert_conflict_do_nothing_bare_form() {
        let stmt = InsertQuery::into_table("users")
            .unwrap()
            .row(Row::new().set("id", 1))
            .on_conflict(Vec::<String>::new(), ConflictAction::DoNothing)
            .compile()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO users (id) VALUES ($1) ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn test_insert_returning_all() {
        let stmt = InsertQuery::into_table("users")
            .unwrap()
            .row(Row::new().set("id", 1))
            .returning_all()
            .compile()
            .unwrap();
        assert_eq!(stmt.sql, "INSERT INTO users (id) VALUES ($1) RETURNING *");
    }

    #[test]
    fn test_insert_row_shape_mismatch() {
        let query = InsertQuery::into_table("users").unwrap().rows([
            Row::new().set("id", 1).set("name", "a"),
            Row::new().set("id", 2),
        ]);
        assert!(matches!(query.compile(), Err(Error::RowShape { row: 2 })));
    }

    #[test]
    fn test_insert_without_rows() {
        let query = InsertQuery::into_table("users").unwrap();
        assert!(matches!(query.compile(), Err(Error::EmptyInsert)));
    }

    fn catalog() -> Arc<Schema> {
        Arc::new(
            Schema::new()
                .table("users", ["id", "name", "active"])
                .table("posts", ["id", "user_id", "title"]),
        )
    }

    #[test]
    fn test_schema_accepts_valid_query() {
        let stmt = select("users as u")
            .with_schema(catalog())
            .inner_join("posts as p", "u.id", "p.user_id")
            .unwrap()
            .select(["u.name", "p.title"])
            .unwrap()
            .filter(col("u.active").eq(true))
            .compile()
            .unwrap();
        assert!(stmt.sql.starts_with("SELECT u.name, p.title"));
    }

    #[test]
    fn test_schema_rejects_unknown_column_before_render() {
        let query = select("users")
            .with_schema(catalog())
            .filter(col("missing").eq(1));
        assert!(matches!(
            query.compile(),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_schema_rejects_unknown_table() {
        let query = select("ghosts").with_schema(catalog());
        assert!(matches!(query.compile(), Err(Error::UnknownTable(_))));
    }

    #[test]
    fn test_schema_enforces_alias_exclusivity() {
        let query = select("users as u")
            .with_schema(catalog())
            .filter(col("users.active").eq(true));
        assert!(matches!(
            query.compile(),
            Err(Error::AliasConflict { .. })
        ));
    }

    #[test]
    fn test_schema_checks_insert_columns() {
        let query = InsertQuery::into_table("users")
            .unwrap()
            .with_schema(catalog())
            .row(Row::new().set("nope", 1));
        assert!(matches!(
            query.compile(),
            Err(Error::UnknownColumn { .. })
        ));
    }

    struct Recorder {
        sql: Option<String>,
        params: Vec<Value>,
    }

    impl Driver for Recorder {
        type Row = ();

        fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<()>> {
            self.sql = Some(sql.to_string());
            self.params = params.to_vec();
            Ok(vec![(), ()])
        }
    }

    #[test]
    fn test_execute_hands_compiled_statement_to_driver() {
        let mut driver = Recorder {
            sql: None,
            params: vec![],
        };
        let rows = select("users")
            .filter(col("id").eq(7))
            .execute(&mut driver)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            driver.sql.as_deref(),
            Some("SELECT * FROM users WHERE id = $1")
        );
        assert_eq!(driver.params, vec![Value::Integer(7)]);
    }
}
