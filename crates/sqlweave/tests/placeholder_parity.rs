//! Marker/argument parity and ordering through every kind of nesting.

use sqlweave::placeholder::count_markers;
use sqlweave::{
    Dialect, Expr, MySql, Postgres, SelectStmt, SqlError, SqlStmt, Sqlite, Term, Value,
    batch_update, delete, select, update,
};

const DIALECTS: [&dyn Dialect; 3] = [&Postgres, &MySql, &Sqlite];

fn assert_parity(stmt: &impl SqlStmt) -> Vec<Value> {
    let mut first_args = None;
    for dialect in DIALECTS {
        let (neutral, args) = stmt.render(dialect).unwrap();
        assert_eq!(
            count_markers(&neutral),
            args.len(),
            "neutral render for {} lost parity: {neutral}",
            dialect.name()
        );

        let built = stmt.build(dialect).unwrap();
        assert_eq!(built.placeholder_count(dialect), built.args.len());
        assert_eq!(built.args, args);

        match &first_args {
            None => first_args = Some(args),
            Some(prev) => assert_eq!(prev, &args, "args differ across dialects"),
        }
    }
    first_args.unwrap_or_default()
}

fn nested(depth: i64) -> SelectStmt {
    let mut q = select("t0").select("id").eq("level", 0i64);
    for d in 1..=depth {
        q = select(&format!("t{d}"))
            .select("id")
            .eq("level", d)
            .where_(Expr::in_subquery("id", q));
    }
    q
}

#[test]
fn plain_select() {
    let args = assert_parity(
        &select("users")
            .eq("a", 1i64)
            .in_list("b", [2i64, 3])
            .between("c", 4i64, 5i64)
            .like("d", "x%"),
    );
    assert_eq!(args.len(), 6);
}

#[test]
fn deep_subqueries_bind_in_text_order() {
    let q = nested(4);
    let args = assert_parity(&q);
    // The outermost level is written first, so its value binds first.
    assert_eq!(
        args,
        vec![
            Value::Int(4),
            Value::Int(3),
            Value::Int(2),
            Value::Int(1),
            Value::Int(0)
        ]
    );

    let built = q.build(&Postgres).unwrap();
    assert!(built.sql.starts_with(
        r#"SELECT "id" FROM "t4" WHERE "level" = $1 AND "id" IN (SELECT "id" FROM "t3" WHERE "level" = $2"#
    ));
    assert!(built.sql.ends_with(r#"WHERE "level" = $5))))"#));
}

#[test]
fn subqueries_in_every_position() {
    let q = select("users u")
        .with("active", select("sessions").eq("live", true))
        .unwrap()
        .select_expr(
            Expr::coalesce([Term::col("nick"), Term::val("anon")]),
            "display",
        )
        .select_expr(
            select("orders").select("COUNT(*)").eq("paid", true),
            "paid_orders",
        )
        .join_subquery(
            sqlweave::stmt::JoinKind::Left,
            select("profiles").eq("visible", true),
            "p",
            "p.user_id = u.id",
        )
        .unwrap()
        .where_(Expr::exists(select("active").gt("age", 18i32)))
        .or_where(Expr::not(Expr::in_subquery(
            "u.id",
            select("bans").select("user_id").lt("until", 10i64),
        )))
        .group_by(&["u.id"])
        .having(Expr::gt("COUNT(*)", 2i32))
        .union(select("archived_users").eq("year", 2020i32));

    let args = assert_parity(&q);
    assert_eq!(
        args,
        vec![
            Value::Bool(true),
            Value::Text("anon".into()),
            Value::Bool(true),
            Value::Bool(true),
            Value::Int(18),
            Value::Int(10),
            Value::Int(2),
            Value::Int(2020),
        ]
    );
}

#[test]
fn recursive_cte_and_union_chain() {
    let anchor = select("nodes").select_cols(&["id", "parent"]).eq("id", 1i64);
    let step = select("nodes n")
        .select_cols(&["n.id", "n.parent"])
        .inner_join("tree t", "n.parent = t.id")
        .lt("n.depth", 10i32);
    let q = select("tree")
        .with_recursive("tree", anchor.union_all(step))
        .unwrap()
        .ne("id", 7i64)
        .union(select("extra").eq("id", 9i64));

    let args = assert_parity(&q);
    assert_eq!(
        args,
        vec![Value::Int(1), Value::Int(10), Value::Int(7), Value::Int(9)]
    );
}

#[test]
fn update_delete_and_batch_keep_parity() {
    assert_parity(
        &update("accounts")
            .with("vip", select("users").eq("tier", "gold"))
            .unwrap()
            .set("a", 1i32)
            .set_template("b", "b + ?", vec![Value::Int(2)])
            .set_expr(
                "c",
                Expr::from(Expr::case().when(Expr::gt("x", 3i32), Term::val(4i32))),
            )
            .where_(Expr::in_subquery("id", select("vip").select("id")))
            .or_where(Expr::eq("d", 5i32)),
    );

    assert_parity(&delete("logs").lt("at", 100i64).not_in("kind", ["a", "b"]));

    let args = assert_parity(
        &batch_update("users", "id")
            .row(1i64, [("name", Value::from("a")), ("age", Value::Int(30))])
            .unwrap()
            .row(2i64, [("name", Value::from("b"))])
            .unwrap(),
    );
    // age: (1, 30); name: (1, "a"), (2, "b"); then the IN list.
    assert_eq!(args.len(), 2 + 4 + 2);
}

#[test]
fn rendering_is_deterministic() {
    let q = select("t")
        .where_json(serde_json::json!({"z": 1, "a": null, "m": "x"}))
        .unwrap()
        .or_where(Expr::like_any("name", ["a", "b"]));
    let first = q.build(&Postgres).unwrap();
    let second = q.build(&Postgres).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.sql,
        r#"SELECT * FROM "t" WHERE ("a" IS NULL AND "m" = $1 AND "z" = $2) OR (("name" LIKE $3) OR ("name" LIKE $4))"#
    );
}

#[test]
fn stray_marker_in_raw_sql_is_rejected() {
    let err = select("docs")
        .where_raw("data ? 'key'", vec![])
        .build(&Postgres)
        .unwrap_err();
    assert!(matches!(
        err,
        SqlError::PlaceholderMismatch {
            markers: 1,
            args: 0
        }
    ));
}
