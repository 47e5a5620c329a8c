//! The same statement across dialects, plus the documented rendering laws.

use sqlweave::{
    BuildConfig, Dialect, Expr, MySql, Postgres, SqlStmt, Sqlite, Value, dialect_by_name, select,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[test]
fn dialects_differ_only_in_quoting_and_markers() {
    let q = select("users")
        .select_cols(&["id", "name"])
        .eq("status", "active")
        .in_list("role", ["admin", "owner"])
        .order_by_asc("id")
        .limit(5);

    let pg = q.build(&Postgres).unwrap();
    let my = q.build(&MySql).unwrap();
    let lite = q.build(&Sqlite).unwrap();

    assert_eq!(
        pg.sql,
        r#"SELECT "id", "name" FROM "users" WHERE "status" = $1 AND "role" IN ($2, $3) ORDER BY "id" ASC LIMIT 5"#
    );
    assert_eq!(
        my.sql,
        "SELECT `id`, `name` FROM `users` WHERE `status` = ? AND `role` IN (?, ?) ORDER BY `id` ASC LIMIT 5"
    );
    assert_eq!(
        lite.sql,
        r#"SELECT "id", "name" FROM "users" WHERE "status" = ? AND "role" IN (?, ?) ORDER BY "id" ASC LIMIT 5"#
    );
    assert_eq!(pg.args, my.args);
    assert_eq!(my.args, lite.args);
    assert_eq!(my.sql.replace('`', "\""), lite.sql);
}

#[test]
fn having_example() {
    let q = select("messages")
        .select_cols(&["user_id", "COUNT(*) AS cnt"])
        .group_by(&["user_id"])
        .having(Expr::gt("COUNT(*)", 100i32));

    let pg = q.build(&Postgres).unwrap();
    assert!(pg.sql.ends_with("HAVING COUNT(*) > $1"));
    assert_eq!(pg.args, vec![Value::Int(100)]);

    let lite = q.build(&Sqlite).unwrap();
    assert!(lite.sql.ends_with("HAVING COUNT(*) > ?"));
    assert_eq!(lite.args, vec![Value::Int(100)]);
}

#[test]
fn cte_values_precede_main_query() {
    let totals = select("orders")
        .select_cols(&["user_id", "SUM(amount) AS total"])
        .gt("amount", 100i32)
        .group_by(&["user_id"]);
    let built = select("orders_totals")
        .with("orders_totals", totals)
        .unwrap()
        .gt("total", 1000i32)
        .build(&Postgres)
        .unwrap();

    assert_eq!(built.args, vec![Value::Int(100), Value::Int(1000)]);
    let first = built.sql.find("$1").unwrap();
    let second = built.sql.find("$2").unwrap();
    assert!(first < built.sql.find(") SELECT").unwrap());
    assert!(second > first);
}

#[test]
fn in_list_degenerate_forms() {
    let empty = select("t").in_list("col", Vec::<i64>::new());
    assert_eq!(
        empty.to_sql(&Postgres).unwrap(),
        r#"SELECT * FROM "t" WHERE 0=1"#
    );

    let single = select("t").in_list("col", [7i64]).build(&Postgres).unwrap();
    assert_eq!(single.sql, r#"SELECT * FROM "t" WHERE "col" = $1"#);
    assert_eq!(single.args, vec![Value::Int(7)]);

    let null = select("t").in_list("col", [Value::Null]).build(&Postgres).unwrap();
    assert_eq!(null.sql, r#"SELECT * FROM "t" WHERE "col" IS NULL"#);
    assert!(null.args.is_empty());
}

#[test]
fn or_nesting_law() {
    let sql = select("t")
        .where_("a")
        .and_where("b")
        .or_where("c")
        .or_where("d")
        .to_sql(&Postgres)
        .unwrap();
    assert_eq!(sql, r#"SELECT * FROM "t" WHERE ((a AND b) OR (c)) OR (d)"#);
}

#[test]
fn function_fallbacks_per_dialect() {
    let q = select("t")
        .select_expr(Expr::greatest(["a", "b"].map(sqlweave::Term::col)), "g")
        .select_expr(Expr::concat(["first", "last"].map(sqlweave::Term::col)), "c");

    assert_eq!(
        q.to_sql(&Postgres).unwrap(),
        r#"SELECT GREATEST("a", "b") AS "g", "first" || "last" AS "c" FROM "t""#
    );
    assert_eq!(
        q.to_sql(&MySql).unwrap(),
        "SELECT GREATEST(`a`, `b`) AS `g`, CONCAT(`first`, `last`) AS `c` FROM `t`"
    );
    assert_eq!(
        q.to_sql(&Sqlite).unwrap(),
        r#"SELECT MAX("a", "b") AS "g", "first" || "last" AS "c" FROM "t""#
    );
}

#[test]
fn dialect_lookup_by_name() {
    for (name, expected) in [
        ("postgres", "postgres"),
        ("PG", "postgres"),
        ("mariadb", "mysql"),
        ("sqlite3", "sqlite"),
    ] {
        let dialect: &dyn Dialect = dialect_by_name(name).unwrap();
        assert_eq!(dialect.name(), expected);
    }
    assert!(dialect_by_name("oracle").is_none());
}

#[test]
fn build_with_config_uses_named_dialect() {
    init_tracing();
    let config = BuildConfig::new("mysql").max_logged_sql_len(16);
    let built = select("users").eq("id", 1i64).build_with_config(&config).unwrap();
    assert_eq!(built.sql, "SELECT * FROM `users` WHERE `id` = ?");

    let err = select("users")
        .build_with_config(&BuildConfig::new("oracle"))
        .unwrap_err();
    assert!(err.to_string().contains("oracle"));
}
