//! Snapshot tests using insta
//!
//! Whole scripts rendered and translated end to end.

use insta::assert_snapshot;
use sqlport::{render, split_statements, translate, TranslateOptions};

/// Translate a script and snapshot the result, errors included
fn translated(target: &str, input: &str, options: &TranslateOptions) -> String {
    match translate(input, target, options) {
        Ok(sql) => sql,
        Err(e) => format!("ERROR: {}", e),
    }
}

fn session(temp_schema: Option<&str>) -> TranslateOptions {
    TranslateOptions {
        session_id: Some("abcd1234".to_string()),
        temp_schema: temp_schema.map(str::to_string),
        ..Default::default()
    }
}

const TEMP_TABLE_SCRIPT: &str = "IF OBJECT_ID('#people', 'U') IS NOT NULL DROP TABLE #people;
CREATE TABLE #people (id INT, name VARCHAR(255));
SELECT TOP 5 ISNULL(name, 'n/a') FROM #people;";

// =============================================================================
// Translation Snapshots
// =============================================================================

#[test]
fn snapshot_postgresql_temp_table_script() {
    assert_snapshot!(translated("postgresql", TEMP_TABLE_SCRIPT, &session(None)), @r"
    DROP TABLE IF EXISTS people;
    CREATE TEMP TABLE people (id INT, name VARCHAR(255));
    SELECT COALESCE(name, 'n/a') FROM people LIMIT 5;
    ");
}

#[test]
fn snapshot_oracle_emulated_temp_tables() {
    let input = "CREATE TABLE #people (id INT);
SELECT TOP 5 ISNULL(name, 'n/a'), GETDATE() FROM #people;";
    assert_snapshot!(translated("oracle", input, &session(Some("scratch"))), @r"
    CREATE TABLE scratch.abcd1234people (id INT);
    SELECT COALESCE(name, 'n/a'), SYSDATE FROM scratch.abcd1234people FETCH FIRST 5 ROWS ONLY;
    ");
}

#[test]
fn snapshot_bigquery_cte_and_order_by() {
    let input = "WITH totals (person_id, n) AS (SELECT person_id, COUNT(*) FROM visits GROUP BY person_id)
SELECT n * 2, ISNULL(person_id, 0) FROM totals ORDER BY n * 2 DESC;";
    assert_snapshot!(translated("bigquery", input, &session(None)), @r"
    with totals as (select person_id as person_id, count(*) as n from visits group by person_id)
    select n * 2, IFNULL(person_id, 0) from totals order by 1 desc;
    ");
}

#[test]
fn snapshot_unknown_dialect() {
    assert_snapshot!(
        translated("klingon", "SELECT 1;", &session(None)),
        @"ERROR: Don't know how to translate from sql server to klingon. Valid target dialects are bigquery, oracle, postgresql, redshift, snowflake, spark, sql server, sqlite"
    );
}

// =============================================================================
// Render Snapshots
// =============================================================================

#[test]
fn snapshot_render_then_translate() {
    let template = "{DEFAULT @schema = cdm}
{DEFAULT @limit = 0}
SELECT {@limit != 0}?{TOP @limit }person_id
FROM @schema.person;";
    let rendered = render(template, &["limit"], &["20"]).unwrap();
    assert_snapshot!(rendered, @r"
    SELECT TOP 20 person_id
    FROM cdm.person;
    ");
    assert_snapshot!(translated("postgresql", &rendered, &session(None)), @r"
    SELECT person_id
    FROM cdm.person LIMIT 20;
    ");
}

// =============================================================================
// Split Snapshots
// =============================================================================

#[test]
fn snapshot_split_script() {
    let script = "CREATE TABLE t (id INT);
BEGIN
  INSERT INTO t VALUES (1);
  SELECT CASE WHEN id = 1 THEN 'a;b' END FROM t;
END;
DROP TABLE t";
    assert_snapshot!(split_statements(script).join("\n--\n"), @r"
    CREATE TABLE t (id INT)
    --
    BEGIN
      INSERT INTO t VALUES (1);
      SELECT CASE WHEN id = 1 THEN 'a;b' END FROM t;
    END;
    --
    DROP TABLE t
    ");
}
