use pretty_assertions::assert_eq;
use rstest::rstest;

use sqlalign::clause::{Clause, ClauseScope};
use sqlalign::collapse::tokenize;
use sqlalign::compound::CompoundStatement;
use sqlalign::context::FormatContext;
use sqlalign::lexer::lex;
use sqlalign::{format, format_script, format_string, FormatMode, Mode, SqlalignError};

fn fmt(sql: &str) -> String {
    format(sql, FormatMode::Default).unwrap()
}

// ─── Layout scenarios ───

#[test]
fn test_comma_first_select_list() {
    assert_eq!(fmt("select foo, bar, baz"), "select foo\n     , bar\n     , baz");
}

#[test]
fn test_union_all() {
    assert_eq!(fmt("select 1 union all select 2"), "select 1\nunion all\nselect 2");
}

#[test]
fn test_with_query() {
    assert_eq!(
        fmt("with foo as (select 1) select 2"),
        "with foo as\n(\n    select 1\n)\nselect 2"
    );
}

#[test]
fn test_where_river() {
    assert_eq!(
        fmt("select foo from table1 where 1=1 and bar > baz"),
        "select foo\n  from table1\n where 1=1\n   and bar > baz"
    );
}

#[test]
fn test_every_clause() {
    let formatted = fmt(
        "SELECT a, b FROM t WHERE a = 1 AND b = 2 GROUP BY a HAVING count(*) > 1 \
         ORDER BY a LIMIT 10 OFFSET 5",
    );
    insta::assert_snapshot!(formatted, @r"
    select a
         , b
      from t
     where a = 1
       and b = 2
    group by a
      having count(*) > 1
    order by a
     limit 10
    offset 5
    ");
}

#[test]
fn test_joins_hang_under_from() {
    assert_eq!(
        fmt("select * from a left join b on a.id = b.id join c using (id)"),
        "select *\n  from a\n  left join b on a.id = b.id\n  join c using (id)"
    );
}

#[test]
fn test_several_ctes() {
    let formatted = fmt("with a as (select 1), b as (select 2) select * from a, b");
    insta::assert_snapshot!(formatted, @r"
    with a as
    (
        select 1
    )
    , b as
    (
        select 2
    )
    select *
      from a
         , b
    ");
}

#[test]
fn test_subquery_in_from() {
    assert_eq!(
        fmt("select * from (select a, b from t) x where x.a = 1"),
        "select *\n  from (select a\n             , b\n          from t\n       ) x\n where x.a = 1"
    );
}

#[test]
fn test_distinct() {
    assert_eq!(
        fmt("select distinct a, b from t"),
        "select distinct\n       a\n     , b\n  from t"
    );
}

#[test]
fn test_line_comment_ends_its_line() {
    assert_eq!(
        fmt("select a -- first\n, b from t"),
        "select a -- first\n     , b\n  from t"
    );
}

#[test]
fn test_between_and_case_do_not_split_where() {
    assert_eq!(
        fmt("select a from t where a between 1 and 2 and case when b and c then 1 end = 1"),
        "select a\n  from t\n where a between 1 and 2\n   and case when b and c then 1 end = 1"
    );
}

#[test]
fn test_quoted_and_qualified_names_survive() {
    assert_eq!(
        fmt("SELECT \"MyColumn\", 'a, b' FROM \"MySchema\".\"MyTable\""),
        "select \"MyColumn\"\n     , 'a, b'\n  from \"MySchema\".\"MyTable\""
    );
}

// ─── Format modes ───

#[test]
fn test_default_mode_keeps_extra_leading_spaces() {
    assert_eq!(fmt("select    a,    b"), "select    a\n     ,    b");
}

#[test]
fn test_trim_mode_drops_leading_spaces() {
    assert_eq!(
        format("select    a,    b", FormatMode::TrimLeadingWhitespace).unwrap(),
        "select a\n     , b"
    );
}

#[test]
fn test_compact_mode() {
    assert_eq!(
        format(
            "select  count (*) ,  x   from t where a in ( 1 , 2 )",
            FormatMode::CompactExpressions
        )
        .unwrap(),
        "select count(*)\n     , x\n  from t\n where a in (1,2)"
    );
}

#[rstest]
#[case(
    FormatMode::Default,
    "select a,\r\n b\r\nfrom t\r\nwhere x = 1\r\n",
    "select a\n     ,\n       b\n  from t\n where x = 1"
)]
#[case(
    FormatMode::TrimLeadingWhitespace,
    "select a,\r\n b\r\nfrom t\r\nwhere x = 1\r\n",
    "select a\n     , b\n  from t\n where x = 1"
)]
#[case(FormatMode::Default, "select\ta,\tb\tfrom t", "select a\n     , b\n  from t")]
#[case(
    FormatMode::TrimLeadingWhitespace,
    "select\ta,\tb\tfrom t",
    "select a\n     , b\n  from t"
)]
#[case(
    FormatMode::CompactExpressions,
    "select f (a ,\tb)\r\nfrom t\t\r\n",
    "select f(a,b)\n  from t"
)]
fn test_tabs_and_crlf_leave_no_trailing_whitespace(
    #[case] mode: FormatMode,
    #[case] sql: &str,
    #[case] expected: &str,
) {
    let formatted = format(sql, mode).unwrap();
    assert_eq!(formatted, expected);
    for line in formatted.split('\n') {
        assert_eq!(line, line.trim_end(), "trailing whitespace in {formatted:?}");
    }
    assert_eq!(format(&formatted, mode).unwrap(), formatted);
}

// ─── Properties ───

#[rstest]
fn test_idempotence(
    #[values(
        "select foo, bar, baz",
        "select 1 union all select 2",
        "with foo as (select 1) select 2",
        "select foo from table1 where 1=1 and bar > baz",
        "select a, b from t where a = 1 and b = 2 group by a having count(*) > 1 order by a limit 10 offset 5",
        "select * from (select a, b from t) x where x.a = 1",
        "select * from a left join b on a.id = b.id",
        "select distinct a, b from t",
        "select a -- first\n, b from t",
        "with a as (select 1), b as (select 2) select * from a, b"
    )]
    sql: &str,
    #[values(
        FormatMode::Default,
        FormatMode::TrimLeadingWhitespace,
        FormatMode::CompactExpressions
    )]
    mode: FormatMode,
) {
    let once = format(sql, mode).unwrap();
    let twice = format(&once, mode).unwrap();
    assert_eq!(twice, once);
}

#[rstest]
#[case("SELECT 1", "select 1")]
#[case("SELECT 1 UNION ALL SELECT 2", "select 1 union all select 2")]
#[case(
    "SELECT a FROM t WHERE x = 1 AND y = 2 OR z = 3",
    "select a from t where x = 1 and y = 2 or z = 3"
)]
#[case(
    "SELECT a FROM t GROUP BY a ORDER BY a LIMIT 5",
    "select a from t group by a order by a limit 5"
)]
fn test_keyword_case_does_not_matter(#[case] upper: &str, #[case] lower: &str) {
    for mode in [
        FormatMode::Default,
        FormatMode::TrimLeadingWhitespace,
        FormatMode::CompactExpressions,
    ] {
        assert_eq!(format(upper, mode).unwrap(), format(lower, mode).unwrap());
    }
}

#[rstest]
#[case("")]
#[case("select 'unterminated")]
#[case("select /* never closed")]
#[case("SELECT\tx.\"y\" FROM t -- c\r\n")]
#[case("select $tag$ body $tag$, $1 from größe")]
#[case("(((")]
fn test_lexer_partitions_input(#[case] text: &str) {
    let tokens = lex(text).unwrap();
    let joined: String = tokens.iter().map(|t| t.value()).collect();
    assert_eq!(joined, text);
}

#[test]
fn test_clause_and_compound_invariants() {
    let ctx = FormatContext::from(FormatMode::Default);
    let tokens = tokenize(
        "select a, b from t join u on t.id = u.id where a = 1 or b = 2 \
         group by a, b having sum(c) > 0 order by a limit 1 \
         union select 1 except select 2",
    )
    .unwrap();
    let compound = CompoundStatement::parse(&tokens, ctx).unwrap();
    assert_eq!(compound.statements().len(), compound.set_operations().len() + 1);

    let first = &compound.statements()[0];
    for clause in first.clauses() {
        assert_eq!(clause.delimiter_count(), clause.expression_count());
    }
    assert!(matches!(
        first.clause(ClauseScope::GroupBy),
        Some(Clause::GroupBy(group_by)) if group_by.delimiters().len() == 3
    ));
}

// ─── Errors ───

#[rstest]
#[case("select foo where 1=1 from table1")]
#[case("select a from t from u")]
#[case("from t select a")]
#[case("select a limit 1 order by a")]
fn test_ordering_errors(#[case] sql: &str) {
    assert!(matches!(
        format(sql, FormatMode::Default),
        Err(SqlalignError::Ordering { .. })
    ));
}

#[test]
fn test_ordering_error_message() {
    let err = format("select foo where 1=1 from table1", FormatMode::Default).unwrap_err();
    assert_eq!(
        err.to_string(),
        "sqlalign structure error: unexpected \"from\" starting a FROM clause after the WHERE clause"
    );
}

#[test]
fn test_repeated_limit_message_names_the_scope() {
    let err = format("select a from t limit 1 offset 2 limit 3", FormatMode::Default).unwrap_err();
    assert!(matches!(err, SqlalignError::Clause { .. }));
    assert_eq!(
        err.to_string(),
        "sqlalign clause error: LIMIT/OFFSET clause repeats \"limit\": \
         only one \"limit\" is allowed in the LIMIT/OFFSET scope"
    );
}

#[test]
fn test_dangling_set_operation() {
    assert!(matches!(
        format("select 1 union", FormatMode::Default),
        Err(SqlalignError::SetOperation { .. })
    ));
}

#[test]
fn test_nesting_limit() {
    let mode = Mode {
        max_nesting_depth: 2,
        ..Mode::default()
    };
    assert!(format_string("select (select (select 1))", &mode).is_ok());
    assert!(matches!(
        format_string("select (select (select (select 1)))", &mode),
        Err(SqlalignError::NestingTooDeep { limit: 2 })
    ));
}

// ─── Leniency ───

#[test]
fn test_parenthesized_union_operands_are_kept() {
    assert_eq!(
        fmt("(select 1) union (select 2)"),
        "(select 1\n)\nunion\n(select 2\n)"
    );
}

#[test]
fn test_unbalanced_input_is_annotated() {
    let formatted = fmt("select f(a, b from t");
    assert!(formatted.ends_with("\n-- sqlalign: unbalanced parentheses"));
    assert_eq!(fmt(&formatted), formatted);
}

#[test]
fn test_many_unclosed_parens_format_in_linear_time() {
    let sql = "select (".repeat(20_000);
    let started = std::time::Instant::now();
    let formatted = fmt(&sql);
    assert!(
        started.elapsed() < std::time::Duration::from_secs(10),
        "took {:?}",
        started.elapsed()
    );
    assert!(formatted.starts_with("select (select (select ("));
    assert!(formatted.ends_with("\n-- sqlalign: unbalanced parentheses"));
}

#[test]
fn test_unclosed_cte_body_does_not_swallow_later_ctes() {
    let formatted = fmt("with a as (select 1, b as (select 2) select * from t");
    insta::assert_snapshot!(formatted, @r"
    with a as (select 1 /* sqlalign: missing CTE body */
    , b as
    (
        select 2
    ) select * from t
    -- sqlalign: unbalanced parentheses
    ");
    assert_eq!(fmt(&formatted), formatted);
}

#[test]
fn test_missing_cte_body_is_annotated() {
    let formatted = fmt("with foo as select 1");
    assert_eq!(
        formatted,
        "with foo as /* sqlalign: missing CTE body */\nselect 1"
    );
    assert_eq!(fmt(&formatted), formatted);
}

// ─── Scripts ───

#[test]
fn test_format_script() {
    let script = "SELECT a, b FROM t;\nselect 1;\n\n\nselect 2";
    assert_eq!(
        format_script(script, &Mode::default()).unwrap(),
        "select a\n     , b\n  from t;\n\nselect 1;\n\nselect 2\n"
    );
}

#[test]
fn test_format_script_reports_the_failing_statement() {
    let result = format_script("select 1; select a where b from c;", &Mode::default());
    assert!(matches!(result, Err(SqlalignError::Ordering { .. })));
}
