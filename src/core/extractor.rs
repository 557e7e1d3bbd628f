//! Structural extraction of SELECT statements
//!
//! Walks the grammar IR and produces a flat `ParsedQuery` with fixed layout
//! rows: tables on top, projections just below, joins between table columns
//! and filters at the bottom.

use crate::core::grammar::{Expr, FromItem, Literal, QueryGrammar, SelectStatement, Statement};
use crate::core::query_graph::{
    JoinType, ParsedQuery, Position, QueryFilter, QueryJoin, QueryProjection, QueryTable,
};
use std::sync::Arc;

const TABLE_SPACING: i64 = 300;
const JOIN_OFFSET: i64 = 150;
const JOIN_ROW: i64 = 200;
const FILTER_SPACING: i64 = 250;
const FILTER_ROW: i64 = 400;
const PROJECTION_SPACING: i64 = 200;
const PROJECTION_ROW: i64 = 50;

/// Table placeholder for filters; conditions are not resolved to their owning table
pub const UNKNOWN_TABLE: &str = "unknown";

/// Reasons a query cannot be turned into a structural graph
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse SQL: {0}")]
    Syntax(String),

    #[error("Failed to parse SQL: Invalid query structure")]
    EmptyTree,

    #[error("Failed to parse SQL: Only SELECT statements are supported (got {0})")]
    UnsupportedStatement(String),
}

impl ParseError {
    pub fn syntax(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            ParseError::Syntax("Unknown error".to_string())
        } else {
            ParseError::Syntax(message)
        }
    }
}

/// Turns query text into a `ParsedQuery` using an injected grammar
#[derive(Clone)]
pub struct QueryExtractor {
    grammar: Arc<dyn QueryGrammar>,
}

impl QueryExtractor {
    pub fn new(grammar: Arc<dyn QueryGrammar>) -> Self {
        Self { grammar }
    }

    /// Parse a SELECT statement into its structural graph.
    ///
    /// Only the first statement of the input is used. Parsing is
    /// all-or-nothing: any failure returns an error and no partial graph.
    pub fn parse(&self, query: &str) -> Result<ParsedQuery, ParseError> {
        let mut statements = self
            .grammar
            .astify(query)
            .map_err(|e| ParseError::syntax(e.message))?;

        if statements.is_empty() {
            return Err(ParseError::EmptyTree);
        }

        let select = match statements.swap_remove(0) {
            Statement::Select(select) => select,
            Statement::Other { kind } => return Err(ParseError::UnsupportedStatement(kind)),
        };

        let parsed = extract(&select, query);
        tracing::debug!(
            tables = parsed.tables.len(),
            joins = parsed.joins.len(),
            filters = parsed.filters.len(),
            projections = parsed.projections.len(),
            "query extracted"
        );
        Ok(parsed)
    }
}

impl std::fmt::Debug for QueryExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExtractor").finish_non_exhaustive()
    }
}

fn extract(select: &SelectStatement, raw_query: &str) -> ParsedQuery {
    ParsedQuery {
        tables: extract_tables(&select.from),
        joins: extract_joins(&select.from),
        filters: select
            .selection
            .as_ref()
            .map(extract_filters)
            .unwrap_or_default(),
        projections: extract_projections(select),
        raw_query: raw_query.to_string(),
    }
}

fn extract_tables(from: &[FromItem]) -> Vec<QueryTable> {
    from.iter()
        .enumerate()
        .map(|(index, item)| {
            QueryTable::new(index, item.table.clone())
                .with_alias(item.alias.clone())
                .with_position(index as i64 * TABLE_SPACING, 0)
        })
        .collect()
}

fn extract_joins(from: &[FromItem]) -> Vec<QueryJoin> {
    from.iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let qualifier = item.join.as_deref().filter(|q| !q.trim().is_empty())?;
            // Both sides come from the same FROM item; the left relation is not tracked.
            Some(QueryJoin {
                id: format!("join-{}", index),
                join_type: JoinType::from_qualifier(qualifier),
                left_table: item.table.clone(),
                right_table: item.table.clone(),
                condition: item.on.as_ref().map(stringify).unwrap_or_default(),
                position: Position::new(index as i64 * TABLE_SPACING + JOIN_OFFSET, JOIN_ROW),
            })
        })
        .collect()
}

fn extract_filters(selection: &Expr) -> Vec<QueryFilter> {
    flatten_conditions(selection)
        .into_iter()
        .enumerate()
        .map(|(index, leaf)| QueryFilter {
            id: format!("filter-{}", index),
            table: UNKNOWN_TABLE.to_string(),
            condition: stringify(leaf),
            position: Position::new(index as i64 * FILTER_SPACING, FILTER_ROW),
        })
        .collect()
}

fn extract_projections(select: &SelectStatement) -> Vec<QueryProjection> {
    select
        .projection
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let (column, table, aggregation) = match &entry.expr {
                Expr::Column(column) => (column.column.clone(), column.table.clone(), None),
                Expr::Aggregate(call) => match &call.argument {
                    Some(arg) => (arg.column.clone(), arg.table.clone(), Some(call.name.clone())),
                    None => ("*".to_string(), None, Some(call.name.clone())),
                },
                _ => return None,
            };
            Some(QueryProjection {
                id: format!("projection-{}", index),
                column,
                table,
                alias: entry.alias.clone(),
                aggregation,
                position: Position::new(index as i64 * PROJECTION_SPACING, PROJECTION_ROW),
            })
        })
        .collect()
}

fn is_boolean_combinator(operator: &str) -> bool {
    operator.eq_ignore_ascii_case("AND") || operator.eq_ignore_ascii_case("OR")
}

/// Collect the leaf conditions of an AND/OR tree, left to right
pub fn flatten_conditions(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::Binary {
            left,
            operator,
            right,
        } if is_boolean_combinator(operator) => {
            let mut leaves = flatten_conditions(left);
            leaves.extend(flatten_conditions(right));
            leaves
        }
        leaf => vec![leaf],
    }
}

/// Render a condition as display text
pub fn stringify(expr: &Expr) -> String {
    match expr {
        Expr::Binary {
            left,
            operator,
            right,
        } => format!("{} {} {}", stringify(left), operator, stringify(right)),
        Expr::Column(column) => match &column.table {
            Some(table) => format!("{}.{}", table, column.column),
            None => column.column.clone(),
        },
        Expr::Literal(Literal::String(value)) | Expr::Literal(Literal::Number(value)) => {
            value.clone()
        }
        Expr::Aggregate(call) => {
            let argument = call
                .argument
                .as_ref()
                .map(|arg| stringify(&Expr::Column(arg.clone())))
                .unwrap_or_else(|| "*".to_string());
            format!("{}({})", call.name, argument)
        }
        Expr::Other(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grammar::{
        AggregateCall, ColumnRef, GrammarError, SelectEntry, SqlparserGrammar,
    };

    /// Grammar double returning canned statements
    struct StubGrammar {
        result: Result<Vec<Statement>, GrammarError>,
    }

    impl QueryGrammar for StubGrammar {
        fn astify(&self, _text: &str) -> Result<Vec<Statement>, GrammarError> {
            self.result.clone()
        }
    }

    fn extractor() -> QueryExtractor {
        QueryExtractor::new(Arc::new(SqlparserGrammar::default()))
    }

    fn stub(result: Result<Vec<Statement>, GrammarError>) -> QueryExtractor {
        QueryExtractor::new(Arc::new(StubGrammar { result }))
    }

    fn column(name: &str) -> Expr {
        Expr::Column(ColumnRef::new(name))
    }

    fn number(value: &str) -> Expr {
        Expr::Literal(Literal::Number(value.to_string()))
    }

    #[test]
    fn test_tables_in_single_row() {
        let parsed = extractor().parse("SELECT a.x FROM t1 a, t2 b").unwrap();

        assert_eq!(parsed.tables.len(), 2);
        assert_eq!(parsed.tables[0].name, "t1");
        assert_eq!(parsed.tables[0].alias.as_deref(), Some("a"));
        assert_eq!(parsed.tables[0].position, Position::new(0, 0));
        assert_eq!(parsed.tables[1].position, Position::new(300, 0));
        assert!(parsed.tables.iter().all(|t| t.columns.is_empty()));
        assert!(parsed.joins.is_empty());
    }

    #[test]
    fn test_same_table_twice_gets_distinct_ids() {
        let parsed = extractor()
            .parse("SELECT * FROM employees e JOIN employees m ON e.manager_id = m.id")
            .unwrap();
        assert_eq!(parsed.tables[0].id, "table-employees-0");
        assert_eq!(parsed.tables[1].id, "table-employees-1");
    }

    #[test]
    fn test_left_join_classified() {
        let parsed = extractor()
            .parse("SELECT u.name FROM users u LEFT JOIN orders o ON u.id = o.user_id")
            .unwrap();

        assert_eq!(parsed.joins.len(), 1);
        let join = &parsed.joins[0];
        assert_eq!(join.id, "join-1");
        assert_eq!(join.join_type, JoinType::Left);
        assert_eq!(join.condition, "u.id = o.user_id");
        assert_eq!(join.position, Position::new(450, 200));
    }

    #[test]
    fn test_join_sides_both_use_item_table() {
        let parsed = extractor()
            .parse("SELECT * FROM users u INNER JOIN orders o ON u.id = o.user_id")
            .unwrap();
        assert_eq!(parsed.joins[0].left_table, "orders");
        assert_eq!(parsed.joins[0].right_table, "orders");
    }

    #[test]
    fn test_join_types_from_sql() {
        let parsed = extractor()
            .parse(
                "SELECT * FROM a RIGHT JOIN b ON a.id = b.id \
                 FULL OUTER JOIN c ON b.id = c.id CROSS JOIN d",
            )
            .unwrap();
        let types: Vec<JoinType> = parsed.joins.iter().map(|j| j.join_type).collect();
        assert_eq!(types, vec![JoinType::Right, JoinType::Full, JoinType::Cross]);
        assert_eq!(parsed.joins[2].condition, "");
    }

    #[test]
    fn test_parenthesized_join_yields_tables_and_join() {
        let parsed = extractor()
            .parse("SELECT * FROM (a JOIN b ON a.id = b.id)")
            .unwrap();

        let ids: Vec<&str> = parsed.tables.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["table-a-0", "table-b-1"]);
        assert_eq!(parsed.joins.len(), 1);
        assert_eq!(parsed.joins[0].id, "join-1");
        assert_eq!(parsed.joins[0].join_type, JoinType::Inner);
        assert_eq!(parsed.joins[0].condition, "a.id = b.id");
    }

    #[test]
    fn test_semi_join_classified_by_side() {
        let parsed = extractor()
            .parse("SELECT * FROM a LEFT SEMI JOIN b ON a.id = b.id")
            .unwrap();
        assert_eq!(parsed.joins[0].join_type, JoinType::Left);
        assert_eq!(parsed.joins[0].condition, "a.id = b.id");
    }

    #[test]
    fn test_unqualified_item_emits_no_join() {
        let from = vec![
            FromItem::table("a"),
            FromItem::table("b").joined("", None),
            FromItem::table("c").joined("LEFT JOIN", Some(column("x"))),
        ];
        let joins = extract_joins(&from);
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].join_type, JoinType::Left);
        assert_eq!(joins[0].id, "join-2");
    }

    #[test]
    fn test_filters_flattened() {
        let parsed = extractor()
            .parse("SELECT * FROM t WHERE a = 1 AND (b = 2 OR c = 3)")
            .unwrap();

        let conditions: Vec<&str> = parsed.filters.iter().map(|f| f.condition.as_str()).collect();
        assert_eq!(conditions, vec!["a = 1", "b = 2", "c = 3"]);
        assert!(parsed.filters.iter().all(|f| f.table == UNKNOWN_TABLE));
        assert_eq!(parsed.filters[2].position, Position::new(500, 400));
    }

    #[test]
    fn test_single_condition_is_one_filter() {
        let parsed = extractor().parse("SELECT * FROM t WHERE t.status = 'open'").unwrap();
        assert_eq!(parsed.filters.len(), 1);
        assert_eq!(parsed.filters[0].condition, "t.status = open");
        assert_eq!(parsed.filters[0].table, "unknown");
    }

    #[test]
    fn test_flatten_leaves_other_operators() {
        let expr = Expr::binary(
            Expr::binary(column("a"), ">", number("1")),
            "AND",
            Expr::binary(column("b"), "<", number("2")),
        );
        let leaves = flatten_conditions(&expr);
        assert_eq!(leaves.len(), 2);

        let leaf = Expr::binary(column("a"), "=", number("1"));
        assert_eq!(flatten_conditions(&leaf), vec![&leaf]);
    }

    #[test]
    fn test_stringify_fallback() {
        assert_eq!(stringify(&Expr::Other("x IS NULL".to_string())), "x IS NULL");
        let parsed = extractor().parse("SELECT * FROM t WHERE x IS NULL").unwrap();
        assert_eq!(parsed.filters[0].condition, "x IS NULL");
    }

    #[test]
    fn test_projections() {
        let parsed = extractor()
            .parse("SELECT u.name AS username, COUNT(o.id) AS total, UPPER(u.email), * FROM users u")
            .unwrap();

        assert_eq!(parsed.projections.len(), 3);

        let name = &parsed.projections[0];
        assert_eq!(name.column, "name");
        assert_eq!(name.table.as_deref(), Some("u"));
        assert_eq!(name.alias.as_deref(), Some("username"));
        assert!(name.aggregation.is_none());
        assert_eq!(name.position, Position::new(0, 50));

        let total = &parsed.projections[1];
        assert_eq!(total.column, "id");
        assert_eq!(total.table.as_deref(), Some("o"));
        assert_eq!(total.aggregation.as_deref(), Some("COUNT"));
        assert_eq!(total.position, Position::new(200, 50));

        // UPPER(...) is skipped but still occupies its slot
        let star = &parsed.projections[2];
        assert_eq!(star.id, "projection-3");
        assert_eq!(star.column, "*");
        assert_eq!(star.position, Position::new(600, 50));
    }

    #[test]
    fn test_aggregate_without_column_argument() {
        let select = SelectStatement {
            projection: vec![SelectEntry {
                expr: Expr::Aggregate(AggregateCall {
                    name: "SUM".to_string(),
                    argument: None,
                }),
                alias: None,
            }],
            ..Default::default()
        };
        let projections = extract_projections(&select);
        assert_eq!(projections[0].column, "*");
        assert!(projections[0].table.is_none());
    }

    #[test]
    fn test_rejects_non_select() {
        let error = extractor().parse("UPDATE t SET x = 1").unwrap_err();
        assert_eq!(error, ParseError::UnsupportedStatement("UPDATE".to_string()));
        assert!(error.to_string().contains("Only SELECT statements are supported"));
    }

    #[test]
    fn test_rejects_invalid_sql() {
        let error = extractor().parse("not sql").unwrap_err();
        assert!(matches!(error, ParseError::Syntax(_)));
        assert!(error.to_string().starts_with("Failed to parse SQL: "));
    }

    #[test]
    fn test_empty_grammar_message() {
        let error = stub(Err(GrammarError::new(""))).parse("SELECT").unwrap_err();
        assert_eq!(error.to_string(), "Failed to parse SQL: Unknown error");
    }

    #[test]
    fn test_no_statements_is_error() {
        let error = stub(Ok(Vec::new())).parse("-- comment").unwrap_err();
        assert_eq!(error, ParseError::EmptyTree);
    }

    #[test]
    fn test_only_first_statement_used() {
        let parsed = extractor()
            .parse("SELECT a FROM first_table; DELETE FROM second_table")
            .unwrap();
        assert_eq!(parsed.tables.len(), 1);
        assert_eq!(parsed.tables[0].name, "first_table");
    }

    #[test]
    fn test_stub_grammar_drives_extraction() {
        let select = SelectStatement {
            from: vec![FromItem::table("events").with_alias("e")],
            selection: Some(Expr::binary(column("kind"), "=", number("7"))),
            projection: vec![SelectEntry {
                expr: column("id"),
                alias: None,
            }],
        };
        let parsed = stub(Ok(vec![Statement::Select(select)]))
            .parse("anything")
            .unwrap();
        assert_eq!(parsed.tables[0].name, "events");
        assert_eq!(parsed.filters[0].condition, "kind = 7");
        assert_eq!(parsed.projections[0].column, "id");
        assert_eq!(parsed.raw_query, "anything");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let sql = "SELECT u.id, COUNT(o.id) FROM users u LEFT JOIN orders o ON u.id = o.user_id \
                   WHERE u.active = 1 OR u.admin = 1";
        let first = extractor().parse(sql).unwrap();
        let second = extractor().parse(sql).unwrap();
        assert_eq!(first, second);
    }
}
