//! Grammar boundary for the structural extractor
//!
//! Provides:
//! - A typed intermediate representation (IR) for the subset of SQL the extractor reads
//! - The `QueryGrammar` trait, so the extractor can be driven by a test double
//! - `SqlparserGrammar`, the sqlparser-rs backed implementation
//!
//! All knowledge of the sqlparser AST shape lives in this module.

use serde::{Deserialize, Serialize};
use sqlparser::ast;
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::{Parser, ParserError};

/// Function names treated as aggregates when they appear in the SELECT list
const AGGREGATE_FUNCTIONS: &[&str] = &[
    "COUNT",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "GROUP_CONCAT",
    "STRING_AGG",
    "ARRAY_AGG",
    "STDDEV",
    "VARIANCE",
];

// ============================================================================
// Intermediate Representation
// ============================================================================

/// Top-level statement kinds the extractor distinguishes
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    /// Any non-SELECT statement; `kind` is its leading keyword, e.g. `UPDATE`
    Other { kind: String },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectStatement {
    pub from: Vec<FromItem>,
    pub selection: Option<Expr>,
    pub projection: Vec<SelectEntry>,
}

/// One relation of the FROM clause
#[derive(Clone, Debug, PartialEq)]
pub struct FromItem {
    pub table: String,
    pub alias: Option<String>,
    /// Join qualifier text such as `LEFT JOIN`; `None` for base and comma-separated relations
    pub join: Option<String>,
    pub on: Option<Expr>,
}

impl FromItem {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            join: None,
            on: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn joined(mut self, qualifier: impl Into<String>, on: Option<Expr>) -> Self {
        self.join = Some(qualifier.into());
        self.on = on;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectEntry {
    pub expr: Expr,
    pub alias: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    String(String),
    Number(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateCall {
    pub name: String,
    /// Column argument, `*` for `COUNT(*)`; `None` when the argument is not a column
    pub argument: Option<ColumnRef>,
}

/// Expression nodes consumed by extraction
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Binary {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
    },
    Column(ColumnRef),
    Literal(Literal),
    Aggregate(AggregateCall),
    /// Any node without a dedicated variant, kept as its SQL text
    Other(String),
}

impl Expr {
    pub fn binary(left: Expr, operator: impl Into<String>, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator: operator.into(),
            right: Box::new(right),
        }
    }
}

// ============================================================================
// Grammar trait
// ============================================================================

/// Failure reported by a grammar implementation
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GrammarError {
    pub message: String,
}

impl GrammarError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Turns SQL text into IR statements
pub trait QueryGrammar: Send + Sync {
    fn astify(&self, text: &str) -> Result<Vec<Statement>, GrammarError>;
}

// ============================================================================
// sqlparser-rs implementation
// ============================================================================

/// SQL dialect used by the sqlparser grammar
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlDialect {
    #[default]
    Generic,
    MySQL,
    PostgreSQL,
    SQLite,
}

impl SqlDialect {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "generic" | "ansi" => Some(SqlDialect::Generic),
            "mysql" => Some(SqlDialect::MySQL),
            "postgres" | "postgresql" => Some(SqlDialect::PostgreSQL),
            "sqlite" => Some(SqlDialect::SQLite),
            _ => None,
        }
    }
}

/// Grammar backed by sqlparser-rs
#[derive(Clone, Debug, Default)]
pub struct SqlparserGrammar {
    dialect: SqlDialect,
}

impl SqlparserGrammar {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    fn get_dialect(&self) -> Box<dyn Dialect> {
        match self.dialect {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::MySQL => Box::new(MySqlDialect {}),
            SqlDialect::PostgreSQL => Box::new(PostgreSqlDialect {}),
            SqlDialect::SQLite => Box::new(SQLiteDialect {}),
        }
    }
}

impl QueryGrammar for SqlparserGrammar {
    fn astify(&self, text: &str) -> Result<Vec<Statement>, GrammarError> {
        let dialect = self.get_dialect();
        let statements =
            Parser::parse_sql(dialect.as_ref(), text).map_err(|e| parser_error_message(&e))?;
        Ok(statements.iter().map(convert_statement).collect())
    }
}

/// Strip the "sql parser error: " prefix the sqlparser `Display` adds
fn parser_error_message(error: &ParserError) -> GrammarError {
    match error {
        ParserError::TokenizerError(message) | ParserError::ParserError(message) => {
            GrammarError::new(message.clone())
        }
        other => GrammarError::new(other.to_string()),
    }
}

fn convert_statement(statement: &ast::Statement) -> Statement {
    match statement {
        ast::Statement::Query(query) => match select_of_query(query) {
            Some(select) => Statement::Select(convert_select(select)),
            None => Statement::Other {
                kind: leading_keyword(&query.to_string()),
            },
        },
        other => Statement::Other {
            kind: leading_keyword(&other.to_string()),
        },
    }
}

fn leading_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .map(|word| word.to_uppercase())
        .unwrap_or_default()
}

/// Find the SELECT driving a query; set operations use their left-most branch
fn select_of_query(query: &ast::Query) -> Option<&ast::Select> {
    select_of_set_expr(&query.body)
}

fn select_of_set_expr(body: &ast::SetExpr) -> Option<&ast::Select> {
    match body {
        ast::SetExpr::Select(select) => Some(select.as_ref()),
        ast::SetExpr::Query(query) => select_of_query(query),
        ast::SetExpr::SetOperation { left, .. } => select_of_set_expr(left),
        _ => None,
    }
}

fn convert_select(select: &ast::Select) -> SelectStatement {
    let mut from = Vec::new();
    for table_with_joins in &select.from {
        push_table_with_joins(table_with_joins, &mut from);
    }

    SelectStatement {
        from,
        selection: select.selection.as_ref().map(convert_expr),
        projection: select.projection.iter().map(convert_select_item).collect(),
    }
}

/// Flatten a relation and its joins into FROM items, in source order
fn push_table_with_joins(table_with_joins: &ast::TableWithJoins, from: &mut Vec<FromItem>) {
    push_relation(&table_with_joins.relation, None, None, from);

    for join in &table_with_joins.joins {
        push_relation(
            &join.relation,
            Some(join_qualifier(&join.join_operator).to_string()),
            join_on_expr(&join.join_operator).map(convert_expr),
            from,
        );
    }
}

/// A parenthesized join contributes its own relations; the outer qualifier
/// lands on the first of them
fn push_relation(
    factor: &ast::TableFactor,
    join: Option<String>,
    on: Option<Expr>,
    from: &mut Vec<FromItem>,
) {
    if let ast::TableFactor::NestedJoin {
        table_with_joins, ..
    } = factor
    {
        let start = from.len();
        push_table_with_joins(table_with_joins, from);
        if let Some(first) = from.get_mut(start) {
            first.join = join;
            first.on = on;
        }
        return;
    }

    let (table, alias) = convert_table_factor(factor);
    from.push(FromItem {
        table,
        alias,
        join,
        on,
    });
}

fn convert_table_factor(factor: &ast::TableFactor) -> (String, Option<String>) {
    match factor {
        ast::TableFactor::Table { name, alias, .. } => (
            object_name_tail(name),
            alias.as_ref().map(|a| a.name.value.clone()),
        ),
        ast::TableFactor::Derived { alias, .. } => (
            "(subquery)".to_string(),
            alias.as_ref().map(|a| a.name.value.clone()),
        ),
        other => (other.to_string(), None),
    }
}

/// Last identifier of a possibly schema-qualified name
fn object_name_tail(name: &ast::ObjectName) -> String {
    match name.0.last() {
        Some(ast::ObjectNamePart::Identifier(ident)) => ident.value.clone(),
        _ => name.to_string(),
    }
}

/// Qualifier text for a join; a bare `JOIN` reads as `INNER JOIN`
fn join_qualifier(operator: &ast::JoinOperator) -> &'static str {
    match operator {
        ast::JoinOperator::Join(_) | ast::JoinOperator::Inner(_) => "INNER JOIN",
        ast::JoinOperator::Left(_) => "LEFT JOIN",
        ast::JoinOperator::LeftOuter(_) => "LEFT OUTER JOIN",
        ast::JoinOperator::Right(_) => "RIGHT JOIN",
        ast::JoinOperator::RightOuter(_) => "RIGHT OUTER JOIN",
        ast::JoinOperator::FullOuter(_) => "FULL OUTER JOIN",
        ast::JoinOperator::LeftSemi(_) => "LEFT SEMI JOIN",
        ast::JoinOperator::LeftAnti(_) => "LEFT ANTI JOIN",
        ast::JoinOperator::RightSemi(_) => "RIGHT SEMI JOIN",
        ast::JoinOperator::RightAnti(_) => "RIGHT ANTI JOIN",
        ast::JoinOperator::CrossJoin { .. } => "CROSS JOIN",
        ast::JoinOperator::CrossApply { .. } => "CROSS APPLY",
        ast::JoinOperator::OuterApply { .. } => "OUTER APPLY",
        _ => "JOIN",
    }
}

fn join_on_expr(operator: &ast::JoinOperator) -> Option<&ast::Expr> {
    let constraint = match operator {
        ast::JoinOperator::Join(constraint)
        | ast::JoinOperator::Inner(constraint)
        | ast::JoinOperator::Left(constraint)
        | ast::JoinOperator::LeftOuter(constraint)
        | ast::JoinOperator::Right(constraint)
        | ast::JoinOperator::RightOuter(constraint)
        | ast::JoinOperator::FullOuter(constraint)
        | ast::JoinOperator::LeftSemi(constraint)
        | ast::JoinOperator::LeftAnti(constraint)
        | ast::JoinOperator::RightSemi(constraint)
        | ast::JoinOperator::RightAnti(constraint) => constraint,
        _ => return None,
    };
    match constraint {
        ast::JoinConstraint::On(expr) => Some(expr),
        _ => None,
    }
}

fn convert_select_item(item: &ast::SelectItem) -> SelectEntry {
    match item {
        ast::SelectItem::UnnamedExpr(expr) => SelectEntry {
            expr: convert_expr(expr),
            alias: None,
        },
        ast::SelectItem::ExprWithAlias { expr, alias } => SelectEntry {
            expr: convert_expr(expr),
            alias: Some(alias.value.clone()),
        },
        ast::SelectItem::Wildcard(..) => SelectEntry {
            expr: Expr::Column(ColumnRef::new("*")),
            alias: None,
        },
        ast::SelectItem::QualifiedWildcard(kind, _) => {
            let table = match kind {
                ast::SelectItemQualifiedWildcardKind::ObjectName(name) => object_name_tail(name),
                ast::SelectItemQualifiedWildcardKind::Expr(expr) => expr.to_string(),
            };
            SelectEntry {
                expr: Expr::Column(ColumnRef::qualified(table, "*")),
                alias: None,
            }
        }
        #[allow(unreachable_patterns)]
        other => SelectEntry {
            expr: Expr::Other(other.to_string()),
            alias: None,
        },
    }
}

fn convert_expr(expr: &ast::Expr) -> Expr {
    match expr {
        ast::Expr::Nested(inner) => convert_expr(inner),
        ast::Expr::BinaryOp { left, op, right } => {
            Expr::binary(convert_expr(left), op.to_string(), convert_expr(right))
        }
        ast::Expr::Identifier(ident) => Expr::Column(ColumnRef::new(ident.value.clone())),
        ast::Expr::CompoundIdentifier(idents) => match idents.as_slice() {
            [.., table, column] => {
                Expr::Column(ColumnRef::qualified(table.value.clone(), column.value.clone()))
            }
            [column] => Expr::Column(ColumnRef::new(column.value.clone())),
            [] => Expr::Other(expr.to_string()),
        },
        ast::Expr::Value(value) => match &value.value {
            ast::Value::SingleQuotedString(s) | ast::Value::DoubleQuotedString(s) => {
                Expr::Literal(Literal::String(s.clone()))
            }
            ast::Value::Number(n, _) => Expr::Literal(Literal::Number(n.to_string())),
            _ => Expr::Other(expr.to_string()),
        },
        ast::Expr::Function(function) => convert_function(function, expr),
        other => Expr::Other(other.to_string()),
    }
}

fn convert_function(function: &ast::Function, expr: &ast::Expr) -> Expr {
    let name = object_name_tail(&function.name).to_uppercase();
    if !AGGREGATE_FUNCTIONS.contains(&name.as_str()) {
        return Expr::Other(expr.to_string());
    }

    let argument = match &function.args {
        ast::FunctionArguments::List(list) => list.args.first().and_then(function_arg_column),
        _ => None,
    };

    Expr::Aggregate(AggregateCall { name, argument })
}

fn function_arg_column(arg: &ast::FunctionArg) -> Option<ColumnRef> {
    let arg_expr = match arg {
        ast::FunctionArg::Unnamed(arg) => arg,
        ast::FunctionArg::Named { arg, .. } => arg,
        ast::FunctionArg::ExprNamed { arg, .. } => arg,
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    match arg_expr {
        ast::FunctionArgExpr::Wildcard => Some(ColumnRef::new("*")),
        ast::FunctionArgExpr::QualifiedWildcard(name) => {
            Some(ColumnRef::qualified(object_name_tail(name), "*"))
        }
        ast::FunctionArgExpr::Expr(inner) => match convert_expr(inner) {
            Expr::Column(column) => Some(column),
            _ => None,
        },
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
