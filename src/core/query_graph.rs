use serde::{Deserialize, Serialize};

/// Позиция узла на канвасе
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Узел графа - таблица из FROM
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryTable {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Заполняется внешним источником схемы, из запроса не выводится
    pub columns: Vec<String>,
    pub position: Position,
}

impl QueryTable {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("table-{}-{}", name, index),
            name,
            alias: None,
            columns: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_position(mut self, x: i64, y: i64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Name as referenced elsewhere in the query (alias wins over name)
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Тип соединения
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, derive_more::Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    #[display("INNER")]
    Inner,
    #[display("LEFT")]
    Left,
    #[display("RIGHT")]
    Right,
    #[display("FULL")]
    Full,
    #[display("CROSS")]
    Cross,
}

impl JoinType {
    /// Classify a join qualifier such as `LEFT OUTER JOIN`.
    ///
    /// Matching is case-insensitive and by substring, checked in the order
    /// LEFT, RIGHT, FULL, CROSS; anything else is an inner join.
    pub fn from_qualifier(qualifier: &str) -> Self {
        let upper = qualifier.to_uppercase();
        if upper.contains("LEFT") {
            JoinType::Left
        } else if upper.contains("RIGHT") {
            JoinType::Right
        } else if upper.contains("FULL") {
            JoinType::Full
        } else if upper.contains("CROSS") {
            JoinType::Cross
        } else {
            JoinType::Inner
        }
    }
}

/// Узел соединения между таблицами
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryJoin {
    pub id: String,
    #[serde(rename = "type")]
    pub join_type: JoinType,
    pub left_table: String,
    pub right_table: String,
    pub condition: String,
    pub position: Position,
}

/// Условие из WHERE (один лист после разворачивания AND/OR)
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub id: String,
    pub table: String,
    pub condition: String,
    pub position: Position,
}

/// Колонка из списка SELECT
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryProjection {
    pub id: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    pub position: Position,
}

impl QueryProjection {
    /// Text shown on the projection node, e.g. `COUNT(o.id) AS total`
    pub fn label(&self) -> String {
        let column = match &self.table {
            Some(table) => format!("{}.{}", table, self.column),
            None => self.column.clone(),
        };
        let expr = match &self.aggregation {
            Some(func) => format!("{}({})", func, column),
            None => column,
        };
        match &self.alias {
            Some(alias) => format!("{} AS {}", expr, alias),
            None => expr,
        }
    }
}

/// Структурный граф запроса, пересоздаётся целиком при каждом разборе
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    pub tables: Vec<QueryTable>,
    pub joins: Vec<QueryJoin>,
    pub filters: Vec<QueryFilter>,
    pub projections: Vec<QueryProjection>,
    pub raw_query: String,
}

impl ParsedQuery {
    pub fn node_count(&self) -> usize {
        self.tables.len() + self.joins.len() + self.filters.len() + self.projections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_type_priority() {
        assert_eq!(JoinType::from_qualifier("LEFT JOIN"), JoinType::Left);
        assert_eq!(JoinType::from_qualifier("left outer join"), JoinType::Left);
        assert_eq!(JoinType::from_qualifier("RIGHT OUTER JOIN"), JoinType::Right);
        assert_eq!(JoinType::from_qualifier("FULL OUTER JOIN"), JoinType::Full);
        assert_eq!(JoinType::from_qualifier("CROSS JOIN"), JoinType::Cross);
        assert_eq!(JoinType::from_qualifier("INNER JOIN"), JoinType::Inner);
        assert_eq!(JoinType::from_qualifier("NATURAL JOIN"), JoinType::Inner);
    }

    #[test]
    fn test_join_serializes_type_field() {
        let join = QueryJoin {
            id: "join-1".to_string(),
            join_type: JoinType::Left,
            left_table: "orders".to_string(),
            right_table: "orders".to_string(),
            condition: "u.id = o.user_id".to_string(),
            position: Position::new(450, 200),
        };
        let json = serde_json::to_value(&join).unwrap();
        assert_eq!(json["type"], "LEFT");
        assert_eq!(json["leftTable"], "orders");
        assert_eq!(json["position"]["x"], 450);
    }

    #[test]
    fn test_table_id_includes_index() {
        let first = QueryTable::new(0, "users");
        let second = QueryTable::new(1, "users");
        assert_eq!(first.id, "table-users-0");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_reference_name_prefers_alias() {
        let table = QueryTable::new(0, "users");
        assert_eq!(table.reference_name(), "users");
        let table = table.with_alias(Some("u".to_string()));
        assert_eq!(table.reference_name(), "u");
    }

    #[test]
    fn test_semi_and_anti_qualifiers_keep_side() {
        assert_eq!(JoinType::from_qualifier("LEFT SEMI JOIN"), JoinType::Left);
        assert_eq!(JoinType::from_qualifier("RIGHT ANTI JOIN"), JoinType::Right);
    }

    #[test]
    fn test_projection_label() {
        let projection = QueryProjection {
            id: "projection-0".to_string(),
            column: "id".to_string(),
            table: Some("o".to_string()),
            alias: Some("total".to_string()),
            aggregation: Some("COUNT".to_string()),
            position: Position::default(),
        };
        assert_eq!(projection.label(), "COUNT(o.id) AS total");
    }

    #[test]
    fn test_optional_fields_skipped() {
        let table = QueryTable::new(0, "users");
        let json = serde_json::to_value(&table).unwrap();
        assert!(json.get("alias").is_none());
        assert!(json["columns"].as_array().unwrap().is_empty());
    }
}
