//! Renderer-facing diagram built from a `ParsedQuery`
//!
//! Nodes mirror the structural graph one to one. Edges connect joins to the
//! tables they name and qualified projections to their source table.

use crate::core::query_graph::{ParsedQuery, Position, QueryTable};
use petgraph::Directed;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagramNodeKind {
    Table,
    Join,
    Filter,
    Projection,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DiagramNode {
    pub id: String,
    pub kind: DiagramNodeKind,
    pub label: String,
    pub position: Position,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagramEdge {
    /// table -> join
    JoinLeft,
    /// join -> table
    JoinRight,
    /// table -> projection
    Projects,
}

/// Nodes are structural elements, edges their relations
pub type QueryDiagram = StableGraph<DiagramNode, DiagramEdge, Directed>;

impl ParsedQuery {
    pub fn to_diagram(&self) -> QueryDiagram {
        let mut diagram = QueryDiagram::new();

        let tables: Vec<(NodeIndex, &QueryTable)> = self
            .tables
            .iter()
            .map(|table| {
                let label = match &table.alias {
                    Some(alias) => format!("{} ({})", table.name, alias),
                    None => table.name.clone(),
                };
                let idx = diagram.add_node(DiagramNode {
                    id: table.id.clone(),
                    kind: DiagramNodeKind::Table,
                    label,
                    position: table.position,
                });
                (idx, table)
            })
            .collect();

        let find_table = |reference: &str| {
            tables
                .iter()
                .find(|(_, t)| t.name == reference || t.reference_name() == reference)
                .map(|(idx, _)| *idx)
        };

        for join in &self.joins {
            let idx = diagram.add_node(DiagramNode {
                id: join.id.clone(),
                kind: DiagramNodeKind::Join,
                label: format!("{} JOIN", join.join_type),
                position: join.position,
            });
            if let Some(left) = find_table(join.left_table.as_str()) {
                diagram.add_edge(left, idx, DiagramEdge::JoinLeft);
            }
            if let Some(right) = find_table(join.right_table.as_str()) {
                diagram.add_edge(idx, right, DiagramEdge::JoinRight);
            }
        }

        for filter in &self.filters {
            diagram.add_node(DiagramNode {
                id: filter.id.clone(),
                kind: DiagramNodeKind::Filter,
                label: filter.condition.clone(),
                position: filter.position,
            });
        }

        for projection in &self.projections {
            let idx = diagram.add_node(DiagramNode {
                id: projection.id.clone(),
                kind: DiagramNodeKind::Projection,
                label: projection.label(),
                position: projection.position,
            });
            if let Some(source) = projection.table.as_deref().and_then(|t| find_table(t)) {
                diagram.add_edge(source, idx, DiagramEdge::Projects);
            }
        }

        diagram
    }
}

/// Look a node up by its structural id
pub fn find_node(diagram: &QueryDiagram, id: &str) -> Option<NodeIndex> {
    diagram
        .node_indices()
        .find(|&idx| diagram.node_weight(idx).is_some_and(|node| node.id == id))
}
