//! Core domain models and business logic for query visualization

pub mod config;
pub mod diagram;
pub mod external_config;
pub mod extractor;
pub mod grammar;
pub mod persistence;
mod query_graph;
mod settings;
pub mod store;

pub use diagram::{DiagramEdge, DiagramNode, DiagramNodeKind, QueryDiagram, find_node};
pub use external_config::{CONFIG_MESSAGE_TYPE, ExternalConfig, ExternalConfigError};
pub use extractor::{ParseError, QueryExtractor};
pub use grammar::{GrammarError, QueryGrammar, SqlDialect, SqlparserGrammar};
pub use persistence::{MemoryPersistence, NoPersistence, Persistence, PersistenceError};
pub use query_graph::*;
pub use settings::*;
pub use store::{DEFAULT_QUERY, VisualizerState, VisualizerStore};
