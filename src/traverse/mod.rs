// Traversal engine: schema-aware walkers that run a visitor chain on every key

pub mod context;
pub mod entity;
pub mod fields;
pub mod filters;
pub mod populate;
pub mod sort;
pub mod visitor;

pub use context::{Parent, Path, Shape, TraverseOptions, VisitContext};
pub use entity::traverse_entity;
pub use fields::traverse_query_fields;
pub use filters::{is_logical_operator, is_operator, traverse_query_filters};
pub use populate::{normalize_populate, traverse_query_populate, POPULATE_FRAGMENT_KEYS};
pub use sort::traverse_query_sort;
pub use visitor::{Mutation, Visitor, VisitorChain};
