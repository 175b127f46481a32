pub mod adjacency;
pub mod assignment;
pub mod components;
pub mod store;

pub use components::Component;
pub use store::{DependencyGraph, Edge, GraphStats, Node};
