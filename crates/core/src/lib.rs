pub mod config;
pub mod entity;
pub mod error;
pub mod triplet;

pub use config::PlanConfig;
pub use entity::*;
pub use error::*;
pub use triplet::*;
