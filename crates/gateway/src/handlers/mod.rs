//! Request handlers.

pub mod health;
pub mod predict;

pub use health::health;
pub use predict::predict;
