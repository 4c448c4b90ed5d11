//! Database layer for leanline
//!
//! Plain CRUD over SQLite for user profiles and readings, with schema
//! migrations. The analytics layer never talks to this module; callers
//! fetch a profile and its readings and hand them over.

pub mod repo;
pub mod schema;

pub use repo::Database;
