//! Infrastructure layer - database connectivity.

mod db;

pub use db::Database;
