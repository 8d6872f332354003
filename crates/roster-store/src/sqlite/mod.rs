//! SQLite plumbing: connection pool, migrations, and the identity repository.

pub mod connection;
pub mod migrations;
pub mod repository;
