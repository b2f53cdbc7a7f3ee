//! SQLite backend for the marketplace payment engine.
//!
//! [`SqliteDatabase`] implements every backend trait in [`crate::traits`]. Migrations are embedded from
//! `src/sqlite/migrations` and can be applied with [`SqliteDatabase::run_migrations`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
