//! SQLite access for the book's tables.
//!
//! Each submodule owns one table and exposes plain async functions over a
//! `SqlitePool`; handlers never build SQL themselves.

pub mod annotations;
pub mod audit;
pub mod pages;
pub mod users;
