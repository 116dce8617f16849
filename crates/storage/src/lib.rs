//! Storage layer for Warbler
//!
//! This crate provides the relational store handle: SQLite connection
//! pooling, versioned migrations, and transaction support.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;

pub use database::{
    Database, DatabaseConfig, DatabaseError, DatabaseTransaction, MigrationDefinition, Result,
    SqliteDatabase, SynchronousMode,
};
