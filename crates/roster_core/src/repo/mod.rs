//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the student record store contract.
//! - Isolate SQLite query details from the registry service.
//!
//! # Invariants
//! - Write paths validate drafts before any SQL mutation.
//! - A unique-index violation on email surfaces as `RepoError::DuplicateEmail`,
//!   not as a raw SQLite error.

pub mod student_repo;
