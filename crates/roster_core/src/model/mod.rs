//! Domain model for the student registry.
//!
//! # Responsibility
//! - Define the student record and its draft (pre-insert) shape.
//! - Own field-level validation shared by constructors, serde, and storage.
//!
//! # Invariants
//! - Persisted students are identified by a store-assigned `StudentId`.
//! - `Gender` is a closed set; unknown values are rejected at construction.

pub mod student;
