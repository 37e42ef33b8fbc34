//! Core use-case services.
//!
//! # Responsibility
//! - Enforce registry business rules above the repository layer.
//! - Keep CLI/front-end layers decoupled from storage details.

pub mod student_service;
