//! Student domain model.
//!
//! # Responsibility
//! - Define the persisted `Student` record and the unsaved `NewStudent` draft.
//! - Validate name/email shape before anything reaches storage.
//!
//! # Invariants
//! - `Student::id` is assigned by the store on insert and never changes.
//! - `name` is non-blank and `email` is `local@domain.tld` shaped.
//! - Email uniqueness is a registry-level rule, not checked here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Store-assigned student identifier.
pub type StudentId = i64;

/// Closed gender enumeration.
///
/// Wire and storage form is the upper-case variant name (`MALE`, `FEMALE`,
/// `OTHER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Stable upper-case name used on the wire and in the `students` table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }

    /// Parses a gender name, ignoring ASCII case and surrounding whitespace.
    ///
    /// # Errors
    /// - Returns `StudentValidationError::UnknownGender` for any other value.
    pub fn parse(value: &str) -> Result<Self, StudentValidationError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "OTHER" => Ok(Self::Other),
            _ => Err(StudentValidationError::UnknownGender(value.to_string())),
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = StudentValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Field-level validation failures for student input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    /// `name` is empty after trim.
    BlankName,
    /// `email` does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// Gender name outside `MALE|FEMALE|OTHER`.
    UnknownGender(String),
}

impl Display for StudentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "student name must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::UnknownGender(value) => write!(
                f,
                "unknown gender `{value}`; expected MALE|FEMALE|OTHER"
            ),
        }
    }
}

impl Error for StudentValidationError {}

/// Unsaved student draft submitted for registration.
///
/// Deserialization runs the same validation as [`NewStudent::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNewStudent")]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub gender: Gender,
}

#[derive(Deserialize)]
struct RawNewStudent {
    name: String,
    email: String,
    gender: Gender,
}

impl TryFrom<RawNewStudent> for NewStudent {
    type Error = StudentValidationError;

    fn try_from(value: RawNewStudent) -> Result<Self, Self::Error> {
        Self::new(value.name, value.email, value.gender)
    }
}

impl NewStudent {
    /// Builds a validated draft. Name and email are trimmed.
    ///
    /// # Errors
    /// - `BlankName` when `name` is empty after trim.
    /// - `InvalidEmail` when `email` is not address shaped.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        gender: Gender,
    ) -> Result<Self, StudentValidationError> {
        let student = Self {
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            gender,
        };
        student.validate()?;
        Ok(student)
    }

    /// Checks field-level invariants.
    ///
    /// Fields are public, so write paths call this again before persisting.
    pub fn validate(&self) -> Result<(), StudentValidationError> {
        validate_fields(&self.name, &self.email)
    }
}

/// Persisted student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub gender: Gender,
}

impl Student {
    /// Attaches a store-assigned id to a draft.
    pub fn from_new(id: StudentId, student: NewStudent) -> Self {
        Self {
            id,
            name: student.name,
            email: student.email,
            gender: student.gender,
        }
    }

    /// Checks field-level invariants of a persisted record.
    pub fn validate(&self) -> Result<(), StudentValidationError> {
        validate_fields(&self.name, &self.email)
    }
}

fn validate_fields(name: &str, email: &str) -> Result<(), StudentValidationError> {
    if name.trim().is_empty() {
        return Err(StudentValidationError::BlankName);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(StudentValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}
