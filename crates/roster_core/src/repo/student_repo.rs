//! Student record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/list/exists/delete primitives over the `students` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `insert` validates the draft and returns the row with its assigned id.
//! - `delete_by_id` on a missing id is a no-op; callers check first.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::student::{Gender, NewStudent, Student, StudentId, StudentValidationError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const STUDENTS_TABLE: &str = "students";
const STUDENT_COLUMNS: &[&str] = &["id", "name", "email", "gender"];
const STUDENT_SELECT_SQL: &str = "SELECT id, name, email, gender FROM students";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from student persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(StudentValidationError),
    Db(DbError),
    /// Insert hit the unique index on `students.email`.
    DuplicateEmail(String),
    InvalidData(String),
    /// Connection schema is older than this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateEmail(email) => write!(f, "email already stored: {email}"),
            Self::InvalidData(message) => write!(f, "invalid persisted student data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db first"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StudentValidationError> for RepoError {
    fn from(value: StudentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for student records.
pub trait StudentRepository {
    /// Stores a draft and returns it with the assigned id.
    fn insert(&self, student: &NewStudent) -> RepoResult<Student>;
    fn find_all(&self) -> RepoResult<Vec<Student>>;
    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Exact-match lookup; no case folding.
    fn exists_by_email(&self, email: &str) -> RepoResult<bool>;
    fn exists_by_id(&self, id: StudentId) -> RepoResult<bool>;
    /// Removes the row if present. Missing ids are not an error.
    fn delete_by_id(&self, id: StudentId) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema is
    ///   not the one this binary writes.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn insert(&self, student: &NewStudent) -> RepoResult<Student> {
        student.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO students (name, email, gender) VALUES (?1, ?2, ?3);",
            params![
                student.name.as_str(),
                student.email.as_str(),
                student.gender.as_str()
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_email_unique_violation(&err) => {
                return Err(RepoError::DuplicateEmail(student.email.clone()));
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        Ok(Student::from_new(id, student.clone()))
    }

    fn find_all(&self) -> RepoResult<Vec<Student>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }
        Ok(students)
    }

    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_student_row(row)?)),
            None => Ok(None),
        }
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM students WHERE email = ?1);",
            [email],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    fn exists_by_id(&self, id: StudentId) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM students WHERE id = ?1;", [id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn delete_by_id(&self, id: StudentId) -> RepoResult<()> {
        self.conn.execute("DELETE FROM students WHERE id = ?1;", [id])?;
        Ok(())
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    if actual_version > expected_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: actual_version,
            latest_supported: expected_version,
        }
        .into());
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [STUDENTS_TABLE],
        |row| row.get(0),
    )?;
    if table_exists == 0 {
        return Err(RepoError::MissingRequiredTable(STUDENTS_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let present = stmt
        .query_map([STUDENTS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(column) = STUDENT_COLUMNS
        .iter()
        .copied()
        .find(|column| !present.iter().any(|name| name.as_str() == *column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: STUDENTS_TABLE,
            column,
        });
    }

    Ok(())
}

fn is_email_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message.contains("students.email")
        }
        _ => false,
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let gender_text: String = row.get("gender")?;
    let gender = gender_from_db(&gender_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid gender `{gender_text}` in students.gender"
        ))
    })?;

    let student = Student {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        gender,
    };
    student.validate()?;
    Ok(student)
}

fn gender_from_db(value: &str) -> Option<Gender> {
    match value {
        "MALE" => Some(Gender::Male),
        "FEMALE" => Some(Gender::Female),
        "OTHER" => Some(Gender::Other),
        _ => None,
    }
}
