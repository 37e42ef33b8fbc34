//! Student registry use-case service.
//!
//! # Responsibility
//! - Reject registrations whose email is already taken.
//! - Reject deletes of ids that are not stored.
//! - Delegate everything else to the repository unchanged.
//!
//! # Invariants
//! - Failed checks perform zero store mutations.
//! - Successful add/delete perform exactly one store mutation.
//!
//! # Concurrency
//! The exists-then-write sequences are not atomic. Two concurrent
//! registrations of one email can both pass `exists_by_email`; the SQLite
//! schema's unique index on `students.email` rejects the second insert, and
//! that rejection is reported as `DuplicateEmail` as well. Repositories
//! without such a constraint do not uphold uniqueness under concurrency.

use crate::model::student::{NewStudent, Student, StudentId};
use crate::repo::student_repo::{RepoError, RepoResult, StudentRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for student registry use-cases.
#[derive(Debug)]
pub enum StudentServiceError {
    /// Email is already registered to another student.
    DuplicateEmail(String),
    /// No student is stored under this id.
    StudentNotFound(StudentId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl StudentServiceError {
    /// Stable error category for front ends.
    ///
    /// - `bad_request`: caller input conflicts with stored data.
    /// - `not_found`: the addressed student does not exist.
    /// - `store_failure`: anything raised below the service.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateEmail(_) => "bad_request",
            Self::StudentNotFound(_) => "not_found",
            Self::Repo(_) => "store_failure",
        }
    }
}

impl Display for StudentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail(email) => write!(f, "Email {email} taken"),
            Self::StudentNotFound(id) => write!(f, "Student with id {id} does not exists"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StudentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StudentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            other => Self::Repo(other),
        }
    }
}

/// Registry service over a student repository.
pub struct StudentService<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> StudentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every stored student.
    pub fn get_all_students(&self) -> RepoResult<Vec<Student>> {
        self.repo.find_all()
    }

    /// Gets one student by id.
    pub fn get_student(&self, id: StudentId) -> Result<Student, StudentServiceError> {
        self.repo
            .find_by_id(id)?
            .ok_or(StudentServiceError::StudentNotFound(id))
    }

    /// Registers a student whose email is not yet taken.
    ///
    /// # Errors
    /// - `DuplicateEmail` when the email is already stored; nothing is
    ///   inserted.
    pub fn add_student(&self, student: &NewStudent) -> Result<Student, StudentServiceError> {
        if self.repo.exists_by_email(&student.email)? {
            warn!("event=student_add module=service status=rejected reason=email_taken");
            return Err(StudentServiceError::DuplicateEmail(student.email.clone()));
        }

        let saved = self.repo.insert(student)?;
        info!(
            "event=student_add module=service status=ok student_id={}",
            saved.id
        );
        Ok(saved)
    }

    /// Deletes a stored student.
    ///
    /// # Errors
    /// - `StudentNotFound` when no row has this id; nothing is deleted.
    pub fn delete_student(&self, id: StudentId) -> Result<(), StudentServiceError> {
        if !self.repo.exists_by_id(id)? {
            warn!(
                "event=student_delete module=service status=rejected reason=not_found student_id={id}"
            );
            return Err(StudentServiceError::StudentNotFound(id));
        }

        self.repo.delete_by_id(id)?;
        info!("event=student_delete module=service status=ok student_id={id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{StudentService, StudentServiceError};
    use crate::db::DbError;
    use crate::model::student::{Gender, NewStudent, Student, StudentId};
    use crate::repo::student_repo::{RepoError, RepoResult, StudentRepository};
    use std::cell::RefCell;

    /// Records every call; `exists_by_email` is true only for `taken_email`.
    #[derive(Default)]
    struct MockStudentRepository {
        taken_email: Option<&'static str>,
        id_exists: bool,
        insert_conflict: bool,
        stored: Vec<Student>,
        find_all_calls: RefCell<u32>,
        email_lookups: RefCell<Vec<String>>,
        inserted: RefCell<Vec<NewStudent>>,
        deleted: RefCell<Vec<StudentId>>,
    }

    impl StudentRepository for MockStudentRepository {
        fn insert(&self, student: &NewStudent) -> RepoResult<Student> {
            self.inserted.borrow_mut().push(student.clone());
            if self.insert_conflict {
                return Err(RepoError::DuplicateEmail(student.email.clone()));
            }
            Ok(Student::from_new(1, student.clone()))
        }

        fn find_all(&self) -> RepoResult<Vec<Student>> {
            *self.find_all_calls.borrow_mut() += 1;
            Ok(self.stored.clone())
        }

        fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>> {
            Ok(self.stored.iter().find(|student| student.id == id).cloned())
        }

        fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
            self.email_lookups.borrow_mut().push(email.to_string());
            Ok(self.taken_email == Some(email))
        }

        fn exists_by_id(&self, _id: StudentId) -> RepoResult<bool> {
            Ok(self.id_exists)
        }

        fn delete_by_id(&self, id: StudentId) -> RepoResult<()> {
            self.deleted.borrow_mut().push(id);
            Ok(())
        }
    }

    /// Store whose every call fails at the transport level.
    struct BrokenStudentRepository;

    impl BrokenStudentRepository {
        fn failure<T>() -> RepoResult<T> {
            Err(RepoError::Db(DbError::Sqlite(
                rusqlite::Error::InvalidQuery,
            )))
        }
    }

    impl StudentRepository for BrokenStudentRepository {
        fn insert(&self, _student: &NewStudent) -> RepoResult<Student> {
            Self::failure()
        }
        fn find_all(&self) -> RepoResult<Vec<Student>> {
            Self::failure()
        }
        fn find_by_id(&self, _id: StudentId) -> RepoResult<Option<Student>> {
            Self::failure()
        }
        fn exists_by_email(&self, _email: &str) -> RepoResult<bool> {
            Self::failure()
        }
        fn exists_by_id(&self, _id: StudentId) -> RepoResult<bool> {
            Self::failure()
        }
        fn delete_by_id(&self, _id: StudentId) -> RepoResult<()> {
            Self::failure()
        }
    }

    fn jane() -> NewStudent {
        NewStudent::new("Jane", "jane@gmail.com", Gender::Female).unwrap()
    }

    #[test]
    fn get_all_students_delegates_to_find_all() {
        let stored = vec![Student::from_new(7, jane())];
        let service = StudentService::new(MockStudentRepository {
            stored: stored.clone(),
            ..MockStudentRepository::default()
        });

        assert_eq!(service.get_all_students().unwrap(), stored);
        assert_eq!(*service.repo.find_all_calls.borrow(), 1);
    }

    #[test]
    fn add_student_inserts_given_student_once() {
        let service = StudentService::new(MockStudentRepository::default());
        let student = jane();

        let saved = service.add_student(&student).unwrap();

        let inserted = service.repo.inserted.borrow();
        assert_eq!(inserted.as_slice(), &[student.clone()]);
        assert_eq!(saved, Student::from_new(1, student));
    }

    #[test]
    fn add_student_rejects_taken_email_without_insert() {
        let service = StudentService::new(MockStudentRepository {
            taken_email: Some("jane@gmail.com"),
            ..MockStudentRepository::default()
        });

        let err = service.add_student(&jane()).unwrap_err();

        assert!(matches!(err, StudentServiceError::DuplicateEmail(_)));
        assert!(err.to_string().contains("Email jane@gmail.com taken"));
        assert_eq!(err.code(), "bad_request");
        assert_eq!(
            service.repo.email_lookups.borrow().as_slice(),
            &["jane@gmail.com".to_string()]
        );
        assert!(service.repo.inserted.borrow().is_empty());
    }

    #[test]
    fn add_student_checks_its_own_email_only() {
        let service = StudentService::new(MockStudentRepository {
            taken_email: Some("john@gmail.com"),
            ..MockStudentRepository::default()
        });

        service.add_student(&jane()).unwrap();

        assert_eq!(
            service.repo.email_lookups.borrow().as_slice(),
            &["jane@gmail.com".to_string()]
        );
        assert_eq!(service.repo.inserted.borrow().len(), 1);
    }

    #[test]
    fn add_student_reports_unique_index_conflict_as_duplicate_email() {
        let service = StudentService::new(MockStudentRepository {
            insert_conflict: true,
            ..MockStudentRepository::default()
        });

        let err = service.add_student(&jane()).unwrap_err();
        assert_eq!(err.to_string(), "Email jane@gmail.com taken");
    }

    #[test]
    fn delete_student_deletes_existing_id_once() {
        let service = StudentService::new(MockStudentRepository {
            id_exists: true,
            ..MockStudentRepository::default()
        });

        service.delete_student(10).unwrap();
        assert_eq!(service.repo.deleted.borrow().as_slice(), &[10]);
    }

    #[test]
    fn delete_student_rejects_missing_id_without_delete() {
        let service = StudentService::new(MockStudentRepository::default());

        let err = service.delete_student(10).unwrap_err();

        assert!(matches!(err, StudentServiceError::StudentNotFound(10)));
        assert!(err
            .to_string()
            .contains("Student with id 10 does not exists"));
        assert_eq!(err.code(), "not_found");
        assert!(service.repo.deleted.borrow().is_empty());
    }

    #[test]
    fn get_student_maps_absent_row_to_not_found() {
        let service = StudentService::new(MockStudentRepository::default());
        let err = service.get_student(3).unwrap_err();
        assert!(matches!(err, StudentServiceError::StudentNotFound(3)));
    }

    #[test]
    fn store_failures_propagate_unchanged() {
        let service = StudentService::new(BrokenStudentRepository);

        assert!(matches!(
            service.get_all_students(),
            Err(RepoError::Db(DbError::Sqlite(_)))
        ));

        let add_err = service.add_student(&jane()).unwrap_err();
        assert!(matches!(add_err, StudentServiceError::Repo(RepoError::Db(_))));
        assert_eq!(add_err.code(), "store_failure");
        assert!(std::error::Error::source(&add_err).is_some());

        let delete_err = service.delete_student(1).unwrap_err();
        assert!(matches!(
            delete_err,
            StudentServiceError::Repo(RepoError::Db(_))
        ));
    }
}
