use crate::cli::{Cli, Command};
use log::info;
use roster_core::db::{open_db, DbError};
use roster_core::{
    init_logging, LoggingError, NewStudent, RepoError, SqliteStudentRepository, Student,
    StudentService, StudentServiceError, StudentValidationError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Failures surfaced by one CLI invocation.
#[derive(Debug)]
pub enum CommandError {
    Input(StudentValidationError),
    Service(StudentServiceError),
    Db(DbError),
    Logging(LoggingError),
    Io(std::io::Error),
    Output(serde_json::Error),
}

impl CommandError {
    /// 2 for rejected input, 3 for unknown ids, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Input(_) => 2,
            Self::Service(StudentServiceError::DuplicateEmail(_)) => 2,
            Self::Service(StudentServiceError::StudentNotFound(_)) => 3,
            Self::Service(StudentServiceError::Repo(_))
            | Self::Db(_)
            | Self::Logging(_)
            | Self::Io(_)
            | Self::Output(_) => 1,
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "database open failed: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to encode output: {err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Input(err) => Some(err),
            Self::Service(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<StudentValidationError> for CommandError {
    fn from(value: StudentValidationError) -> Self {
        Self::Input(value)
    }
}

impl From<StudentServiceError> for CommandError {
    fn from(value: StudentServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepoError> for CommandError {
    fn from(value: RepoError) -> Self {
        Self::Service(value.into())
    }
}

impl From<DbError> for CommandError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<LoggingError> for CommandError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

/// Runs one parsed command against the configured database.
pub fn run_command(cli: &Cli, out: &mut dyn Write) -> Result<(), CommandError> {
    if let Some(log_dir) = &cli.log_dir {
        init_logging(cli.log_level(), &absolute_dir(log_dir)?)?;
    }

    let conn = open_db(cli.db_path())?;
    let service = StudentService::new(SqliteStudentRepository::try_new(&conn)?);
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match &cli.command {
        Command::List => {
            let students = service.get_all_students()?;
            write_students(out, &students, cli.json)
        }
        Command::Add(args) => {
            let draft = NewStudent::new(&args.name, &args.email, args.gender)?;
            let saved = service.add_student(&draft)?;
            write_student(out, &saved, cli.json)
        }
        Command::Show(args) => {
            let student = service.get_student(args.id)?;
            write_student(out, &student, cli.json)
        }
        Command::Delete(args) => {
            service.delete_student(args.id)?;
            if cli.json {
                serde_json::to_writer(&mut *out, &serde_json::json!({ "deleted": args.id }))?;
                writeln!(out)?;
            } else {
                writeln!(out, "Deleted student {}.", args.id)?;
            }
            Ok(())
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::List => "list",
        Command::Add(_) => "add",
        Command::Show(_) => "show",
        Command::Delete(_) => "delete",
    }
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, CommandError> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(dir))
}

fn write_students(
    out: &mut dyn Write,
    students: &[Student],
    json: bool,
) -> Result<(), CommandError> {
    if json {
        serde_json::to_writer_pretty(&mut *out, students)?;
        writeln!(out)?;
        return Ok(());
    }
    if students.is_empty() {
        writeln!(out, "No students.")?;
        return Ok(());
    }
    for student in students {
        write_row(out, student)?;
    }
    Ok(())
}

fn write_student(out: &mut dyn Write, student: &Student, json: bool) -> Result<(), CommandError> {
    if json {
        serde_json::to_writer_pretty(&mut *out, student)?;
        writeln!(out)?;
        return Ok(());
    }
    write_row(out, student)
}

fn write_row(out: &mut dyn Write, student: &Student) -> Result<(), CommandError> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}",
        student.id, student.name, student.email, student.gender
    )?;
    Ok(())
}
