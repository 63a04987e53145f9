use std::result;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::Request;
use thiserror::Error;

use crate::store::{Entity, Id};

pub type Result<T> = result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Input is missing a required field or cannot be parsed.
    #[error("{0}")]
    Validation(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i32 },
    /// A write would break a constraint of the store.
    #[error("{0}")]
    Integrity(String),
    /// A show points at a venue or artist that no longer exists.
    #[error("show {show} references {kind} {id}, which does not exist")]
    DanglingReference {
        show: i32,
        kind: &'static str,
        id: i32,
    },
    #[error("database error: {0}")]
    Database(DieselError),
}

impl Error {
    pub fn not_found<T: Entity>(id: Id<T>) -> Self {
        Error::NotFound {
            kind: T::KIND,
            id: id.get(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Error::Validation(format!("{} is required", field))
    }

    pub fn status(&self) -> Status {
        match self {
            Error::Validation(_) => Status::UnprocessableEntity,
            Error::NotFound { .. } => Status::NotFound,
            Error::Integrity(_) => Status::Conflict,
            Error::DanglingReference { .. } | Error::Database(_) => Status::InternalServerError,
        }
    }
}

impl From<DieselError> for Error {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::UniqueViolation,
                info,
            ) => Error::Integrity(info.message().to_string()),
            other => Error::Database(other),
        }
    }
}

/// Logs the error once and hands the status over to the registered catchers.
impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            log::error!("{} {}: {}", request.method(), request.uri(), self);
        } else {
            log::warn!("{} {}: {}", request.method(), request.uri(), self);
        }

        Err(status)
    }
}
