use std::io;
use std::result;
use std::sync::PoisonError;

use serenity::prelude::SerenityError;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Clone, Eq, PartialEq, ThisError)]
pub enum ErrorKind {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    RoleNotEligible(String),
    #[error("{0}")]
    AlreadyEnded(String),
    #[error("{0}")]
    NoParticipants(String),
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    SerenityError(String),
    #[error("{0}")]
    Lock(String),
}

#[derive(Debug, Clone, Eq, PartialEq, ThisError)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind }
    }
}

impl From<SerenityError> for Error {
    fn from(err: SerenityError) -> Error {
        let description = err.to_string();
        Error::from(ErrorKind::SerenityError(description))
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Error {
        let description = "The giveaway lock was poisoned by a panicked task.".to_string();
        Error::from(ErrorKind::Lock(description))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        let description = format!("Can't (de)serialize the giveaways state: {}", err);
        Error::from(ErrorKind::Storage(description))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        let description = format!("Can't access the giveaways state file: {}", err);
        Error::from(ErrorKind::Storage(description))
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::thread;

    use crate::error::{Error, ErrorKind};

    #[test]
    fn test_error_displays_the_kind_message() {
        let error = Error::from(ErrorKind::NotFound("The giveaway was not found.".to_string()));

        assert_eq!(error.to_string(), "The giveaway was not found.");
        assert_eq!(
            error.kind(),
            &ErrorKind::NotFound("The giveaway was not found.".to_string())
        );
    }

    #[test]
    fn test_io_error_is_converted_into_storage_error() {
        let error = Error::from(io::Error::new(io::ErrorKind::NotFound, "missing"));

        assert_eq!(
            error,
            Error::from(ErrorKind::Storage(
                "Can't access the giveaways state file: missing".to_string()
            ))
        );
    }

    #[test]
    fn test_poisoned_lock_is_converted_into_lock_error() {
        let lock = Arc::new(Mutex::new(0));
        let cloned_lock = lock.clone();
        let _ = thread::spawn(move || {
            let _guard = cloned_lock.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let error = Error::from(lock.lock().unwrap_err());
        assert_eq!(
            error.kind(),
            &ErrorKind::Lock("The giveaway lock was poisoned by a panicked task.".to_string())
        );
    }
}
