use derive_more::derive::Display;
use diesel::result::Error;
use log::error;

use crate::models::PuzzleId;
use crate::Ext;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum EngineError {
    #[display("Unknown team")]
    UnknownTeam,

    #[display("Unknown puzzle")]
    UnknownPuzzle,

    #[display("Unknown hint")]
    UnknownHint,

    /// Stored progress references a puzzle missing from the catalog. This is
    /// a data inconsistency, surfaced to the caller as an internal error.
    #[display("Dangling reference to puzzle {puzzle}")]
    DanglingReference { puzzle: PuzzleId },

    #[display("Server error at {location}, ref[{refnum}]: {msg}")]
    ServerError {
        location: &'static str,
        msg: &'static str,
        refnum: uuid::Uuid,
    },
}

impl EngineError {
    pub fn set_location(self, location: &'static str) -> Self {
        match self {
            EngineError::ServerError {
                location: _,
                msg,
                refnum,
            } => EngineError::ServerError {
                location,
                msg,
                refnum,
            },
            _ => self,
        }
    }

    pub fn log(&self) {
        if let EngineError::ServerError {
            location,
            msg,
            refnum,
        } = self
        {
            error!("Server error at {location}, ref[{refnum}]: {msg}");
        }
    }
}

impl From<Error> for EngineError {
    fn from(e: Error) -> Self {
        new_unlocated_server_error(e, ERROR_DB_UNKNOWN)
    }
}

pub fn log_server_error<E>(error: E, location: &'static str, msg: &'static str) -> EngineError
where
    E: derive_more::Display,
{
    new_unlocated_server_error(error, msg)
        .set_location(location)
        .tap(EngineError::log)
}

pub fn new_unlocated_server_error<E>(error: E, msg: &'static str) -> EngineError
where
    E: derive_more::Display,
{
    let refnum = uuid::Uuid::new_v4();
    error!("Error [{refnum}]: {error}");
    EngineError::ServerError {
        location: LOCATION_UNKNOWN,
        msg,
        refnum,
    }
}

pub static ERROR_DB_CONNECTION: &str = "db_connection_failed";
pub static ERROR_DB_UNKNOWN: &str = "database_unknown";

pub static LOCATION_UNKNOWN: &str = "[unknown]";
