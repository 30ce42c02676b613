use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    Generic { description: String },
    EntityFailIdNotFound { ident: String },
    Forbidden,
    Validation { description: String },
    InvalidRating { value: u8 },
    ItemLimitReached { limit: usize },
    ItemUnavailable,
    TaskAlreadyActive,
    TaskAlreadyProcessed,
    TaskAlreadyRated,
    SurrealDb { source: String },
}

/// Any error that leaves the engine. Business outcomes (denials, duplicates) are
/// returned as values instead.
pub type AppResult<T> = core::result::Result<T, AppError>;

impl std::error::Error for AppError {}

const INTERNAL: &str = "Internal error";

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic { description } => write!(f, "{description}"),
            Self::EntityFailIdNotFound { ident } => write!(f, "Record id= {ident} not found"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::Validation { description } => write!(f, "Invalid input - {description}"),
            Self::InvalidRating { value } => write!(f, "Rating {value} is not 0 or 1"),
            Self::ItemLimitReached { limit } => {
                write!(f, "You have reached the max of {limit} items")
            }
            Self::ItemUnavailable => write!(f, "Content item is no longer available"),
            Self::TaskAlreadyActive => write!(f, "Participant already has an active task"),
            Self::TaskAlreadyProcessed => write!(f, "Task was already processed"),
            Self::TaskAlreadyRated => write!(f, "Task was already rated"),
            Self::SurrealDb { .. } => write!(f, "{INTERNAL}"),
        }
    }
}

impl From<surrealdb::Error> for AppError {
    fn from(value: surrealdb::Error) -> Self {
        Self::SurrealDb {
            source: value.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(value: validator::ValidationErrors) -> Self {
        Self::Validation {
            description: value.to_string(),
        }
    }
}

pub fn not_found<T>(opt: Option<T>, ident: &str) -> AppResult<T> {
    opt.ok_or(AppError::EntityFailIdNotFound {
        ident: ident.to_string(),
    })
}
