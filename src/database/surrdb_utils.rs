use surrealdb::engine::any::Any;
use surrealdb::method::Query;
use surrealdb::sql::{Id, Thing};
use surrealdb::Response;
use tracing::debug;

use crate::middleware::error::{AppError, AppResult};

pub const THROW_ITEM_UNAVAILABLE: &str = "ITEM_UNAVAILABLE";
pub const THROW_TASK_ALREADY_ACTIVE: &str = "TASK_ALREADY_ACTIVE";
pub const THROW_TASK_ALREADY_PROCESSED: &str = "TASK_ALREADY_PROCESSED";
pub const THROW_TASK_ALREADY_RATED: &str = "TASK_ALREADY_RATED";

const MAX_TRANSACTION_ATTEMPTS: u32 = 5;
const RETRYABLE_MARKER: &str = "can be retried";

/// Key part of a record id without the escaping `to_raw` adds.
pub fn record_key(thing: &Thing) -> String {
    match &thing.id {
        Id::String(key) => key.clone(),
        other => other.to_raw(),
    }
}

fn thrown_error(message: &str) -> Option<AppError> {
    if message.contains(THROW_ITEM_UNAVAILABLE) {
        Some(AppError::ItemUnavailable)
    } else if message.contains(THROW_TASK_ALREADY_ACTIVE) {
        Some(AppError::TaskAlreadyActive)
    } else if message.contains(THROW_TASK_ALREADY_PROCESSED) {
        Some(AppError::TaskAlreadyProcessed)
    } else if message.contains(THROW_TASK_ALREADY_RATED) {
        Some(AppError::TaskAlreadyRated)
    } else {
        None
    }
}

/// Folds statement errors of a transaction into one error. A THROW marker
/// wins over the generic "transaction cancelled" errors of other statements.
pub fn check_transaction_custom_error(res: &mut Response) -> AppResult<()> {
    let errors = res.take_errors();
    let mut first: Option<AppError> = None;
    for (_, err) in errors {
        let message = err.to_string();
        if let Some(thrown) = thrown_error(&message) {
            return Err(thrown);
        }
        if first.is_none() {
            first = Some(AppError::SurrealDb { source: message });
        }
    }
    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn is_retryable(err: &AppError) -> bool {
    match err {
        AppError::SurrealDb { source } => source.contains(RETRYABLE_MARKER),
        _ => false,
    }
}

/// Runs a composed transaction, rebuilding and resending it while the store
/// reports a read/write conflict.
pub async fn run_transaction<'a, F>(build: F) -> AppResult<Response>
where
    F: Fn() -> Query<'a, Any>,
{
    let mut attempt = 1;
    loop {
        let result = match build().await {
            Ok(mut res) => check_transaction_custom_error(&mut res).map(|_| res),
            Err(err) => Err(AppError::from(err)),
        };
        match result {
            Err(err) if attempt < MAX_TRANSACTION_ATTEMPTS && is_retryable(&err) => {
                debug!("transaction conflict, attempt {attempt}: {err:?}");
                attempt += 1;
            }
            other => return other,
        }
    }
}
