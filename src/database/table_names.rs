pub use crate::entities::content_item::TABLE_NAME as CONTENT_ITEM_TABLE_NAME;
pub use crate::entities::participant::TABLE_NAME as PARTICIPANT_TABLE_NAME;
pub use crate::entities::reciprocal_obligation::TABLE_NAME as OBLIGATION_TABLE_NAME;
pub use crate::entities::task::TABLE_NAME as TASK_TABLE_NAME;
pub use crate::entities::watch_record::TABLE_NAME as WATCH_RECORD_TABLE_NAME;
