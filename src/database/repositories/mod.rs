pub mod content_item_repo;
pub mod obligation_repo;
pub mod participant_repo;
pub mod report_repo;
pub mod task_repo;
pub mod watch_record_repo;
