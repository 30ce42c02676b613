pub mod content_item_ifce;
pub mod obligation_ifce;
pub mod participant_ifce;
pub mod report_ifce;
pub mod task_ifce;
pub mod watch_record_ifce;
