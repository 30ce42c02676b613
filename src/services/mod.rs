pub mod content_service;
pub mod ledger_service;
pub mod matching_service;
pub mod notification_service;
pub mod obligation_service;
pub mod participant_service;
pub mod quality_service;
pub mod report_service;
pub mod strike_service;
pub mod task_service;
