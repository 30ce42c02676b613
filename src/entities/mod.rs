pub mod content_item;
pub mod exchange_event;
pub mod participant;
pub mod reciprocal_obligation;
pub mod report;
pub mod task;
pub mod watch_record;
