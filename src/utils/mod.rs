pub mod entity_locks;
