pub mod error;
pub mod mw_ctx;
