pub mod access_gatekeeper;
pub mod messaging;
pub mod repositories;
