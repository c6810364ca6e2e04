pub mod builtin_providers;
pub mod capability;
pub mod chain;
pub mod config;
pub mod errors;
pub mod formatter;
pub mod local;
pub mod poller;
pub mod providers;
pub mod request;
pub mod router;
