pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod global;
pub mod identity;
pub mod model;
pub mod pipeline;
pub mod quota;
pub mod session;
pub mod sop;
