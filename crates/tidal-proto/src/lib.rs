pub mod config;
pub mod context;
pub mod menu;
pub mod payload;
pub mod platform;
pub mod session;
