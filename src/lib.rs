pub mod app;
pub mod config;
pub mod fleet;
pub mod layout;
pub mod scene;
