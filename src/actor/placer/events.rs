pub mod config;
pub mod window;
