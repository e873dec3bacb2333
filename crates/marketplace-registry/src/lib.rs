pub mod config;
pub mod error;
pub mod handlers;
pub mod run;
pub mod sig_down;
pub mod wire;
