pub mod config;
pub mod error;
pub mod handlers;
pub mod poller;
pub mod replay_cache;
pub mod run;
pub mod service;
pub mod sig_down;
pub mod wire;
