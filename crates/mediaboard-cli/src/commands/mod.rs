pub mod add;
pub mod clear;
pub mod config;
pub mod daemon;
pub mod search;
pub mod sync;
pub mod sync_ui;
