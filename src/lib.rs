pub mod actions;
pub mod chat;
pub mod config;
pub mod fallback;
pub mod knowledge;
pub mod scaffold;
