// Interview sessions: question/evaluation gateway, state machine, timers.

pub mod controller;
pub mod fallback;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod reducer;
pub mod store;
pub mod timer;
