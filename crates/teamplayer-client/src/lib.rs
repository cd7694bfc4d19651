pub mod api;
pub mod app_state;
pub mod command;
pub mod core;
pub mod dispatch;
pub mod effect;
pub mod notify;
pub mod queue;
pub mod song;
pub mod stations;
pub mod view;
