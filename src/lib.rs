pub mod app;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod journal;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod ui;
pub mod wall;

pub use app::router;
pub use config::Config;
pub use state::AppState;
