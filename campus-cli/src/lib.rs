// Library interface for the campus client (used by the binary and tests)
#[macro_use]
pub mod logging;

pub mod api;
pub mod app;
pub mod comments;
pub mod config;
pub mod images;
pub mod likes;
pub mod render;
pub mod storage;
pub mod visitor;
