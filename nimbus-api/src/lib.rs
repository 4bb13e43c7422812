pub mod rest;
pub mod services;

pub use rest::{AppState, create_router};
pub use services::{ServiceConfig, Services};
