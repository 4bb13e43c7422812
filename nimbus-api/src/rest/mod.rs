mod handlers;
mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::{ApiDoc, create_router};
