pub mod aggregates;
pub mod auth_handlers;
pub mod bootcamps;
pub mod courses;
pub mod error;
pub mod middleware;
pub mod resources;
pub mod reviews;
pub mod router;
pub mod state;
pub mod users;

pub use error::{ApiError, ApiResult};
pub use router::router;
pub use state::AppState;
