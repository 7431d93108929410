// Declare the server submodules
mod error;
mod routes;
mod server;
pub mod types;

// Re-export the pieces needed to build and run the API
pub use error::ApiError;
pub use routes::{validate_text, MIN_TEXT_CHARS};
pub use server::{router, ApiServer, AppState};
