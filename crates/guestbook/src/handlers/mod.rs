pub mod error;
pub mod guests;
pub mod health;
pub mod response;

pub use error::AppError;
