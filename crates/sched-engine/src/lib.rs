pub mod error;
pub mod service;

pub use error::ServiceError;
pub use service::{Completion, TaskService, DEFAULT_LIST_LIMIT};
