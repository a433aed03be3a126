//! Business logic services for the token gate

mod user;

pub use user::{ServiceError, UserService};
