//! Service layer
//!
//! Business logic between the HTTP handlers and the data/storage
//! layers.

mod account;
mod video;

pub use account::{
    AccountService, RegistrationInput, TokenPair, validate_email, validate_password,
};
pub use video::VideoService;
