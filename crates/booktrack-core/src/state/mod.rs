//! Local state kept by each screen.
//!
//! Nothing here is persisted. Each type holds the transient copy a screen
//! renders and updates it from the outcome of the last API call.

pub mod auth;
pub mod books;
pub mod profile;

pub use auth::{sign_in, sign_out, sign_up};
pub use books::BookList;
pub use profile::ProfileView;
