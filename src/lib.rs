//! Core of a small feedback-collection service.
//!
//! Two pieces live here:
//!
//! - [`store`]: the [`SubmissionStore`] trait and its backends. The default
//!   [`JsonFileStore`] keeps the whole collection in one JSON file and performs
//!   a serialized read-modify-write for every mutation.
//! - [`auth`]: the [`AuthGate`] that checks HTTP Basic credentials against the
//!   configured admin pair before administrative operations run.
//!
//! The HTTP server, configuration loading and the admin client live in the
//! `feedback-cli` crate.
//!
//! # Examples
//! ```
//! use feedback_lib::{Credentials, Decision, AuthGate};
//!
//! let gate = AuthGate::new(Credentials::new("admin", "secret"));
//! let header = Credentials::new("admin", "secret").to_basic_header();
//! assert_eq!(gate.authorize_header(Some(&header)), Decision::Allow);
//! assert_eq!(gate.authorize_header(None), Decision::Deny);
//! ```

pub mod auth;
pub mod error;
pub mod store;
pub mod submission;

pub use auth::{AuthGate, Credentials, Decision};
pub use error::StoreError;
pub use store::{JsonFileStore, MemoryStore, SledStore, SubmissionStore};
pub use submission::{Fields, Submission};
