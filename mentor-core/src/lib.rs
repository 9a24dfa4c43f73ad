//! Client-side core of the mentor tutoring client.
//!
//! Holds everything that is not presentation: the persisted user identity,
//! the typed HTTP client for the tutoring backend, and the state machines for
//! the conversation, chunk settings, and document uploads. The terminal UI in
//! the `mentor` crate drives these; tests drive them through a scripted
//! [`client::TutorBackend`].

pub mod client;
pub mod conversation;
pub mod db;
pub mod error;
pub mod identity;
pub mod notify;
pub mod schema;
pub mod settings;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;
