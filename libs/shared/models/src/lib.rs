pub mod auth;
pub mod chat;
pub mod doctor;
pub mod error;
pub mod identifier;
pub mod triage;

pub use identifier::Identifier;
