//! Session state for in-progress USSD dialogs.

pub mod model;
pub mod store;

pub use model::{RegistrationDraft, Session, SessionStatus};
pub use store::{InMemorySessionStore, SessionStore, spawn_expiry_task};
