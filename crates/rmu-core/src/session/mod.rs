//! Durable upload session state: the aggregate, its side-file store, and
//! resume validation.

mod store;
mod types;
mod validate;

pub use store::{SessionError, SessionStore};
pub use types::{Part, PartStatus, Session, Target, TransitionError};
pub use validate::{validate_for_resume, MismatchError};
