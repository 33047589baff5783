mod handoff;
mod search;
mod session;

pub use handoff::{execute_handoff_with_runner, HandoffError};
pub use search::{SearchRunner, SearchTicket};
pub use session::{Session, SessionError};
