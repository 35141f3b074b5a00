//! Shared types for the focusbridge workspace.
//!
//! Everything a caller can observe from the bridge lives here: the connection
//! snapshot, the outcome envelope returned by every script invocation, the
//! classified error information it carries, and the list-page payload shape.

mod outcome;
mod page;
mod status;

pub use outcome::{ErrorInfo, ErrorKind, ScriptOutcome, codes};
pub use page::{ListPage, Pagination};
pub use status::{ConnectionStatus, MonitorPhase};
