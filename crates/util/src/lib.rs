//! Helpers shared across the focusbridge crates.

pub mod canonical_json;
pub mod path_processing;
pub mod script_text;

pub use canonical_json::to_canonical_string;
pub use path_processing::expand_tilde;
pub use script_text::{inject_parameters, quote_string_literal, shell_single_quote, unresolved_placeholders};
