//! Text and link helpers for the terminal surface.
//!
//! ```
//! use feedview::util::{display_width, truncate_to_width, wrap_to_width};
//!
//! assert_eq!(display_width("Hello 世界"), 10);
//! assert_eq!(truncate_to_width("Long entry title", 10), "Long en...");
//! assert_eq!(wrap_to_width("two words", 4), vec!["two", "word", "s"]);
//! ```

mod text;
mod url_validator;

pub use text::{display_width, strip_control_chars, strip_markup, truncate_to_width, wrap_to_width};
pub use url_validator::{validate_link, UrlValidationError};
