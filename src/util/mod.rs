//! Utility functions for common operations.
//!
//! - **URL validation**: base URL checks for the REST client and a guard for
//!   links handed to the system browser
//! - **Text processing**: Unicode-aware truncation, terminal-safe text and
//!   HTML entity decoding for rendered titles
//!
//! # Examples
//!
//! ```
//! use pressroom::util::{decode_entities, truncate_to_width, validate_base_url};
//!
//! let url = validate_base_url("http://localhost/wp").unwrap();
//! assert_eq!(url.host_str(), Some("localhost"));
//!
//! assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
//! assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
//! ```

mod text;
mod url_validator;

pub use text::{decode_entities, display_width, single_line, strip_control_chars, truncate_to_width};
pub use url_validator::{is_local_host, validate_base_url, validate_url_for_open, UrlValidationError};
