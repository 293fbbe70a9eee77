//! IMAP protocol parser.
//!
//! A sans-I/O parser for the server responses this engine consumes.
//!
//! - **Lexer**: tokenizes raw bytes (atoms, strings, literals, numbers)
//! - **Response Parser**: builds typed [`Response`] values from tokens
//!
//! # Example
//!
//! ```
//! use mailflow_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* MYRIGHTS INBOX lrswia\r\n").unwrap();
//!
//! match response {
//!     Response::Untagged(UntaggedResponse::MyRights { mailbox, rights }) => {
//!         assert_eq!(mailbox.as_str(), "INBOX");
//!         assert_eq!(rights.to_string(), "lrswia");
//!     }
//!     _ => panic!("Expected MYRIGHTS"),
//! }
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{Response, ResponseKind, ResponseParser, UntaggedResponse};
