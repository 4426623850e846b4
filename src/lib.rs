pub mod converter;
pub mod curl;
pub mod har;
pub mod http2;
pub mod shell;

pub use converter::{parse_curl_command, ParseError};
pub use har::Har;
