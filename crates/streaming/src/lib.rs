pub mod http;
pub mod protocol;
pub mod request;
pub mod source;

pub use http::*;
pub use protocol::*;
pub use request::*;
pub use source::*;
