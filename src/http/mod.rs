//! HTTP building blocks: request target, response wrapper, transport seam

mod request;
mod response;
mod transport;

pub use request::Request;
pub use response::Response;
pub use transport::{ReqwestTransport, Transport};
