//! CloudFront Lambda@Edge emulation for EdgeStack
//!
//! Runs a Lambda@Edge origin-request handler behind a plain HTTP listener:
//! each transaction is translated into the platform's event shape,
//! dispatched to the registered handler in its own calling convention, and
//! the normalized response is written back onto the connection.

pub mod body;
pub mod event;
pub mod handler;
pub mod headers;
pub mod invocation;
pub mod request_id;
pub mod response;
pub mod service;

pub use event::{EdgeRequest, OriginRequestEvent};
pub use handler::{EdgeContext, EdgeHandler, HandlerError, HandlerFault, HandlerKind};
pub use headers::{EdgeHeaders, HeaderEntry};
pub use invocation::InvocationError;
pub use response::EdgeResponse;
pub use service::EdgeService;
