//! Transaction orchestration
//!
//! Owns the per-connection lifecycle: buffer the request body, build the
//! origin-request event, dispatch the handler, and write its response back.
//! A failed invocation emits one server-level error event and terminates
//! the connection without an application response.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::event::OriginRequestEvent;
use crate::handler::{EdgeHandler, HandlerError};
use crate::invocation::{self, InvocationError};
use crate::request_id::RequestId;
use crate::response;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Concrete transaction error.
///
/// `serve_connection` only requires `Into<Box<dyn Error + Send + Sync>>`,
/// but naming the service error as the bare boxed trait object trips a
/// higher-ranked-lifetime inference limitation in the compiler. Wrapping it
/// in a concrete type gives the service a non-higher-ranked error and keeps
/// the boxed payload — and the connection-terminating behavior — unchanged.
#[derive(Debug)]
struct TransactError(BoxError);

impl std::fmt::Display for TransactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for TransactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

impl From<hyper::Error> for TransactError {
    fn from(err: hyper::Error) -> Self {
        TransactError(Box::new(err))
    }
}

/// The origin-request emulation service.
pub struct EdgeService {
    handler: Arc<EdgeHandler>,
    errors: mpsc::UnboundedSender<InvocationError>,
}

impl EdgeService {
    /// Build a service around an injected handler.
    ///
    /// The handler's declared signature is validated here, before any
    /// socket is bound. The returned receiver yields one error event per
    /// failed transaction.
    pub fn new(
        handler: EdgeHandler,
    ) -> Result<(Self, mpsc::UnboundedReceiver<InvocationError>), HandlerError> {
        handler.validate()?;

        let (errors, error_events) = mpsc::unbounded_channel();

        Ok((
            Self {
                handler: Arc::new(handler),
                errors,
            },
            error_events,
        ))
    }

    /// Accept connections until the listener fails.
    ///
    /// Transactions run independently and may complete out of arrival
    /// order; the only shared state is the read-only handler.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let service = Arc::new(self);

        loop {
            let (stream, remote) = listener.accept().await?;
            let service = service.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let connection = http1::Builder::new().serve_connection(
                    io,
                    service_fn(move |request: Request<Incoming>| {
                        let service = service.clone();
                        async move { service.transact(request, remote).await }
                    }),
                );

                if let Err(err) = connection.await {
                    debug!(error = %err, "connection closed");
                }
            });
        }
    }

    /// One pass through the transaction lifecycle: receive, build, invoke,
    /// write. No transition runs backwards.
    async fn transact(
        &self,
        request: Request<Incoming>,
        remote: SocketAddr,
    ) -> Result<Response<Full<Bytes>>, TransactError> {
        let request_id = RequestId::new();
        let (parts, body) = request.into_parts();

        info!(
            id = %request_id,
            method = %parts.method,
            uri = %parts.uri,
            "origin-request"
        );

        // Transport failure: the handler never ran, so no error event.
        let buffered = body.collect().await?.to_bytes();

        let event = OriginRequestEvent::new(
            &parts.method,
            &parts.uri,
            &parts.headers,
            &buffered,
            Some(remote.ip()),
        );

        let edge_response = match invocation::invoke(&self.handler, event).await {
            Ok(edge_response) => edge_response,
            Err(err) => return Err(self.raise(err)),
        };

        match response::write(edge_response) {
            Ok(written) => Ok(written),
            Err(err) => {
                debug!(id = %request_id, error = %err, "response write failed");
                Err(self.raise(InvocationError::MalformedHandler))
            }
        }
    }

    /// Emit the server-level error event and fail the transaction.
    fn raise(&self, err: InvocationError) -> TransactError {
        error!(error = %err, "handler invocation failed");
        let _ = self.errors.send(err.clone());
        TransactError(Box::new(err))
    }
}
