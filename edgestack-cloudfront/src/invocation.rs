//! Handler invocation
//!
//! Drives a registered handler in its own calling convention and funnels
//! both conventions through a single completion path, so callback-style and
//! future-style handlers produce identical effects. Every failure mode
//! collapses into one fatal signal; there is no per-request error page.

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

use crate::event::OriginRequestEvent;
use crate::handler::{Completion, EdgeHandler, HandlerFault, HandlerFn};
use crate::response::EdgeResponse;

#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    /// The handler threw, rejected, or broke the completion contract.
    #[error("Malformed handler method. Exiting..")]
    MalformedHandler,
}

/// Invoke the handler with a freshly built event and wait for its response.
///
/// A handler that never completes leaves the caller pending; there is no
/// timeout.
pub async fn invoke(
    handler: &EdgeHandler,
    event: OriginRequestEvent,
) -> Result<EdgeResponse, InvocationError> {
    let (tx, rx) = oneshot::channel::<Result<Option<EdgeResponse>, HandlerFault>>();

    // The single completion path shared by both conventions.
    let complete: Completion = Box::new(move |fault, response| {
        let outcome = match fault {
            Some(fault) => Err(fault),
            None => Ok(response),
        };
        let _ = tx.send(outcome);
    });

    match handler.func() {
        HandlerFn::Future(func) => match func(event).await {
            Ok(response) => complete(None, Some(response)),
            Err(fault) => complete(Some(fault), None),
        },
        HandlerFn::Callback(func) => {
            func(event, None, complete).map_err(|fault| {
                debug!(error = %fault, "handler raised before completion");
                InvocationError::MalformedHandler
            })?;
        }
    }

    match rx.await {
        Ok(Ok(Some(response))) => Ok(response),
        Ok(Ok(None)) => {
            debug!("handler completed without a response");
            Err(InvocationError::MalformedHandler)
        }
        Ok(Err(fault)) => {
            debug!(error = %fault, "handler completed with an error");
            Err(InvocationError::MalformedHandler)
        }
        // Completion callback dropped without being called.
        Err(_) => Err(InvocationError::MalformedHandler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{EdgeHeaders, HeaderEntry};
    use http::{HeaderMap, Method, Uri};

    fn event() -> OriginRequestEvent {
        OriginRequestEvent::new(
            &Method::GET,
            &"/".parse::<Uri>().unwrap(),
            &HeaderMap::new(),
            b"",
            None,
        )
    }

    fn success_response() -> EdgeResponse {
        let mut headers = EdgeHeaders::new();
        headers.insert(
            "content-type".to_string(),
            vec![HeaderEntry::new("Content-Type", "text/html")],
        );

        EdgeResponse {
            status: Some("200".to_string()),
            status_description: Some("OK".to_string()),
            headers: Some(headers),
            body: Some("Success".to_string()),
            ..EdgeResponse::default()
        }
    }

    #[tokio::test]
    async fn test_future_handler_resolves() {
        let handler = EdgeHandler::future(|_event| async { Ok(success_response()) });

        let response = invoke(&handler, event()).await.unwrap();

        assert_eq!(response, success_response());
    }

    #[tokio::test]
    async fn test_callback_handler_completes() {
        let handler = EdgeHandler::callback(|_event, context, complete| {
            assert!(context.is_none());
            complete(None, Some(success_response()));
            Ok(())
        });

        let response = invoke(&handler, event()).await.unwrap();

        assert_eq!(response, success_response());
    }

    #[tokio::test]
    async fn test_dispatch_equivalence() {
        let future = EdgeHandler::future(|_event| async { Ok(success_response()) });
        let callback = EdgeHandler::callback(|_event, _context, complete| {
            complete(None, Some(success_response()));
            Ok(())
        });

        let from_future = invoke(&future, event()).await.unwrap();
        let from_callback = invoke(&callback, event()).await.unwrap();

        assert_eq!(from_future, from_callback);
    }

    #[tokio::test]
    async fn test_callback_error_is_malformed() {
        let handler =
            EdgeHandler::callback(|_event, _context, _complete| Err("boom".into()));

        let err = invoke(&handler, event()).await.unwrap_err();

        assert_eq!(err.to_string(), "Malformed handler method. Exiting..");
    }

    #[tokio::test]
    async fn test_future_rejection_is_malformed() {
        let handler = EdgeHandler::future(|_event| async { Err("boom".into()) });

        let err = invoke(&handler, event()).await.unwrap_err();

        assert!(matches!(err, InvocationError::MalformedHandler));
    }

    #[tokio::test]
    async fn test_completion_with_error_slot_is_malformed() {
        let handler = EdgeHandler::callback(|_event, _context, complete| {
            complete(Some("boom".into()), None);
            Ok(())
        });

        let err = invoke(&handler, event()).await.unwrap_err();

        assert!(matches!(err, InvocationError::MalformedHandler));
    }

    #[tokio::test]
    async fn test_completion_without_response_is_malformed() {
        let handler = EdgeHandler::callback(|_event, _context, complete| {
            complete(None, None);
            Ok(())
        });

        let err = invoke(&handler, event()).await.unwrap_err();

        assert!(matches!(err, InvocationError::MalformedHandler));
    }

    #[tokio::test]
    async fn test_discarded_completion_is_malformed() {
        let handler = EdgeHandler::callback(|_event, _context, complete| {
            drop(complete);
            Ok(())
        });

        let err = invoke(&handler, event()).await.unwrap_err();

        assert!(matches!(err, InvocationError::MalformedHandler));
    }

    #[tokio::test]
    async fn test_event_consumed_once_per_invocation() {
        let handler = EdgeHandler::future(|event: OriginRequestEvent| async move {
            Ok(EdgeResponse {
                body: Some(event.request().uri.clone()),
                ..EdgeResponse::default()
            })
        });

        let response = invoke(&handler, event()).await.unwrap();

        assert_eq!(response.body.as_deref(), Some("/"));
    }
}
