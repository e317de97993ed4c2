//! Stevie — request argument binding for serverless route handlers.
//!
//! Handlers declare the request values they want as named parameters. The
//! first parameter is always the response capability; the rest are looked up
//! by name in the merged body and query payload and passed positionally.

pub mod binder;
pub mod error;
pub mod handler;
pub mod payload;
pub mod response;
pub mod signature;

pub use binder::{bind_arguments, BoundArg};
pub use error::{StevieError, StevieResult};
pub use futures::future::BoxFuture;
pub use handler::RouteHandler;
pub use payload::{merge_query, parse_json_payload, payload_from_value, Payload};
pub use response::{build_response, ApiResponse, HandlerResult, Responder};
pub use signature::{parse_parameter_names, HandlerSignature};
