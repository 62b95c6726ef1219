pub mod config;
pub mod error;
pub mod http;
pub mod router;
pub mod server;
pub mod site;

pub use config::ServerConfig;
pub use error::{ConnectionError, ParseError, ServerError};
pub use http::{Method, Request, Response, StatusCode};
pub use router::{Handler, Router};
pub use server::Server;
