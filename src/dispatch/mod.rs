//! Request dispatch
//!
//! Routes outbound HTTP requests through proxies pulled from the pool and
//! feeds failures back into it.

pub mod dispatcher;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use transport::{HttpProxyTransport, Transport};
