//! Network capabilities consumed by the collection engine
//!
//! Both capabilities are traits so the engine can be driven end-to-end
//! against in-memory fakes:
//! - [`Transport`]: send one HTTP request with the run's proxy and cookies,
//!   get bytes back
//! - [`BoundaryResolver`]: turn an area name into a boundary box, and list
//!   named sub-regions for subdivision mode

mod resolver;
mod transport;

pub use resolver::{BoundaryResolver, NominatimResolver, ResolveError};
pub use transport::{ApiRequest, HttpTransport, Transport, TransportError};
