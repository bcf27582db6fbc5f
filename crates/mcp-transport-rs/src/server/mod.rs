pub mod byte;
pub mod streamable;
pub mod traits;

pub use byte::ByteTransport;
pub use streamable::{Inbound, StreamableHttpHandle, StreamableHttpTransport};
pub use traits::ServerTransport;
