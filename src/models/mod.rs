// Data models for the Hydra API wire formats

pub mod request;
pub mod response;
pub mod search;

pub use request::{RequestDescriptor, RequestOptions};
pub use response::ResponseEnvelope;
pub use search::{Platform, SearchPage};
