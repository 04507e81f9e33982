//! Request engine: the single chokepoint for network I/O

pub mod descriptor;
pub mod executor;

pub use descriptor::{
    BodyProducer, ProducedBody, RequestBody, RequestDescriptor, ResponseConsumer,
    ResponseHandling, ResponsePayload,
};
pub use executor::RequestEngine;
