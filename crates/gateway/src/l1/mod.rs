//! Base-chain adapter built on alloy contract bindings.

mod contracts;
mod portal;

pub use portal::AlloyPortalGateway;
