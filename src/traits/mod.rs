//! Core traits for the service bridge.

mod dispose;
mod resolver;

pub use dispose::Dispose;
pub use resolver::{Resolver, ResolverCore};
