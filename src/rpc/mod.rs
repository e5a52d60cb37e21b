mod api;
mod client;
mod types;

pub use api::*;
pub use client::*;
pub use types::*;

#[cfg(test)]
mod client_test;
