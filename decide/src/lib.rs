#[macro_use]
extern crate serde;

mod authn;
mod authority;
mod ballot;
mod census;
mod config;
mod coordinator;
mod elgamal;
mod eligibility;
mod error;
mod group;
mod keygen;
mod lifecycle;
mod mix;
mod question;
mod remote;
mod secret_share;
pub mod serde_bigint;
mod service;
mod store;
mod tally;
mod voting;

pub use authn::*;
pub use authority::*;
pub use ballot::*;
pub use census::*;
pub use config::*;
pub use coordinator::*;
pub use elgamal::*;
pub use eligibility::*;
pub use error::*;
pub use group::*;
pub use keygen::*;
pub use lifecycle::*;
pub use mix::*;
pub use question::*;
pub use remote::*;
pub use secret_share::*;
pub use service::*;
pub use store::*;
pub use tally::*;
pub use voting::*;

#[cfg(test)]
mod tests;
