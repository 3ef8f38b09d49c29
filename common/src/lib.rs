//! # netmind common
//!
//! Shared vocabulary of the scan pipeline: the domain models that flow between
//! stages, the error taxonomy, the runtime configuration and the traits that
//! separate the pipeline from its external collaborators.
//!
//! * **[`network`]**: subnets, host identities, probe results and merged records.
//! * **[`scanning`]**: capability traits for the discovery and probe tools.
//! * **[`sinks`]**: read/write contracts for the cache and persistence stores.
//! * **[`vendors`]**: MAC vendor lookup contract.

pub mod config;
pub mod error;
pub mod network;
pub mod scanning;
pub mod sinks;
pub mod vendors;
