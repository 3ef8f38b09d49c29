//! Process-backed implementations of the capability traits.
//!
//! Both adapters shell out to a system tool and treat it as a black box: they
//! own process launching, timeouts and output capture, and leave
//! interpretation of the output to the parsers.

pub mod nmap;
pub mod ping;

pub use nmap::NmapDiscovery;
pub use ping::PingProbe;
