pub mod host;
pub mod mac;
pub mod probe;
pub mod record;
pub mod subnet;
