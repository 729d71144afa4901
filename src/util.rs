pub mod blob;
pub mod checksum;
pub mod compute_once;
pub mod http_transport;
pub mod retry;
