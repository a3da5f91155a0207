pub use self::connection::Connection;
#[allow(clippy::module_inception)]
mod connection;

pub(crate) mod transport;
