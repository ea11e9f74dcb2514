pub mod connection_session;
pub mod network;
pub mod protocol;
pub mod routing;
