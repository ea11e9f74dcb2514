pub mod codec;
pub mod errors;
pub mod request;
pub mod response;

pub use codec::*;
pub use errors::*;
pub use request::*;
pub use response::*;
