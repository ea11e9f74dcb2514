//! BSM broker: identity-keyed store of the freshest message per tracked object.

pub mod message;
pub mod record;
pub mod store;

pub use message::{split_batch, IncomingMsg, MessageError};
pub use record::{Identity, MsgRecord};
pub use store::{BsmStore, PushReport};
