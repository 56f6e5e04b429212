pub mod messages;
pub mod session;

pub use messages::*;
pub use session::*;
