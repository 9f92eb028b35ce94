mod connection;
mod environment;
mod error;
mod secret;
mod time;
mod transfer;

pub use connection::*;
pub use environment::*;
pub use error::*;
pub use secret::*;
pub use time::*;
pub use transfer::*;
