mod account;
mod error;
mod money;
mod transfer;

pub use account::*;
pub use error::*;
pub use money::*;
pub use transfer::*;
