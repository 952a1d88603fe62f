mod account;
mod holding;
mod security;
mod transaction;

pub use account::*;
pub use holding::*;
pub use security::*;
pub use transaction::*;
