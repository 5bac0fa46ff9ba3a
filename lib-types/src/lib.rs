//! Agora primitives.
//! Stable, behavior-free value types shared by every crate.
//!
//! Rule: addresses and hashes are fixed-size byte newtypes, never strings.

pub mod amount;
pub mod errors;
pub mod permissions;
pub mod primitives;

pub use amount::Amount;
pub use errors::TypeError;
pub use permissions::SchemePermissions;
pub use primitives::{Address, Hash};
