mod money;

pub mod op;
mod secret;

pub use money::{Coins, Rial, RialConversionError};
pub use secret::Secret;
