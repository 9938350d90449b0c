pub mod claim;
pub mod enums;

pub use claim::{Claim, ClaimError};
pub use enums::*;
