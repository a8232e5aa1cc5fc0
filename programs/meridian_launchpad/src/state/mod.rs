/**
 * State Accounts for Meridian Launchpad
 */

pub mod sale;
pub mod buyer;
pub mod vesting;
pub mod commitment;
pub mod referral;
pub mod treasury;

pub use sale::*;
pub use buyer::*;
pub use vesting::*;
pub use commitment::*;
pub use referral::*;
pub use treasury::*;
