/**
 * Instruction Handlers for Meridian Launchpad
 */

pub mod configure;
pub mod eligibility;
pub mod purchase;
pub mod commit_reveal;
pub mod vesting;
pub mod treasury;
pub mod analytics;
pub mod emergency;

pub use configure::*;
pub use eligibility::*;
pub use purchase::*;
pub use commit_reveal::*;
pub use vesting::*;
pub use treasury::*;
pub use analytics::*;
pub use emergency::*;
