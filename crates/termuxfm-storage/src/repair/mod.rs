//! Permission repair: a privileged `chmod` runner and the policy around it.

pub mod helper;
pub mod su;

pub use helper::{Access, RepairHelper};
pub use su::SuChmod;
