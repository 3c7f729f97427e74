//! # termuxfm-storage
//!
//! Storage backends for Termux File Manager: a direct host directory with
//! privileged permission repair, and a document tree addressed by
//! identifiers. The [`StorageManager`] keeps exactly one of them active.

pub mod manager;
pub mod prefs;
pub mod providers;
pub mod repair;
pub mod sweep;

pub use manager::StorageManager;
pub use prefs::PreferenceStore;
pub use repair::{Access, RepairHelper, SuChmod};
pub use sweep::{ScriptPermissionSweep, SweepReport};
