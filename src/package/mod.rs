//! Package management module
//!
//! This module models each package known to the client: its versions from
//! every repository, its trust classification, its categories, and the
//! action selected for it.

mod action;
mod category;
mod db;
mod message;
mod meta;
mod script;
mod version_set;

pub use action::{Action, ActionId, ActionItem, Task};
pub use category::{ALL_CATEGORY, BASE_CATEGORY, Category, CategoryIndex, ORPHANED_CATEGORY};
pub use db::{PackageDb, ScanReport};
pub use message::{ConsoleMessages, MessageDisplay, PackageEvent, PackageMessage, dispatch};
pub use meta::PackageMeta;
pub use script::Script;
pub use version_set::VersionSet;

#[cfg(test)]
pub use message::MockMessageDisplay;
