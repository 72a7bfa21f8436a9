//! Local state of the add-on installation directory.
//!
//! The game loads every immediate child of its `AddOns` directory as a
//! separate folder, and a single add-on frequently ships several of them.
//! [`build`] joins those folders against the [`Manifest`](blessforge_manifest::Manifest)
//! and collapses them into one [`LocalAddon`] per logical add-on, keeping the
//! most recent modification time: the last time any part of the add-on was
//! updated is the last time the add-on was updated.

pub mod error;
mod folders;
mod randomize;
mod snapshot;

pub use crate::folders::{InstalledFolder, list_installed_folders};
pub use crate::randomize::{RANDOMIZE_WINDOW, randomize};
pub use crate::snapshot::{LocalAddon, build};
