//! The "remote lookup" capability: given an add-on's remote identifier,
//! find out when the add-on was last updated on the remote site.

pub mod backend;
pub mod error;

pub use crate::backend::RemoteLookup;
pub use reqwest::Url;
use std::sync::Arc;

pub type LookupHandle = Arc<dyn RemoteLookup + Send + Sync>;

/// Default site hosting add-on project pages.
pub const DEFAULT_BASE_URL: &str = "https://www.curseforge.com/wow/addons/";
