//! Test affordance: scramble the modification times of an installation so
//! that a check reports a realistic mix of outdated and current add-ons.

use crate::error::{ErrorKind, Result};
use filetime::{FileTime, set_file_times, set_symlink_file_times};
use rand::Rng;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::instrument;

/// How far back in time randomized modification times may go.
pub const RANDOMIZE_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Recursively sets the access and modification times of every entry below
/// `dir` (not `dir` itself) to a random instant within [`RANDOMIZE_WINDOW`]
/// before now. Children are updated before their parents.
///
/// Returns the number of entries touched.
///
/// This is blocking filesystem work; async callers should run it on a
/// blocking thread.
#[instrument(skip(rng))]
pub fn randomize(dir: &Path, rng: &mut impl Rng) -> Result<u64> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    let max = i64::try_from(now.as_secs()).unwrap_or(i64::MAX);
    let min = max.saturating_sub(i64::try_from(RANDOMIZE_WINDOW.as_secs()).unwrap_or(0));
    let mut touched = 0;
    randomize_children(dir, min, max, rng, &mut touched)?;
    tracing::info!(dir = %dir.display(), touched, "Randomized modification times");
    Ok(touched)
}

fn randomize_children(dir: &Path, min: i64, max: i64, rng: &mut impl Rng, touched: &mut u64) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(|e| ErrorKind::from_io(e, dir))? {
        let entry = entry.map_err(|e| ErrorKind::from_io(e, dir))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ErrorKind::from_io(e, &path))?;
        if file_type.is_dir() {
            randomize_children(&path, min, max, rng, touched)?;
        }
        let time = FileTime::from_unix_time(rng.random_range(min..max), 0);
        // Links are stamped themselves; their targets may live outside the installation.
        let stamped = if file_type.is_symlink() {
            set_symlink_file_times(&path, time, time)
        } else {
            set_file_times(&path, time, time)
        };
        stamped.map_err(|e| ErrorKind::from_io(e, &path))?;
        *touched += 1;
    }
    Ok(())
}
