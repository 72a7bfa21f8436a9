use blessforge_library::{ReconciledAddon, Status};
use blessforge_remote::Url;
use std::fmt::Write;

const UNKNOWN: &str = "Error, try again";
const UP_TO_DATE: &str = "All add-ons are up to date";

/// Renders the outdated add-ons as a table, one add-on per line.
///
/// `link` supplies the remote page of an add-on; add-ons whose remote state
/// is unknown get an error marker instead.
pub fn render(addons: &[ReconciledAddon], link: impl Fn(&ReconciledAddon) -> Option<Url>) -> String {
    if addons.is_empty() {
        return format!("{UP_TO_DATE}\n");
    }
    let width = addons.iter().map(|addon| addon.name.chars().count()).max().unwrap_or(0).max("Add-on".len());
    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  {:<10}  {:<10}  Link", "Add-on", "Installed", "Updated");
    for addon in addons {
        let installed = addon.local_modified.date().to_string();
        let (updated, target) = match addon.status {
            Status::Unknown(failure) => ("?".to_string(), format!("{UNKNOWN} ({failure})")),
            Status::Outdated => (
                addon.remote_modified.date().to_string(),
                link(addon).map(|url| url.to_string()).unwrap_or_default(),
            ),
        };
        let _ = writeln!(out, "{:<width$}  {installed:<10}  {updated:<10}  {target}", addon.name);
    }
    out
}
