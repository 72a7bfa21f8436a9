use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

/// Attribute holding the Unix timestamp (in seconds) of the latest file
/// upload, rendered by the project page inside an `<abbr>` tag.
pub(crate) const EPOCH_ATTRIBUTE: &str = "data-epoch";

// The first `abbr` on a project page is the "Updated" field of the sidebar.
selector!(EPOCH_SELECTOR, "abbr[data-epoch]");
