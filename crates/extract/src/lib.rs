//! Extraction of the "last updated" timestamp from an add-on's project page.
//!
//! Project pages render every date inside an `<abbr>` element, with the
//! machine-readable Unix timestamp carried in a `data-epoch` attribute. The
//! first such element on the page belongs to the most recent file upload.

mod consts;
pub mod error;

use exn::{OptionExt, ResultExt};
use scraper::Html;
use time::UtcDateTime;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Easy, top-level entrypoint for extracting the last-updated timestamp from
/// raw HTML bytes.
///
/// Accepts raw bytes, instead of requiring HTML to be valid UTF-8. Invalid byte
/// sequences are replaced with U+FFFD during parsing.
///
/// # Examples
///
/// ```rust
/// use blessforge_extract::last_updated;
/// let html = r#"<div class="updated">Updated <abbr data-epoch="1654041600">Jun 1, 2022</abbr></div>"#;
/// let updated = last_updated(html).unwrap();
/// assert_eq!(updated.unix_timestamp(), 1654041600);
/// ```
#[instrument(skip(html), fields(html_size = html.as_ref().len()))]
pub fn last_updated(html: impl AsRef<[u8]>) -> Result<UtcDateTime> {
    let html = String::from_utf8_lossy(html.as_ref());
    let document = Html::parse_document(&html);
    self::epoch(&document)
}

#[instrument(level = "trace", skip(document))]
pub(crate) fn epoch(document: &Html) -> Result<UtcDateTime> {
    let raw = document
        .select(&consts::EPOCH_SELECTOR)
        .next()
        .and_then(|element| element.value().attr(consts::EPOCH_ATTRIBUTE))
        .ok_or_raise(|| ErrorKind::MissingField(consts::EPOCH_ATTRIBUTE))?;
    let seconds = raw.trim().parse::<i64>().or_raise(|| ErrorKind::ParseError {
        field: consts::EPOCH_ATTRIBUTE,
        value: raw.to_string(),
    })?;
    UtcDateTime::from_unix_timestamp(seconds).or_raise(|| ErrorKind::ParseError {
        field: consts::EPOCH_ATTRIBUTE,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PROJECT_PAGE: &str = r#"
        <html><body>
            <aside class="project-details">
                <dl>
                    <dt>Created</dt>
                    <dd><abbr class="tip standard-date" data-epoch="1500000000">Jul 14, 2017</abbr></dd>
                </dl>
            </aside>
        </body></html>
    "#;

    #[test]
    fn test_extracts_first_epoch() {
        let html = r#"
            <abbr data-epoch="1654041600">Jun 1, 2022</abbr>
            <abbr data-epoch="1500000000">Jul 14, 2017</abbr>
        "#;
        assert_eq!(last_updated(html).unwrap().unix_timestamp(), 1654041600);
    }

    #[test]
    fn test_extracts_from_full_page() {
        assert_eq!(last_updated(PROJECT_PAGE).unwrap().unix_timestamp(), 1500000000);
    }

    #[test]
    fn test_skips_abbr_without_epoch() {
        let html = r#"<abbr title="World of Warcraft">WoW</abbr><abbr data-epoch="42">then</abbr>"#;
        assert_eq!(last_updated(html).unwrap().unix_timestamp(), 42);
    }

    #[test]
    fn test_accepts_invalid_utf8() {
        let mut html = b"<p>\xff\xfe</p>".to_vec();
        html.extend_from_slice(br#"<abbr data-epoch="1654041600"></abbr>"#);
        assert_eq!(last_updated(html).unwrap().unix_timestamp(), 1654041600);
    }

    #[rstest]
    #[case("")]
    #[case("<html><body><p>Project not found</p></body></html>")]
    #[case("<abbr>Jun 1, 2022</abbr>")]
    fn test_missing_epoch(#[case] html: &str) {
        let err = last_updated(html).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField("data-epoch"));
    }

    #[rstest]
    #[case(r#"<abbr data-epoch="yesterday"></abbr>"#)]
    #[case(r#"<abbr data-epoch=""></abbr>"#)]
    #[case(r#"<abbr data-epoch="99999999999999999"></abbr>"#)]
    fn test_unparsable_epoch(#[case] html: &str) {
        let err = last_updated(html).unwrap_err();
        assert!(matches!(&*err, ErrorKind::ParseError { field: "data-epoch", .. }));
    }
}
