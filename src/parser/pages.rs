use scraper::Html;

use super::{absolute_href, content_table, trimmed_text, ANCHOR};
use crate::error::ParseError;
use crate::model::PageRef;

/// Index of the volume table among the landing page's content tables.
pub const PAGE_INDEX_TABLE: usize = 1;

/// Every anchor of the landing page's volume table, in document order.
pub fn locate_sub_pages(html: &str, domain: &str) -> Result<Vec<PageRef>, ParseError> {
    let doc = Html::parse_document(html);
    let table = content_table(&doc, PAGE_INDEX_TABLE)?;

    table
        .select(&ANCHOR)
        .map(|a| {
            Ok(PageRef {
                label: trimmed_text(a),
                url: absolute_href(a, domain)?,
            })
        })
        .collect()
}
