pub mod laws;
pub mod pages;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::error::ParseError;

static CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.article-content").unwrap());
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// All tables under the article content block, nested ones included, in
/// document order.
fn content_tables(doc: &Html) -> Result<Vec<ElementRef<'_>>, ParseError> {
    let content = doc
        .select(&CONTENT)
        .next()
        .ok_or(ParseError::MissingContent)?;
    Ok(content.select(&TABLE).collect())
}

/// The table at `index` in the article content block.
fn content_table(doc: &Html, index: usize) -> Result<ElementRef<'_>, ParseError> {
    let tables = content_tables(doc)?;
    tables.get(index).copied().ok_or(ParseError::MissingTable {
        index,
        found: tables.len(),
    })
}

fn trimmed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// `domain` + raw href. No URL joining: the site's hrefs are root-relative.
fn absolute_href(anchor: ElementRef<'_>, domain: &str) -> Result<String, ParseError> {
    let href = anchor
        .value()
        .attr("href")
        .ok_or(ParseError::MissingAttribute {
            element: "a",
            attribute: "href",
        })?;
    Ok(format!("{}{}", domain, href))
}
