use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{absolute_href, content_table, trimmed_text, ANCHOR};
use crate::error::ParseError;
use crate::model::{DocumentLink, LawRecord};

/// Index of the law table among a volume page's content tables.
pub const LAW_TABLE: usize = 3;

static TBODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static EMPHASIS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("em").unwrap());

/// Read the law table of a volume page. Body cells are consumed as
/// (number, content) pairs; an odd trailing cell is dropped.
pub fn extract_records(html: &str, domain: &str) -> Result<Vec<LawRecord>, ParseError> {
    let doc = Html::parse_document(html);
    let table = content_table(&doc, LAW_TABLE)?;
    let body = table
        .select(&TBODY)
        .next()
        .ok_or(ParseError::MissingTableBody)?;

    let rows: Vec<ElementRef<'_>> = body.select(&CELL).collect();
    rows.chunks_exact(2)
        .enumerate()
        .map(|(row, pair)| extract_record(row, pair[0], pair[1], domain))
        .collect()
}

/// Build one record from a number cell and its content cell.
pub fn extract_record(
    row: usize,
    number_cell: ElementRef<'_>,
    content_cell: ElementRef<'_>,
    domain: &str,
) -> Result<LawRecord, ParseError> {
    let number = first_paragraph(number_cell, row, "number").map(trimmed_text)?;
    let content = first_paragraph(content_cell, row, "content")?;

    let mut docs = DocIndex::default();
    for anchor in content.select(&ANCHOR) {
        docs.link(trimmed_text(anchor), absolute_href(anchor, domain)?);
    }
    for em in content.select(&EMPHASIS) {
        docs.mention(trimmed_text(em));
    }

    Ok(LawRecord {
        number,
        docs: docs.into_vec(),
    })
}

fn first_paragraph<'a>(
    cell: ElementRef<'a>,
    row: usize,
    which: &'static str,
) -> Result<ElementRef<'a>, ParseError> {
    cell.select(&PARAGRAPH)
        .next()
        .ok_or(ParseError::MissingParagraph { row, cell: which })
}

/// Document names keyed by trimmed text. A linked entry always beats a
/// name-only one; entries keep the slot where their name first appeared.
#[derive(Default)]
struct DocIndex {
    docs: Vec<DocumentLink>,
    slots: HashMap<String, usize>,
}

impl DocIndex {
    fn link(&mut self, name: String, url: String) {
        match self.slots.get(&name) {
            Some(&i) => self.docs[i].link = Some(url),
            None => self.push(name, Some(url)),
        }
    }

    fn mention(&mut self, name: String) {
        if !self.slots.contains_key(&name) {
            self.push(name, None);
        }
    }

    fn push(&mut self, name: String, link: Option<String>) {
        self.slots.insert(name.clone(), self.docs.len());
        self.docs.push(DocumentLink { name, link });
    }

    fn into_vec(self) -> Vec<DocumentLink> {
        self.docs
    }
}
