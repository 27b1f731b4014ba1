use serde::{Deserialize, Serialize};

/// A volume page discovered on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub label: String,
    pub url: String,
}

/// A document named in a law row. `link` is `None` when the name was only
/// italicised and never hyperlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub name: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawRecord {
    pub number: String,
    pub docs: Vec<DocumentLink>,
}

/// Final aggregate, serialized as `{"lom": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub lom: Vec<LawRecord>,
}

impl ResultSet {
    pub fn new(lom: Vec<LawRecord>) -> Self {
        Self { lom }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            to_json_indented(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Four-space indentation; serde_json's pretty printer defaults to two.
pub fn to_json_indented<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
