use thiserror::Error;

/// The page layout did not match the positional table contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no article content block in page")]
    MissingContent,

    #[error("expected table #{index} in article content, found {found} table(s)")]
    MissingTable { index: usize, found: usize },

    #[error("law table has no <tbody>")]
    MissingTableBody,

    #[error("row {row}: {cell} cell has no <p>")]
    MissingParagraph { row: usize, cell: &'static str },

    #[error("<{element}> without {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("landing page request failed: HTTP error {status}")]
    Discovery { status: u16 },

    #[error("request for {url} failed: HTTP error {status}")]
    Fetch { url: String, status: u16 },

    #[error("connection error for {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected page layout at {url}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("worker task failed")]
    Worker(#[from] tokio::task::JoinError),

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("failed to serialize results")]
    Serialize(#[from] serde_json::Error),
}
