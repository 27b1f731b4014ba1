use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::http::{Fetcher, GetError};
use crate::model::{LawRecord, PageRef, ResultSet};
use crate::parser::{laws, pages};
use crate::settings::{FailurePolicy, Settings};

/// What a worker reports back: its page slot and the records it extracted.
type Report = (usize, Result<Vec<LawRecord>, ScrapeError>);

/// Two-phase scrape: discover the volume pages from the landing page, then
/// fetch and extract every volume on its own task.
pub struct Scraper {
    fetcher: Arc<Fetcher>,
    settings: Settings,
    silent: bool,
}

impl Scraper {
    /// `silent` suppresses the per-page "Requesting page" lines and the
    /// progress bar.
    pub fn new(settings: Settings, silent: bool) -> Result<Self, ScrapeError> {
        let fetcher = Arc::new(Fetcher::new(&settings)?);
        Ok(Self {
            fetcher,
            settings,
            silent,
        })
    }

    /// Fetch the landing page and list its volume pages.
    pub async fn discover(&self) -> Result<Vec<PageRef>, ScrapeError> {
        let url = &self.settings.landing_url;
        info!(%url, "fetching landing page");

        let html = self.fetcher.get_page(url).await.map_err(|e| match e {
            GetError::Status(status) => ScrapeError::Discovery { status },
            GetError::Transport(source) => ScrapeError::Transport {
                url: url.clone(),
                source,
            },
        })?;

        let pages =
            pages::locate_sub_pages(&html, &self.settings.domain).map_err(|source| {
                ScrapeError::Parse {
                    url: url.clone(),
                    source,
                }
            })?;
        info!("Discovered {} volume pages", pages.len());
        Ok(pages)
    }

    /// Discover, then fetch every volume page.
    pub async fn fetch(&self) -> Result<ResultSet, ScrapeError> {
        let pages = self.discover().await?;
        self.fetch_pages(pages).await
    }

    /// Fetch `pages` concurrently, one task per page, and merge their records
    /// in page order.
    pub async fn fetch_pages(&self, pages: Vec<PageRef>) -> Result<ResultSet, ScrapeError> {
        let total = pages.len();
        let policy = self.settings.failure_policy;
        let pb = self.progress_bar(total);

        // Workers send results, the loop below collects them
        let (tx, mut rx) = mpsc::channel::<Report>(total.max(1));
        let mut workers = JoinSet::new();

        for (slot, page) in pages.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let domain = self.settings.domain.clone();
            let tx = tx.clone();
            let pb = pb.clone();
            let silent = self.silent;

            workers.spawn(async move {
                if !silent {
                    pb.suspend(|| println!("Requesting page {}", page.label));
                }
                let result = fetch_volume(&fetcher, &page, &domain).await;
                let _ = tx.send((slot, result)).await;
            });
        }

        // rx closes once every worker has finished and dropped its sender
        drop(tx);

        let mut slots: Vec<Option<Vec<LawRecord>>> = (0..total).map(|_| None).collect();
        let mut failed = 0usize;

        while let Some((slot, result)) = rx.recv().await {
            pb.inc(1);
            match result {
                Ok(records) => {
                    debug!(slot, records = records.len(), "page done");
                    slots[slot] = Some(records);
                }
                Err(e) if policy == FailurePolicy::Abort => {
                    warn!("Aborting batch: {}", e);
                    workers.abort_all();
                    pb.finish_and_clear();
                    return Err(e);
                }
                Err(e) => {
                    warn!("Skipping page: {}", e);
                    failed += 1;
                }
            }
        }

        // A panicked worker never reports; it only shows up here
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if policy == FailurePolicy::Abort {
                    pb.finish_and_clear();
                    return Err(ScrapeError::Worker(e));
                }
                warn!("Worker failed: {}", e);
                failed += 1;
            }
        }

        pb.finish_and_clear();
        let lom: Vec<LawRecord> = slots.into_iter().flatten().flatten().collect();
        info!(
            "Collected {} records from {} pages ({} failed)",
            lom.len(),
            total,
            failed
        );
        Ok(ResultSet::new(lom))
    }

    /// Full run rendered as `{"lom": [...]}`.
    pub async fn run(&self, pretty: bool) -> Result<String, ScrapeError> {
        let result = self.fetch().await?;
        Ok(result.to_json(pretty)?)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if self.silent {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} pages")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb
    }
}

async fn fetch_volume(
    fetcher: &Fetcher,
    page: &PageRef,
    domain: &str,
) -> Result<Vec<LawRecord>, ScrapeError> {
    let html = fetcher.get_page(&page.url).await.map_err(|e| match e {
        GetError::Status(status) => ScrapeError::Fetch {
            url: page.url.clone(),
            status,
        },
        GetError::Transport(source) => ScrapeError::Transport {
            url: page.url.clone(),
            source,
        },
    })?;

    laws::extract_records(&html, domain).map_err(|source| ScrapeError::Parse {
        url: page.url.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ParseError;
    use crate::model::DocumentLink;
    use crate::settings::USER_AGENT;
    use wiremock::matchers::{header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn landing(hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|h| format!(r#"<tr><td><a href="{}">{}</a></td></tr>"#, h, h))
            .collect();
        format!(
            r#"<div class="article-content"><table><tr><td>intro</td></tr></table><table>{}</table></div>"#,
            anchors
        )
    }

    fn volume(rows: &[(&str, &str)]) -> String {
        let cells: String = rows
            .iter()
            .map(|(n, c)| format!("<tr><td><p>{}</p></td><td><p>{}</p></td></tr>", n, c))
            .collect();
        format!(
            r#"<div class="article-content"><table></table><table></table><table></table><table><tbody>{}</tbody></table></div>"#,
            cells
        )
    }

    fn settings(server: &MockServer, failure_policy: FailurePolicy) -> Settings {
        Settings {
            domain: server.uri(),
            landing_url: format!("{}/landing", server.uri()),
            timeout_secs: 5,
            failure_policy,
            ..Settings::default()
        }
    }

    async fn mount_page(server: &MockServer, at: &str, status: u16, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .and(header("User-Agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetches_every_volume_in_page_order() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 200, landing(&["/v/1", "/v/2"])).await;
        mount_page(
            &server,
            "/v/1",
            200,
            volume(&[("1", r#"<a href="/a1.pdf">Act 1</a>"#), ("2", "<em>Act 2</em>")]),
        )
        .await;
        mount_page(&server, "/v/2", 200, volume(&[("101", "<em>Act 101</em>")])).await;

        let scraper = Scraper::new(settings(&server, FailurePolicy::Abort), true).unwrap();
        let result = scraper.fetch().await.unwrap();

        let numbers: Vec<&str> = result.lom.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, ["1", "2", "101"]);
        assert_eq!(
            result.lom[0].docs,
            vec![DocumentLink {
                name: "Act 1".into(),
                link: Some(format!("{}/a1.pdf", server.uri())),
            }]
        );
        assert_eq!(result.lom[1].docs[0].link, None);
    }

    #[tokio::test]
    async fn run_emits_lom_json() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 200, landing(&["/v/1"])).await;
        mount_page(&server, "/v/1", 200, volume(&[("7", "<em>Act Y</em>")])).await;

        let scraper = Scraper::new(settings(&server, FailurePolicy::Abort), true).unwrap();
        let json = scraper.run(false).await.unwrap();
        assert_eq!(
            json,
            r#"{"lom":[{"number":"7","docs":[{"name":"Act Y","link":null}]}]}"#
        );
    }

    #[tokio::test]
    async fn landing_failure_stops_before_dispatch() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 500, String::new()).await;
        Mock::given(method("GET"))
            .and(path_regex("^/v/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let scraper = Scraper::new(settings(&server, FailurePolicy::Abort), true).unwrap();
        let err = scraper.run(false).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Discovery { status: 500 }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn one_bad_page_aborts_the_batch() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 200, landing(&["/v/1", "/v/2"])).await;
        mount_page(&server, "/v/1", 200, volume(&[("1", "<em>A</em>")])).await;
        mount_page(&server, "/v/2", 404, String::new()).await;

        let scraper = Scraper::new(settings(&server, FailurePolicy::Abort), true).unwrap();
        match scraper.fetch().await {
            Err(ScrapeError::Fetch { url, status }) => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/v/2"));
            }
            other => panic!("expected fetch failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn isolate_policy_keeps_good_pages() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 200, landing(&["/v/1", "/v/2", "/v/3"])).await;
        mount_page(&server, "/v/1", 200, volume(&[("1", "<em>A</em>")])).await;
        mount_page(&server, "/v/2", 503, String::new()).await;
        mount_page(&server, "/v/3", 200, "<p>no content</p>".to_string()).await;

        let scraper = Scraper::new(settings(&server, FailurePolicy::Isolate), true).unwrap();
        let result = scraper.fetch().await.unwrap();
        assert_eq!(result.lom.len(), 1);
        assert_eq!(result.lom[0].number, "1");
    }

    #[tokio::test]
    async fn broken_layout_is_a_parse_error() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 200, landing(&["/v/1"])).await;
        mount_page(&server, "/v/1", 200, "<html><body></body></html>".to_string()).await;

        let scraper = Scraper::new(settings(&server, FailurePolicy::Abort), true).unwrap();
        match scraper.fetch().await {
            Err(ScrapeError::Parse { source, .. }) => {
                assert_eq!(source, ParseError::MissingContent)
            }
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn wrong_user_agent_is_not_served() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 200, landing(&[])).await;

        let custom = Settings {
            user_agent: "curl/8.0".into(),
            ..settings(&server, FailurePolicy::Abort)
        };
        let scraper = Scraper::new(custom, true).unwrap();
        // no mock matches, wiremock answers 404
        assert!(matches!(
            scraper.discover().await,
            Err(ScrapeError::Discovery { status: 404 })
        ));
    }

    #[tokio::test]
    async fn hung_page_times_out() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 200, landing(&["/v/1"])).await;
        Mock::given(method("GET"))
            .and(path("/v/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(volume(&[]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let quick = Settings {
            timeout_secs: 1,
            ..settings(&server, FailurePolicy::Abort)
        };
        let scraper = Scraper::new(quick, true).unwrap();
        assert!(matches!(
            scraper.fetch().await,
            Err(ScrapeError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn empty_landing_table_gives_empty_result() {
        let server = MockServer::start().await;
        mount_page(&server, "/landing", 200, landing(&[])).await;

        let scraper = Scraper::new(settings(&server, FailurePolicy::Abort), true).unwrap();
        assert_eq!(scraper.fetch().await.unwrap(), ResultSet::default());
    }
}
