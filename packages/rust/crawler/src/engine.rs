//! Rate-limited, scope-aware crawl engine.
//!
//! The crawler starts from a seed URL and walks an explicit LIFO frontier:
//! links found on a page are pushed in reverse so the first link is visited
//! before its siblings (depth-first, discovery order). Every visited page is
//! extracted immediately, so the crawl order is also the output order.
//!
//! The crawl runs on a single task. Each fetch can reveal new links that must
//! be scope-checked before the next fetch, and a fixed delay separates
//! consecutive requests.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use docbundle_shared::{
    Admission, ContentUnit, CrawlConfig, DocBundleError, ExtractionResult, FailureKind,
    ProgressReporter, ProgressTracker, Result, ScopeFilter, SourceLocation, UnitKind,
};

use crate::scope::WebScope;

/// Redirect hops followed per request, each one scope-checked.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// CrawlResult
// ---------------------------------------------------------------------------

/// Summary of a completed crawl.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// One result per dispatched unit, in visit order.
    pub results: Vec<ExtractionResult>,
    /// HTTP requests actually sent.
    pub requests: usize,
    /// Total duration of the crawl.
    pub duration: Duration,
}

/// A fetched resource before extraction.
struct FetchedResource {
    /// URL after redirects; relative links resolve against it.
    final_url: Url,
    kind: UnitKind,
    body: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Sequential web crawler bounded by a [`WebScope`].
pub struct Crawler {
    config: CrawlConfig,
    filter: ScopeFilter,
    client: Client,
}

impl Crawler {
    /// Create a new crawler with the given configuration.
    pub fn new(config: CrawlConfig, filter: ScopeFilter) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.timeout)
            .build()
            .map_err(|e| DocBundleError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            filter,
            client,
        })
    }

    /// Crawl from `seed`, extracting every in-scope unit exactly once.
    #[instrument(skip_all, fields(seed = %seed))]
    pub async fn crawl(
        &self,
        seed: &Url,
        progress: &dyn ProgressReporter,
    ) -> Result<CrawlResult> {
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(DocBundleError::invalid_source(format!(
                "seed URL must be http or https: {seed}"
            )));
        }

        let start_time = Instant::now();
        let scope = WebScope::new(seed, &self.config.exclude_patterns);
        let tracker = ProgressTracker::estimated(self.config.estimated_pages);

        let mut seed = seed.clone();
        seed.set_fragment(None);

        let mut frontier: Vec<(Url, u32)> = vec![(seed, 0)];
        let mut visited: HashSet<String> = HashSet::new();
        let mut results: Vec<ExtractionResult> = Vec::new();
        let mut requests: usize = 0;

        info!(
            base_path = scope.base_path(),
            delay_ms = self.config.delay.as_millis() as u64,
            max_pages = self.config.max_pages,
            "starting crawl"
        );

        while let Some((url, depth)) = frontier.pop() {
            // Marked at dispatch: duplicates still on the stack are dropped here.
            if !visited.insert(normalize_url(&url)) {
                continue;
            }

            if results.len() >= self.config.max_pages {
                info!(max_pages = self.config.max_pages, "page limit reached");
                break;
            }

            let unit = match self.filter.admit_url(&url) {
                Admission::Skip => continue,
                Admission::Unsupported(ext) => {
                    ContentUnit::new(url.as_str(), UnitKind::Unsupported(ext), SourceLocation::Url(url.clone()))
                }
                Admission::Proceed(kind) => {
                    ContentUnit::new(url.as_str(), kind, SourceLocation::Url(url.clone()))
                }
            };

            let result = if let UnitKind::Unsupported(ext) = &unit.kind {
                ExtractionResult::unsupported(&unit.identity, ext)
            } else {
                if requests > 0 && !self.config.delay.is_zero() {
                    tokio::time::sleep(self.config.delay).await;
                }
                requests += 1;

                match self.fetch(&url, &unit.kind, &scope).await {
                    Ok(resource) => {
                        // The redirect target is now covered by this unit.
                        visited.insert(normalize_url(&resource.final_url));
                        if resource.kind == UnitKind::Html && self.may_descend(depth) {
                            let html = String::from_utf8_lossy(&resource.body);
                            let links = extract_links(&Html::parse_document(&html), &resource.final_url);
                            self.push_links(&mut frontier, &visited, &scope, links, depth + 1);
                        }
                        docbundle_extract::extract(&unit.identity, &resource.kind, &resource.body)
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "fetch failed");
                        ExtractionResult::failed(&unit.identity, FailureKind::FetchError, e)
                    }
                }
            };

            tracker.record();
            progress.unit_done(&result.identity, result.status, &tracker.snapshot());
            results.push(result);
        }

        let result = CrawlResult {
            results,
            requests,
            duration: start_time.elapsed(),
        };

        info!(
            units = result.results.len(),
            requests = result.requests,
            duration_ms = result.duration.as_millis() as u64,
            "crawl completed"
        );

        Ok(result)
    }

    fn may_descend(&self, depth: u32) -> bool {
        self.config.max_depth.is_none_or(|max| depth < max)
    }

    /// Push admitted, in-scope, unvisited links so the first one pops first.
    fn push_links(
        &self,
        frontier: &mut Vec<(Url, u32)>,
        visited: &HashSet<String>,
        scope: &WebScope,
        links: Vec<Url>,
        depth: u32,
    ) {
        let mut seen_here = HashSet::new();
        let admitted: Vec<Url> = links
            .into_iter()
            .filter(|link| scope.in_scope(link))
            .filter(|link| self.filter.admit_url(link) != Admission::Skip)
            .filter(|link| {
                let key = normalize_url(link);
                !visited.contains(&key) && seen_here.insert(key)
            })
            .collect();

        debug!(count = admitted.len(), depth, "links queued");
        frontier.extend(admitted.into_iter().rev().map(|link| (link, depth)));
    }

    /// GET a URL. Non-2xx responses are errors for this unit only.
    ///
    /// Redirects are followed by hand so every hop can be scope-checked
    /// before it is requested. A hop leaving the scope fails the unit.
    async fn fetch(
        &self,
        url: &Url,
        provisional: &UnitKind,
        scope: &WebScope,
    ) -> Result<FetchedResource> {
        let mut current = url.clone();
        let mut hops = 0;

        let response = loop {
            debug!(url = %current, "fetching");

            let response = self
                .client
                .get(current.as_str())
                .send()
                .await
                .map_err(|e| DocBundleError::Network(format!("{current}: {e}")))?;

            if !response.status().is_redirection() {
                break response;
            }

            let next = redirect_target(&current, &response)?;
            if !scope.in_scope(&next) {
                return Err(DocBundleError::Network(format!(
                    "redirect leaves crawl scope: {next}"
                )));
            }
            hops += 1;
            if hops > MAX_REDIRECTS {
                return Err(DocBundleError::Network(format!(
                    "more than {MAX_REDIRECTS} redirects"
                )));
            }
            debug!(from = %current, to = %next, "following redirect");
            current = next;
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DocBundleError::Network(format!("HTTP {status}")));
        }

        let final_url = current;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let kind = kind_from_content_type(content_type.as_deref(), provisional);

        let body = response
            .bytes()
            .await
            .map_err(|e| DocBundleError::Network(format!("body read failed: {e}")))?;

        Ok(FetchedResource {
            final_url,
            kind,
            body: body.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a redirect response's `Location` against the URL that produced it.
fn redirect_target(from: &Url, response: &reqwest::Response) -> Result<Url> {
    let status = response.status();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DocBundleError::Network(format!("HTTP {status} without Location")))?;

    let mut next = from
        .join(location)
        .map_err(|e| DocBundleError::Network(format!("bad redirect '{location}': {e}")))?;
    next.set_fragment(None);
    Ok(next)
}

/// Decide a fetched resource's kind from its `Content-Type`.
///
/// Without a usable header the kind guessed from the URL is kept.
fn kind_from_content_type(content_type: Option<&str>, provisional: &UnitKind) -> UnitKind {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_lowercase())
        .unwrap_or_default();

    match mime.as_str() {
        "text/html" | "application/xhtml+xml" => UnitKind::Html,
        "application/pdf" => UnitKind::Pdf,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        | "application/vnd.ms-excel.sheet.macroenabled.12"
        | "application/vnd.oasis.opendocument.spreadsheet" => UnitKind::Spreadsheet,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
            UnitKind::WordDocument
        }
        "application/msword" => UnitKind::Unsupported("doc".into()),
        "application/vnd.ms-excel" => UnitKind::Unsupported("xls".into()),
        "application/json" | "application/xml" | "application/javascript" => UnitKind::PlainText,
        m if m.starts_with("text/") => UnitKind::PlainText,
        "" => provisional.clone(),
        "application/octet-stream" if *provisional != UnitKind::Html => provisional.clone(),
        _ => UnitKind::BinaryOther,
    }
}

/// Extract all links from a document, resolved against the base URL.
fn extract_links(doc: &Html, base_url: &Url) -> Vec<Url> {
    let link_sel = Selector::parse("a[href]").expect("valid selector");
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        if let Some(href) = el.value().attr("href") {
            let href = href.trim();
            // Skip anchors, javascript:, mailto:, tel:
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }

            if let Ok(mut resolved) = base_url.join(href) {
                resolved.set_fragment(None);
                links.push(resolved);
            }
        }
    }

    links
}

/// Normalize a URL for deduplication (strip fragment and trailing slash).
fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    let mut s = normalized.to_string();
    // Remove trailing slash for consistency (except root path)
    if s.ends_with('/') && normalized.path() != "/" {
        s.pop();
    }
    s
}
