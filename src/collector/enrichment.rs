//! Enrichment pipeline: place details and paginated reviews
//!
//! Runs on its own worker pool and its own limiter channel, decoupled from
//! search concurrency. Records without a `hex_id` cannot be looked up on the
//! place endpoints and are skipped: a known precondition, not a failure.
//! A record that fails enrichment keeps its search-derived fields and stays
//! in the final output.

use crate::codec::{encode, QueryField};
use crate::collector::executor::percent_encode;
use crate::collector::limiter::RateLimiter;
use crate::extract::{extract_place_details, extract_reviews_page, parse_payload};
use crate::net::{ApiRequest, Transport};
use crate::record::BusinessRecord;
use futures::StreamExt;
use std::collections::HashSet;
use tokio::sync::watch;

const PLACE_BASE: &str = "https://www.google.com/maps/preview/place";
const REVIEWS_BASE: &str = "https://www.google.com/maps/rpc/listugcposts";

/// Provider maximum for reviews per request
const REVIEWS_PAGE_CAP: u32 = 20;

/// Newest-first ordering discriminant on the reviews endpoint
const SORT_NEWEST: i64 = 2;

/// What to fetch per record
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub details: bool,
    pub reviews: bool,
    /// Maximum reviews per business
    pub reviews_limit: u32,
    /// Reviews requested per page, clamped to the provider cap
    pub page_size: u32,
    pub workers: usize,
}

impl EnrichmentConfig {
    pub fn is_enabled(&self) -> bool {
        self.details || self.reviews
    }
}

/// Per-record enrichment outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichStatus {
    Enriched,
    /// No usable secondary identifier
    Skipped,
    /// Enriched in a previous run or pass
    AlreadyEnriched,
    Failed,
    /// Cancellation observed before this record started
    Cancelled,
}

/// Tallies across one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub enriched: u64,
    pub failed: u64,
    pub skipped: u64,
    pub already_enriched: u64,
}

/// Fetches details and reviews for accepted records
pub struct EnrichmentPipeline<'a, T: Transport> {
    transport: &'a T,
    limiter: &'a RateLimiter,
    config: &'a EnrichmentConfig,
}

impl<'a, T: Transport> EnrichmentPipeline<'a, T> {
    pub fn new(transport: &'a T, limiter: &'a RateLimiter, config: &'a EnrichmentConfig) -> Self {
        Self {
            transport,
            limiter,
            config,
        }
    }

    /// Enriches every record through the worker pool. `already` holds
    /// identifiers enriched by a previous run; `on_done` fires after each
    /// record completes, in completion order.
    pub async fn enrich_all(
        &self,
        records: Vec<BusinessRecord>,
        already: &HashSet<String>,
        cancel: &watch::Receiver<bool>,
        on_done: impl Fn(&BusinessRecord, EnrichStatus) + Sync,
    ) -> (Vec<BusinessRecord>, EnrichmentStats) {
        let total = records.len();
        tracing::info!(
            "Enriching {} records with {} workers (details: {}, reviews: {})",
            total,
            self.config.workers,
            self.config.details,
            self.config.reviews
        );

        let on_done = &on_done;
        let results: Vec<(BusinessRecord, EnrichStatus)> = futures::stream::iter(
            records.into_iter().map(|mut record| async move {
                let status = if *cancel.borrow() {
                    EnrichStatus::Cancelled
                } else if record
                    .enrichment_key()
                    .is_some_and(|key| already.contains(key))
                {
                    EnrichStatus::AlreadyEnriched
                } else {
                    self.enrich_one(&mut record).await
                };
                on_done(&record, status);
                (record, status)
            }),
        )
        .buffer_unordered(self.config.workers.max(1))
        .collect()
        .await;

        let mut stats = EnrichmentStats::default();
        let mut enriched_records = Vec::with_capacity(total);
        for (record, status) in results {
            match status {
                EnrichStatus::Enriched => stats.enriched += 1,
                EnrichStatus::Failed => stats.failed += 1,
                EnrichStatus::Skipped | EnrichStatus::Cancelled => stats.skipped += 1,
                EnrichStatus::AlreadyEnriched => stats.already_enriched += 1,
            }
            enriched_records.push(record);
        }

        tracing::info!(
            "Enrichment complete: {} enriched, {} failed, {} skipped, {} already done",
            stats.enriched,
            stats.failed,
            stats.skipped,
            stats.already_enriched
        );
        (enriched_records, stats)
    }

    /// Enriches one record in place. Detail and review failures are
    /// independent; either alone marks the record failed while keeping
    /// whatever was fetched.
    async fn enrich_one(&self, record: &mut BusinessRecord) -> EnrichStatus {
        let Some(hex_id) = record.hex_id().map(String::from) else {
            return EnrichStatus::Skipped;
        };

        let mut failed = false;

        if self.config.details {
            failed |= !self.fetch_details(&hex_id, record).await;
        }
        if self.config.reviews && self.config.reviews_limit > 0 {
            failed |= !self.fetch_reviews(&hex_id, record).await;
        }

        if failed {
            EnrichStatus::Failed
        } else {
            EnrichStatus::Enriched
        }
    }

    async fn fetch_details(&self, hex_id: &str, record: &mut BusinessRecord) -> bool {
        self.limiter.wait().await;

        let request = place_request(hex_id, record);
        let outcome = match self.transport.send(request).await {
            Ok(bytes) => parse_payload(&bytes).and_then(|data| extract_place_details(&data)),
            Err(e) => {
                self.limiter.record_failure(e.is_rate_limit());
                tracing::debug!("Details fetch failed for {}: {}", record.name, e);
                return false;
            }
        };

        match outcome {
            Ok(details) => {
                self.limiter.record_success();
                record.merge_details(details);
                true
            }
            Err(e) => {
                self.limiter.record_failure(false);
                tracing::debug!("Details payload unreadable for {}: {}", record.name, e);
                false
            }
        }
    }

    /// Pages through the reviews endpoint until the per-business limit, a
    /// short page, or a missing continuation token.
    async fn fetch_reviews(&self, hex_id: &str, record: &mut BusinessRecord) -> bool {
        let limit = self.config.reviews_limit;
        let page_size = self.config.page_size.clamp(1, REVIEWS_PAGE_CAP);
        let mut token: Option<String> = None;

        while (record.reviews.len() as u32) < limit {
            let want = page_size.min(limit - record.reviews.len() as u32);
            self.limiter.wait().await;

            let request = reviews_request(hex_id, want, token.as_deref());
            let page = match self.transport.send(request).await {
                Ok(bytes) => match parse_payload(&bytes).and_then(|d| extract_reviews_page(&d)) {
                    Ok(page) => page,
                    Err(e) => {
                        self.limiter.record_failure(false);
                        tracing::debug!("Reviews payload unreadable for {}: {}", record.name, e);
                        return false;
                    }
                },
                Err(e) => {
                    self.limiter.record_failure(e.is_rate_limit());
                    tracing::debug!("Reviews fetch failed for {}: {}", record.name, e);
                    return false;
                }
            };

            self.limiter.record_success();
            let got = page.reviews.len();
            record.reviews.extend(page.reviews);
            record.reviews.truncate(limit as usize);
            token = page.next_token;

            if got < want as usize || token.is_none() {
                break;
            }
        }

        true
    }
}

/// Builds the place-preview request for one record
fn place_request(hex_id: &str, record: &BusinessRecord) -> ApiRequest {
    let lat = record.latitude.unwrap_or_default();
    let lng = record.longitude.unwrap_or_default();

    let fields = vec![QueryField::message(
        1,
        vec![
            QueryField::string(1, percent_encode(hex_id)),
            QueryField::string(2, percent_encode(&record.name)),
            QueryField::message(
                3,
                vec![
                    QueryField::message(
                        1,
                        vec![
                            QueryField::double(1, 3000.0),
                            QueryField::double(2, lng),
                            QueryField::double(3, lat),
                        ],
                    ),
                    QueryField::message(
                        3,
                        vec![QueryField::int(1, 1024), QueryField::int(2, 768)],
                    ),
                    QueryField::float(4, 13.1),
                ],
            ),
            QueryField::message(
                4,
                vec![QueryField::double(3, lat), QueryField::double(4, lng)],
            ),
        ],
    )];

    let name_plus: String = url::form_urlencoded::byte_serialize(record.name.as_bytes()).collect();
    ApiRequest::new(format!(
        "{PLACE_BASE}?authuser=0&hl=en&gl=us&q={name_plus}&pb={}",
        encode(&fields)
    ))
    .with_referer(format!("https://www.google.com/maps/place/{name_plus}/"))
}

/// Builds one reviews page request: target, paging block, sort order
fn reviews_request(hex_id: &str, page_size: u32, token: Option<&str>) -> ApiRequest {
    let fields = vec![
        QueryField::message(1, vec![QueryField::string(1, percent_encode(hex_id))]),
        QueryField::message(
            2,
            vec![
                QueryField::int(1, i64::from(page_size)),
                QueryField::string(2, token.map(percent_encode).unwrap_or_default()),
            ],
        ),
        QueryField::enumeration(3, SORT_NEWEST),
    ];

    ApiRequest::new(format!(
        "{REVIEWS_BASE}?authuser=0&hl=en&gl=us&pb={}",
        encode(&fields)
    ))
    .with_referer("https://www.google.com/maps/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::TransportError;
    use bytes::Bytes;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;

    fn config(details: bool, reviews: bool, limit: u32, page_size: u32) -> EnrichmentConfig {
        EnrichmentConfig {
            details,
            reviews,
            reviews_limit: limit,
            page_size,
            workers: 2,
        }
    }

    fn record(name: &str, hex_id: Option<&str>) -> BusinessRecord {
        BusinessRecord {
            name: name.to_string(),
            place_id: Some(format!("pid-{name}")),
            hex_id: hex_id.map(String::from),
            latitude: Some(40.7),
            longitude: Some(-74.0),
            found_in: "area".to_string(),
            ..Default::default()
        }
    }

    fn details_body(phone: &str) -> Bytes {
        let mut payload = vec![Value::Null; 210];
        payload[178] = json!([[phone]]);
        let mut top = vec![Value::Null; 7];
        top[6] = Value::Array(payload);
        Bytes::from(format!(")]}}'\n{}", Value::Array(top)))
    }

    fn reviews_body(authors: &[&str], token: Option<&str>) -> Bytes {
        let entries: Vec<Value> = authors
            .iter()
            .map(|a| {
                json!([[
                    format!("id-{a}"),
                    [null, null, null, null,
                     [null, null, null, null, null, [a, "photo"]],
                     null, "2 weeks ago"],
                    [[5], null, null, null, null, null, null, null, null, null,
                     null, null, null, null, null, [["nice place indeed"]]]
                ]])
            })
            .collect();
        Bytes::from(format!(")]}}'\n{}", json!([null, token, entries])))
    }

    /// Serves detail and review bodies, tracking review-page tokens
    struct EnrichTransport {
        review_pages: Vec<(Vec<&'static str>, Option<&'static str>)>,
        requests: Mutex<Vec<String>>,
    }

    impl Transport for EnrichTransport {
        async fn send(&self, request: ApiRequest) -> Result<Bytes, TransportError> {
            self.requests.lock().unwrap().push(request.url.clone());

            if request.url.starts_with(PLACE_BASE) {
                return Ok(details_body("+1 555-0100"));
            }

            // Page index from the continuation token "tok-N", first page
            // has an empty token field
            let token = request
                .url
                .split("!2s")
                .nth(1)
                .and_then(|rest| rest.split('!').next())
                .unwrap_or("");
            let index = token
                .strip_prefix("tok-")
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0);

            let (authors, next) = &self.review_pages[index];
            Ok(reviews_body(authors, *next))
        }
    }

    fn no_cancel() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test]
    async fn test_enrich_merges_details() {
        let transport = EnrichTransport {
            review_pages: vec![],
            requests: Mutex::new(Vec::new()),
        };
        let limiter = RateLimiter::new(Duration::from_millis(1));
        let cfg = config(true, false, 0, 10);
        let pipeline = EnrichmentPipeline::new(&transport, &limiter, &cfg);

        let (records, stats) = pipeline
            .enrich_all(
                vec![record("Acme", Some("0x1:0xa"))],
                &HashSet::new(),
                &no_cancel(),
                |_, _| {},
            )
            .await;

        assert_eq!(stats.enriched, 1);
        assert_eq!(records[0].phone.as_deref(), Some("+1 555-0100"));
    }

    #[tokio::test]
    async fn test_reviews_paginate_until_limit() {
        let transport = EnrichTransport {
            review_pages: vec![
                (vec!["A", "B"], Some("tok-1")),
                (vec!["C", "D"], Some("tok-2")),
                (vec!["E", "F"], Some("tok-3")),
            ],
            requests: Mutex::new(Vec::new()),
        };
        let limiter = RateLimiter::new(Duration::from_millis(1));
        let cfg = config(false, true, 4, 2);
        let pipeline = EnrichmentPipeline::new(&transport, &limiter, &cfg);

        let (records, stats) = pipeline
            .enrich_all(
                vec![record("Acme", Some("0x1:0xa"))],
                &HashSet::new(),
                &no_cancel(),
                |_, _| {},
            )
            .await;

        assert_eq!(stats.enriched, 1);
        assert_eq!(records[0].reviews.len(), 4);
        // Two pages of two, not three
        assert_eq!(transport.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reviews_stop_on_short_page() {
        let transport = EnrichTransport {
            review_pages: vec![(vec!["A"], Some("tok-1"))],
            requests: Mutex::new(Vec::new()),
        };
        let limiter = RateLimiter::new(Duration::from_millis(1));
        let cfg = config(false, true, 10, 5);
        let pipeline = EnrichmentPipeline::new(&transport, &limiter, &cfg);

        let (records, _) = pipeline
            .enrich_all(
                vec![record("Acme", Some("0x1:0xa"))],
                &HashSet::new(),
                &no_cancel(),
                |_, _| {},
            )
            .await;

        assert_eq!(records[0].reviews.len(), 1);
        assert_eq!(transport.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_without_hex_id_skipped() {
        let transport = EnrichTransport {
            review_pages: vec![],
            requests: Mutex::new(Vec::new()),
        };
        let limiter = RateLimiter::new(Duration::from_millis(1));
        let cfg = config(true, true, 5, 5);
        let pipeline = EnrichmentPipeline::new(&transport, &limiter, &cfg);

        let (records, stats) = pipeline
            .enrich_all(
                vec![record("NoHex", None)],
                &HashSet::new(),
                &no_cancel(),
                |_, _| {},
            )
            .await;

        assert_eq!(stats.skipped, 1);
        assert!(records[0].phone.is_none());
        assert!(records[0].reviews.is_empty());
        // No requests at all for skipped records
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_already_enriched_skipped() {
        let transport = EnrichTransport {
            review_pages: vec![],
            requests: Mutex::new(Vec::new()),
        };
        let limiter = RateLimiter::new(Duration::from_millis(1));
        let cfg = config(true, false, 0, 5);
        let pipeline = EnrichmentPipeline::new(&transport, &limiter, &cfg);

        let mut already = HashSet::new();
        already.insert("pid-Acme".to_string());

        let (_, stats) = pipeline
            .enrich_all(
                vec![record("Acme", Some("0x1:0xa"))],
                &already,
                &no_cancel(),
                |_, _| {},
            )
            .await;

        assert_eq!(stats.already_enriched, 1);
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_enrichment_keeps_record() {
        struct BrokenTransport;
        impl Transport for BrokenTransport {
            async fn send(&self, _request: ApiRequest) -> Result<Bytes, TransportError> {
                Err(TransportError::Timeout {
                    url: "u".to_string(),
                })
            }
        }

        let limiter = RateLimiter::new(Duration::from_millis(1));
        let cfg = config(true, false, 0, 5);
        let pipeline = EnrichmentPipeline::new(&BrokenTransport, &limiter, &cfg);

        let (records, stats) = pipeline
            .enrich_all(
                vec![record("Acme", Some("0x1:0xa"))],
                &HashSet::new(),
                &no_cancel(),
                |_, _| {},
            )
            .await;

        assert_eq!(stats.failed, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Acme");
    }
}
