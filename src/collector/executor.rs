//! Per-cell search execution
//!
//! For one cell the executor builds the packed search request, decodes each
//! response page into records, and pushes every record to the caller as soon
//! as its page arrives, so partial cell progress survives a mid-cell
//! failure. Pagination advances by the page size until a short page, the
//! reported total, or the page cap.

use crate::codec::{encode, QueryField};
use crate::collector::limiter::RateLimiter;
use crate::extract::{extract_search_page, parse_payload};
use crate::net::{ApiRequest, Transport};
use crate::record::BusinessRecord;
use crate::state::Cell;

const SEARCH_BASE: &str = "https://www.google.com/search";

/// Screen dimensions reported in the viewport block
const VIEWPORT_WIDTH: i64 = 1024;
const VIEWPORT_HEIGHT: i64 = 768;
const VIEWPORT_ZOOM: f64 = 13.1;

/// Upper bound on pages per cell; a provider that keeps returning full
/// pages past this point is feeding us junk
const MAX_PAGES: u32 = 50;

/// Query parameters shared by every cell in a run
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Category text, e.g. "lawyers"
    pub text: String,
    /// Results requested per page
    pub page_size: u32,
    /// Viewport distance in meters
    pub viewport_dist: u32,
}

/// Successful sweep summary
#[derive(Debug)]
pub struct CellSweep {
    pub pages: u32,
    pub found: usize,
}

/// A failed sweep; the cell keeps any records delivered before the failure
#[derive(Debug)]
pub struct CellFailure {
    pub message: String,
    pub rate_limited: bool,
    /// Response shape did not match the extractor's expectations
    pub structural: bool,
}

/// Executes paginated searches for single cells
pub struct SearchExecutor<'a, T: Transport> {
    transport: &'a T,
    limiter: &'a RateLimiter,
    query: &'a SearchQuery,
}

impl<'a, T: Transport> SearchExecutor<'a, T> {
    pub fn new(transport: &'a T, limiter: &'a RateLimiter, query: &'a SearchQuery) -> Self {
        Self {
            transport,
            limiter,
            query,
        }
    }

    /// Sweeps one cell, invoking `on_record` for every record as its page
    /// arrives. Waits on the limiter channel before every request.
    pub async fn sweep_cell(
        &self,
        cell: &Cell,
        mut on_record: impl FnMut(BusinessRecord),
    ) -> Result<CellSweep, CellFailure> {
        let mut offset: u32 = 0;
        let mut pages: u32 = 0;
        let mut found: usize = 0;

        loop {
            self.limiter.wait().await;

            let fields = build_search_fields(self.query, cell, offset);
            let url = search_url(&self.query.text, &fields);

            let bytes = match self.transport.send(ApiRequest::new(url)).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let rate_limited = e.is_rate_limit();
                    self.limiter.record_failure(rate_limited);
                    return Err(CellFailure {
                        message: e.to_string(),
                        rate_limited,
                        structural: false,
                    });
                }
            };

            let page = match parse_payload(&bytes)
                .and_then(|data| extract_search_page(&data, &cell.region))
            {
                Ok(page) => page,
                Err(e) => {
                    self.limiter.record_failure(false);
                    return Err(CellFailure {
                        message: e.to_string(),
                        rate_limited: false,
                        structural: true,
                    });
                }
            };

            self.limiter.record_success();
            pages += 1;

            let count = page.records.len();
            found += count;
            for record in page.records {
                on_record(record);
            }

            if count < self.query.page_size as usize {
                break;
            }
            offset += self.query.page_size;

            if let Some(total) = page.total_hint {
                if u64::from(offset) >= total {
                    break;
                }
            }
            if pages >= MAX_PAGES {
                tracing::warn!(
                    "Cell {}: stopping after {} full pages, provider never reported a short page",
                    cell.id,
                    pages
                );
                break;
            }
        }

        Ok(CellSweep { pages, found })
    }
}

/// Builds the search request's field tree in the provider's layout:
/// query text, viewport block, paging, flags, and the filter block carrying
/// the cell's search radius.
pub fn build_search_fields(query: &SearchQuery, cell: &Cell, offset: u32) -> Vec<QueryField> {
    vec![
        QueryField::string(1, percent_encode(&query.text)),
        QueryField::message(
            4,
            vec![
                QueryField::message(
                    1,
                    vec![
                        QueryField::double(1, f64::from(query.viewport_dist)),
                        QueryField::double(2, cell.longitude),
                        QueryField::double(3, cell.latitude),
                    ],
                ),
                QueryField::message(
                    3,
                    vec![
                        QueryField::int(1, VIEWPORT_WIDTH),
                        QueryField::int(2, VIEWPORT_HEIGHT),
                    ],
                ),
                QueryField::float(4, VIEWPORT_ZOOM),
            ],
        ),
        QueryField::int(7, i64::from(query.page_size)),
        QueryField::int(8, i64::from(offset)),
        QueryField::boolean(10, true),
        QueryField::message(
            6,
            vec![
                QueryField::boolean(49, true),
                QueryField::boolean(66, true),
                QueryField::int(74, i64::from(cell.radius_meters)),
                QueryField::boolean(85, true),
            ],
        ),
    ]
}

/// Assembles the search URL from the plain query and the encoded field tree
pub fn search_url(text: &str, fields: &[QueryField]) -> String {
    let q: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("q", text)
        .finish();
    format!(
        "{SEARCH_BASE}?tbm=map&authuser=0&hl=en&gl=us&{q}&pb={}",
        encode(fields)
    )
}

/// RFC 3986 percent-encoding for values embedded inside the packed string
pub(crate) fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}
