//! Offset/limit pagination helper
//!
//! Keeps requesting pages until the provider returns a short (or empty) page.
//! A maximum iteration count guards against endpoints that ignore `offset`.

use std::future::Future;
use tracing::debug;

use super::{ApiError, ApiResult};

/// Maximum number of pages fetched by one pagination run
pub const MAX_PAGES: usize = 1_000;

/// Collect every item of an offset/limit paginated resource
///
/// # Arguments
/// * `page_size` - `limit` sent with every page request
/// * `fetch_page` - Fetches the page at `(offset, limit)`
pub async fn collect_offset_pages<T, F, Fut>(page_size: u32, mut fetch_page: F) -> ApiResult<Vec<T>>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = ApiResult<Vec<T>>>,
{
    let mut items = Vec::new();
    let mut offset = 0u32;

    for page in 0..MAX_PAGES {
        let batch = fetch_page(offset, page_size).await?;
        let received = batch.len();
        debug!("Page {} at offset {}: {} items", page + 1, offset, received);

        items.extend(batch);

        if received < page_size as usize {
            debug!("Pagination complete after {} pages, {} items", page + 1, items.len());
            return Ok(items);
        }

        offset = offset.saturating_add(page_size);
    }

    Err(ApiError::PaginationLimit(MAX_PAGES))
}
