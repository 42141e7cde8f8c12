//! Page-by-page collection of paginated directory listings.

use std::future::Future;

use crate::ports::{DirectoryError, PageRequest};

/// What a pagination loop gathered before it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome<T> {
    /// Items from every page that loaded, in page order.
    pub items: Vec<T>,
    /// Number of pages that loaded successfully.
    pub pages_fetched: u32,
    /// The failure that cut the loop short, if any.
    pub error: Option<DirectoryError>,
}

impl<T> PageOutcome<T> {
    /// All items, or the error if any page failed.
    ///
    /// # Errors
    ///
    /// Returns the page failure, discarding the partial items.
    pub fn into_result(self) -> Result<Vec<T>, DirectoryError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.items),
        }
    }
}

/// Fetches pages starting at page 1 until a page comes back shorter than
/// `per_page`, `max_pages` pages have loaded, or a page fails.
///
/// A failed page ends the loop; items from earlier pages are kept.
pub async fn collect_pages<T, F, Fut>(
    per_page: u32,
    max_pages: Option<u32>,
    mut fetch: F,
) -> PageOutcome<T>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Vec<T>, DirectoryError>>,
{
    let mut outcome = PageOutcome { items: Vec::new(), pages_fetched: 0, error: None };
    let mut page = 1;

    loop {
        if max_pages.is_some_and(|max| outcome.pages_fetched >= max) {
            break;
        }
        match fetch(PageRequest { page, per_page }).await {
            Ok(batch) => {
                outcome.pages_fetched += 1;
                let short = batch.len() < per_page as usize;
                outcome.items.extend(batch);
                if short {
                    break;
                }
                page += 1;
            }
            Err(e) => {
                outcome.error = Some(e);
                break;
            }
        }
    }

    outcome
}
