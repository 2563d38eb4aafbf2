use crate::error::{ReservationError, Result};
use serde::Serialize;

pub const MAX_PAGE_SIZE: usize = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Result<Self> {
        if page == 0 {
            return Err(ReservationError::Validation(
                "Page numbers start at 1".to_string(),
            ));
        }
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(ReservationError::Validation(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if (page - 1).checked_mul(size).is_none() {
            return Err(ReservationError::Validation(format!(
                "Page {page} is out of range"
            )));
        }
        Ok(Self { page, size })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.size
    }

    /// Cuts the requested page out of an already ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total_items = items.len();
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.size)
            .collect();
        Page {
            items,
            page: self.page,
            size: self.size,
            total_items,
            total_pages: total_items.div_ceil(self.size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Same paging metadata over a different item list (e.g. views built from
    /// the items of this page).
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_validation() {
        assert!(PageRequest::new(1, 10).is_ok());
        assert!(matches!(
            PageRequest::new(0, 10),
            Err(ReservationError::Validation(_))
        ));
        assert!(matches!(
            PageRequest::new(1, 0),
            Err(ReservationError::Validation(_))
        ));
        assert!(PageRequest::new(1, MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_huge_page_number_is_rejected() {
        assert!(matches!(
            PageRequest::new(usize::MAX, MAX_PAGE_SIZE),
            Err(ReservationError::Validation(_))
        ));
        // Still representable, just empty.
        let page = PageRequest::new(usize::MAX / MAX_PAGE_SIZE, MAX_PAGE_SIZE)
            .unwrap()
            .slice(vec![1, 2, 3]);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_second_page_holds_items_eleven_to_twenty() {
        let items: Vec<u32> = (1..=25).collect();
        let page = PageRequest::new(2, 10).unwrap().slice(items);

        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page = PageRequest::new(4, 10).unwrap().slice(vec![1, 2, 3]);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }
}
