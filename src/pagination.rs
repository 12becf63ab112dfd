use crate::error::{ErrorMessage, HttpError};

/// Number of posts per listing page
pub const PAGE_SIZE: i64 = 10;

/// Splits `total` rows into fixed-size pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paginator {
    pub total: i64,
    pub per_page: i64,
}

/// One resolved page: its number plus the LIMIT/OFFSET that fetch it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Items of one page together with their position in the listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl Paginator {
    pub fn new(total: i64) -> Self {
        Paginator {
            total,
            per_page: PAGE_SIZE,
        }
    }

    /// An empty listing still has one (empty) page.
    pub fn num_pages(&self) -> i64 {
        if self.total <= 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    /// Resolves the raw `?page=` value: missing means 1, `last` means the
    /// last page, anything else must be a number within range.
    pub fn window(&self, requested: Option<&str>) -> Result<PageWindow, HttpError> {
        let num_pages = self.num_pages();
        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| HttpError::not_found(ErrorMessage::InvalidPage.to_string()))?,
        };

        if number < 1 || number > num_pages {
            return Err(HttpError::not_found(ErrorMessage::InvalidPage.to_string()));
        }

        Ok(PageWindow {
            number,
            num_pages,
            total: self.total,
            limit: self.per_page,
            offset: (number - 1) * self.per_page,
        })
    }
}

impl PageWindow {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous(&self) -> Option<i64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next(&self) -> Option<i64> {
        self.has_next().then(|| self.number + 1)
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Page { items, window }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(10, 1)]
    #[case(11, 2)]
    #[case(25, 3)]
    fn page_count(#[case] total: i64, #[case] expected: i64) {
        assert_eq!(Paginator::new(total).num_pages(), expected);
    }

    #[test]
    fn defaults_to_first_page() {
        let window = Paginator::new(25).window(None).unwrap();
        assert_eq!(window.number, 1);
        assert_eq!(window.offset, 0);
        assert_eq!(window.limit, PAGE_SIZE);
        assert_eq!(window.previous(), None);
        assert_eq!(window.next(), Some(2));
    }

    #[test]
    fn last_page_keyword() {
        let window = Paginator::new(25).window(Some("last")).unwrap();
        assert_eq!(window.number, 3);
        assert_eq!(window.offset, 20);
        assert!(!window.has_next());
        assert_eq!(window.previous(), Some(2));
    }

    #[test]
    fn empty_listing_has_a_first_page() {
        let window = Paginator::new(0).window(Some("1")).unwrap();
        assert_eq!(window.num_pages, 1);
        assert!(!window.has_next());
    }

    #[rstest]
    #[case("0")]
    #[case("4")]
    #[case("-1")]
    #[case("two")]
    fn invalid_pages_are_not_found(#[case] raw: &str) {
        let err = Paginator::new(25).window(Some(raw)).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
