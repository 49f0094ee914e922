//! Page-number pagination over an ordered result set.
//!
//! Resolution is forgiving: a missing or non-integer page number falls back to
//! the first page, and an integer outside `1..=num_pages` falls back to the last
//! page. There is always at least one page, even for an empty result set.

use std::num::IntErrorKind;

use serde::Serialize;

/// Number of posts shown on one listing page.
pub const POSTS_PER_PAGE: u64 = 3;

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> u64 {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Turn a raw `?page=` value into a valid page number.
    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let Some(raw) = raw else {
            return 1;
        };

        match raw.trim().parse::<i64>() {
            Ok(n) if n >= 1 && (n as u64) <= self.num_pages() => n as u64,
            Ok(_) => self.num_pages(),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => self.num_pages(),
                _ => 1,
            },
        }
    }

    /// `(offset, limit)` window of a resolved page number.
    pub fn window(&self, number: u64) -> (u64, u64) {
        let number = number.clamp(1, self.num_pages());
        ((number - 1) * self.per_page, self.per_page)
    }

    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: number.clamp(1, self.num_pages()),
            num_pages: self.num_pages(),
            count: self.count,
            per_page: self.per_page,
        }
    }
}

/// One page of results plus the navigation facts a view needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}
