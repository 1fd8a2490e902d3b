//! The endless list of days behind the grid and list views.
//!
//! Days are generated from the anchor ("today") backwards, a page at a time,
//! whether or not they have a record. Records are overlaid later from the
//! cache.

use tracing::debug;

use crate::DayId;

/// Page `page_index` of the backward day sequence: element `i` is
/// `anchor - (page_index * page_size + i)` days.
///
/// The sequence stops at the first representable day, so pages that reach
/// past it come back short.
#[profiling::function]
pub fn seed_page(page_index: usize, page_size: usize, anchor: DayId) -> Vec<DayId> {
    let Some(start) = (page_index as u64).checked_mul(page_size as u64) else {
        return Vec::new();
    };

    (0..page_size as u64)
        .map_while(|i| anchor.checked_days_ago(start.checked_add(i)?))
        .collect()
}

/// Running, append-only list of day ids, newest first.
#[derive(Debug, Clone)]
pub struct DateFeed {
    anchor: DayId,
    page_size: usize,
    pages_loaded: usize,
    days: Vec<DayId>,
}

impl DateFeed {
    pub fn new(anchor: DayId, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            anchor,
            page_size,
            pages_loaded: 1,
            days: seed_page(0, page_size, anchor),
        }
    }

    pub fn anchor(&self) -> DayId {
        self.anchor
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    pub fn days(&self) -> &[DayId] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Append the next page and return it. The page counter moves before
    /// the page is built, so every call extends by a fresh page.
    pub fn load_more(&mut self) -> &[DayId] {
        let page = self.pages_loaded;
        self.pages_loaded += 1;

        let start = self.days.len();
        let next = seed_page(page, self.page_size, self.anchor);
        self.days.extend(next);

        debug!(
            "DateFeed::load_more: page {page}, {} days total",
            self.days.len()
        );

        &self.days[start..]
    }

    /// Move the anchor (the day rolled over). Returns false when nothing
    /// changed; otherwise the list restarts from page zero.
    pub fn reanchor(&mut self, anchor: DayId) -> bool {
        if anchor == self.anchor {
            return false;
        }

        debug!("DateFeed::reanchor: {} => {}", self.anchor, anchor);
        *self = Self::new(anchor, self.page_size);
        true
    }
}
