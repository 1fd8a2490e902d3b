//! Month grids for the calendar view.
//!
//! Every month is drawn as six Sunday-first weeks, so the grid always has
//! 42 cells and spills into the neighbouring months on both ends.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::cache::RecordCache;
use crate::{DayId, Window};

pub const CELLS_PER_MONTH: usize = 6 * 7;

/// How many months from the end of the list a renderer may get before more
/// are loaded.
pub const MONTH_PREFETCH: usize = 2;

pub fn weekday_label(idx: usize) -> &'static str {
    match idx {
        0 => "SUN",
        1 => "MON",
        2 => "TUE",
        3 => "WED",
        4 => "THU",
        5 => "FRI",
        6 => "SAT",
        _ => "",
    }
}

/// `month` is 1-based
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    let last_current = first_next - Duration::days(1);
    Some(last_current.day())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub iso: DayId,
    pub day_of_month: u32,
    pub in_current_month: bool,
}

/// The 42 cells for month `month_index` (0-based) of `year`, starting on
/// the Sunday on or before the first of the month.
///
/// `None` for a month index past 11 or a grid that would leave the
/// representable years.
#[profiling::function]
pub fn build_month_matrix(year: i32, month_index: u32) -> Option<[DayCell; CELLS_PER_MONTH]> {
    let first = NaiveDate::from_ymd_opt(year, month_index.checked_add(1)?, 1)?;
    let start_offset = first.weekday().num_days_from_sunday() as i64;
    let grid_start = DayId::from_date(first)?.checked_shift(-start_offset)?;

    let cells = (0..CELLS_PER_MONTH as i64)
        .map(|i| {
            let iso = grid_start.checked_shift(i)?;
            Some(DayCell {
                iso,
                day_of_month: iso.day(),
                in_current_month: iso.month_index() == month_index,
            })
        })
        .collect::<Option<Vec<DayCell>>>()?;

    cells.try_into().ok()
}

/// A month section of the calendar, `offset_from_current` months before the
/// anchor's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthDef {
    pub year: i32,
    pub month_index: u32,
    pub offset_from_current: u32,
}

impl MonthDef {
    pub fn back_from(anchor: DayId, offset: u32) -> Option<Self> {
        let total = anchor.year() as i64 * 12 + anchor.month_index() as i64 - offset as i64;
        let year = i32::try_from(total.div_euclid(12)).ok()?;
        let month_index = total.rem_euclid(12) as u32;

        // reject years DayId can't represent
        DayId::from_ymd(year, month_index + 1, 1)?;

        Some(Self {
            year,
            month_index,
            offset_from_current: offset,
        })
    }

    pub fn first_day(&self) -> Option<DayId> {
        DayId::from_ymd(self.year, self.month_index + 1, 1)
    }

    pub fn last_day(&self) -> Option<DayId> {
        let days = days_in_month(self.year, self.month_index + 1)?;
        DayId::from_ymd(self.year, self.month_index + 1, days)
    }

    pub fn days_in_month(&self) -> Option<u32> {
        days_in_month(self.year, self.month_index + 1)
    }

    /// "June 2024"
    pub fn label(&self) -> String {
        match self.first_day() {
            Some(first) => first.date().format("%B %Y").to_string(),
            None => self.key(),
        }
    }

    /// Stable list key, `year-monthIndex`
    pub fn key(&self) -> String {
        format!("{}-{}", self.year, self.month_index)
    }

    pub fn matrix(&self) -> Option<[DayCell; CELLS_PER_MONTH]> {
        build_month_matrix(self.year, self.month_index)
    }
}

/// How the calendar lays out its months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthLayout {
    /// A fixed number of months, oldest first and the anchor month last.
    Bounded,

    /// Anchor month first, older months appended as the list scrolls.
    #[default]
    Infinite,
}

/// `count` consecutive months ending at the anchor's month. Never includes
/// a month after the anchor.
pub fn build_months(anchor: DayId, count: u32, layout: MonthLayout) -> Vec<MonthDef> {
    let offsets: Box<dyn Iterator<Item = u32>> = match layout {
        MonthLayout::Bounded => Box::new((0..count).rev()),
        MonthLayout::Infinite => Box::new(0..count),
    };

    offsets
        .filter_map(|offset| MonthDef::back_from(anchor, offset))
        .collect()
}

#[derive(Debug, Clone)]
pub struct MonthList {
    anchor: DayId,
    layout: MonthLayout,
    batch: u32,
    months: Vec<MonthDef>,
}

impl MonthList {
    pub fn new(anchor: DayId, initial: u32, batch: u32, layout: MonthLayout) -> Self {
        Self {
            anchor,
            layout,
            batch: batch.max(1),
            months: build_months(anchor, initial.max(1), layout),
        }
    }

    pub fn months(&self) -> &[MonthDef] {
        &self.months
    }

    pub fn layout(&self) -> MonthLayout {
        self.layout
    }

    pub fn anchor(&self) -> DayId {
        self.anchor
    }

    /// Whether a renderer showing month `last_visible` should ask for more.
    pub fn near_end(&self, last_visible: usize) -> bool {
        self.layout == MonthLayout::Infinite && last_visible + MONTH_PREFETCH >= self.months.len()
    }

    /// Append the next batch of older months. Bounded lists never grow.
    pub fn load_more_months(&mut self) -> bool {
        if self.layout == MonthLayout::Bounded {
            return false;
        }

        let max_offset = self
            .months
            .iter()
            .map(|m| m.offset_from_current)
            .max()
            .unwrap_or(0);

        let before = self.months.len();
        self.months.extend(
            (max_offset + 1..=max_offset + self.batch)
                .filter_map(|offset| MonthDef::back_from(self.anchor, offset)),
        );

        debug!(
            "MonthList::load_more_months: {} => {} months",
            before,
            self.months.len()
        );

        self.months.len() != before
    }

    /// Restart from the new anchor month, keeping the current length.
    pub fn reanchor(&mut self, anchor: DayId) -> bool {
        if anchor.year() == self.anchor.year() && anchor.month_index() == self.anchor.month_index()
        {
            self.anchor = anchor;
            return false;
        }

        let count = self.months.len() as u32;
        debug!("MonthList::reanchor: {} => {}", self.anchor, anchor);
        self.anchor = anchor;
        self.months = build_months(anchor, count, self.layout);
        true
    }

    /// Every day a displayed grid draws, spill-over cells included: the
    /// first cell of the oldest month to the last cell of the newest.
    pub fn window(&self) -> Option<Window> {
        let oldest = self.months.iter().max_by_key(|m| m.offset_from_current)?;
        let newest = self.months.iter().min_by_key(|m| m.offset_from_current)?;
        let start = oldest.matrix()?.first()?.iso;
        let end = newest.matrix()?.last()?.iso;
        Some(Window::new(start, end))
    }
}

/// Everything a renderer needs to draw one calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView<'a> {
    pub cell: DayCell,
    pub is_today: bool,
    pub is_future: bool,
    /// Tapping opens the day
    pub navigable: bool,
    pub cover: Option<&'a str>,
}

/// Future days are never navigable and never show a cover, whatever the
/// cache says about them.
pub fn cell_view(cell: DayCell, today: DayId, cache: &RecordCache) -> CellView<'_> {
    let is_future = cell.iso.is_future(today);
    let cover = if is_future {
        None
    } else {
        cache.lookup(cell.iso).cover_ref()
    };

    CellView {
        cell,
        is_today: cell.iso == today,
        is_future,
        navigable: !is_future,
        cover,
    }
}
