use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DatePickerError {
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DateSelection {
    #[default]
    Empty,
    CheckIn {
        check_in: NaiveDate,
    },
    Range {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
}

impl DateSelection {
    /// Days before `today` are disabled, so clicks on them are ignored.
    pub fn click(self, date: NaiveDate, today: NaiveDate) -> Self {
        if date < today {
            return self;
        }

        match self {
            DateSelection::CheckIn { check_in } if date > check_in => DateSelection::Range {
                check_in,
                check_out: date,
            },
            _ => DateSelection::CheckIn { check_in: date },
        }
    }

    /// Replays pre-filled search values through [`DateSelection::click`].
    pub fn from_stay(
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        [check_in, check_out]
            .into_iter()
            .flatten()
            .fold(DateSelection::Empty, |selection, date| selection.click(date, today))
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        match *self {
            DateSelection::Empty => None,
            DateSelection::CheckIn { check_in } | DateSelection::Range { check_in, .. } => {
                Some(check_in)
            }
        }
    }

    pub fn check_out(&self) -> Option<NaiveDate> {
        match *self {
            DateSelection::Range { check_out, .. } => Some(check_out),
            _ => None,
        }
    }

    pub fn stay(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            DateSelection::Range { check_in, check_out } => Some((check_in, check_out)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stay().is_some()
    }

    pub fn nights(&self) -> Option<i64> {
        self.stay().map(|(check_in, check_out)| (check_out - check_in).num_days())
    }

    /// Whether `date` lies within the selected range, both ends included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            DateSelection::Empty => false,
            DateSelection::CheckIn { check_in } => date == check_in,
            DateSelection::Range { check_in, check_out } => check_in <= date && date <= check_out,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub disabled: bool,
    pub selected: bool,
    pub in_range: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Monday-first rows of seven; `None` pads days outside the month.
    pub weeks: Vec<Vec<Option<DayCell>>>,
}

impl MonthView {
    pub fn build(
        year: i32,
        month: u32,
        selection: &DateSelection,
        today: NaiveDate,
    ) -> Result<Self, DatePickerError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(DatePickerError::InvalidMonth { year, month })?;
        let next = first
            .checked_add_months(Months::new(1))
            .ok_or(DatePickerError::InvalidMonth { year, month })?;

        let lead = first.weekday().num_days_from_monday() as usize;
        let mut cells: Vec<Option<DayCell>> = vec![None; lead];

        let (check_in, check_out) = (selection.check_in(), selection.check_out());
        for date in first.iter_days().take_while(|d| *d < next) {
            cells.push(Some(DayCell {
                date,
                disabled: date < today,
                selected: Some(date) == check_in || Some(date) == check_out,
                in_range: matches!(
                    (check_in, check_out),
                    (Some(a), Some(b)) if a < date && date < b
                ),
                is_today: date == today,
            }));
        }

        while cells.len() % 7 != 0 {
            cells.push(None);
        }

        Ok(Self {
            year,
            month,
            weeks: cells.chunks(7).map(<[_]>::to_vec).collect(),
        })
    }

    pub fn next(
        &self,
        selection: &DateSelection,
        today: NaiveDate,
    ) -> Result<Self, DatePickerError> {
        self.shift(1, selection, today)
    }

    pub fn prev(
        &self,
        selection: &DateSelection,
        today: NaiveDate,
    ) -> Result<Self, DatePickerError> {
        self.shift(-1, selection, today)
    }

    fn shift(
        &self,
        by: i32,
        selection: &DateSelection,
        today: NaiveDate,
    ) -> Result<Self, DatePickerError> {
        let index = self.year * 12 + self.month as i32 - 1 + by;
        Self::build(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, selection, today)
    }
}
