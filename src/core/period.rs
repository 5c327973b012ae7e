use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// `date` moved back by whole calendar months, clamped to the end of shorter months.
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Number of complete calendar months from `from` to `to` (zero when `to <= from`).
pub fn whole_months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Look-back windows shared by return calculation and candle charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ReturnPeriod {
    OneMonth,
    SixMonths,
    OneYear,
    ThreeYears,
    FiveYears,
    AllTime,
}

impl ReturnPeriod {
    pub const ALL: [ReturnPeriod; 6] = [
        ReturnPeriod::OneMonth,
        ReturnPeriod::SixMonths,
        ReturnPeriod::OneYear,
        ReturnPeriod::ThreeYears,
        ReturnPeriod::FiveYears,
        ReturnPeriod::AllTime,
    ];

    /// Calendar months covered by the window. `None` for [`ReturnPeriod::AllTime`],
    /// whose length depends on the series.
    pub fn months(&self) -> Option<u32> {
        match self {
            ReturnPeriod::OneMonth => Some(1),
            ReturnPeriod::SixMonths => Some(6),
            ReturnPeriod::OneYear => Some(12),
            ReturnPeriod::ThreeYears => Some(36),
            ReturnPeriod::FiveYears => Some(60),
            ReturnPeriod::AllTime => None,
        }
    }
}

impl Display for ReturnPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ReturnPeriod::OneMonth => "1M",
                ReturnPeriod::SixMonths => "6M",
                ReturnPeriod::OneYear => "1Y",
                ReturnPeriod::ThreeYears => "3Y",
                ReturnPeriod::FiveYears => "5Y",
                ReturnPeriod::AllTime => "ALL",
            }
        )
    }
}

impl FromStr for ReturnPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1M" => Ok(ReturnPeriod::OneMonth),
            "6M" => Ok(ReturnPeriod::SixMonths),
            "1Y" => Ok(ReturnPeriod::OneYear),
            "3Y" => Ok(ReturnPeriod::ThreeYears),
            "5Y" => Ok(ReturnPeriod::FiveYears),
            "ALL" => Ok(ReturnPeriod::AllTime),
            _ => Err(anyhow::anyhow!("Invalid return period: {}", s)),
        }
    }
}
