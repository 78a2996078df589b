use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::ContextError;

/// The year of the first issue, volume 1.
pub const INAUGURAL_YEAR: i32 = 2026;

/// First year of the Reiwa era minus one.
const REIWA_OFFSET: i32 = 2018;

/// Identity of a serial newsletter issue.
///
/// A volume spans one calendar year, the number restarts every year and the serial counts every
/// issue ever published.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssueNumber {
    pub year: i32,
    pub number: u32,
    pub serial: u32,
}

impl IssueNumber {
    pub fn new(year: i32, number: u32, serial: u32) -> Self {
        IssueNumber {
            year,
            number,
            serial,
        }
    }

    /// Like `new`, rejecting issues before the inaugural year and zero numbers or serials.
    pub fn checked(year: i32, number: u32, serial: u32) -> Result<Self, ContextError> {
        if year < INAUGURAL_YEAR {
            return Err(ContextError::with_context(format!(
                "The year {} precedes the inaugural year {}",
                year, INAUGURAL_YEAR
            )));
        }
        if number == 0 || serial == 0 {
            return Err(ContextError::with_context(format!(
                "Issue numbers and serials start at 1, got number {} and serial {}",
                number, serial
            )));
        }
        Ok(IssueNumber::new(year, number, serial))
    }

    pub fn volume(&self) -> i32 {
        self.year - INAUGURAL_YEAR + 1
    }

    /// `YYYY-NN.pdf`
    pub fn file_name(&self) -> String {
        format!("{}-{:02}.pdf", self.year, self.number)
    }

    pub fn serial_label(&self) -> String {
        serial_label(self.serial)
    }

    /// `第1巻 第1号（通巻第1号）`
    pub fn volume_line_ja(&self) -> String {
        volume_line_ja(self.volume(), self.number, self.serial)
    }

    /// `Vol.1  No.1  Serial #00001`
    pub fn volume_line(&self) -> String {
        format!(
            "Vol.{}  No.{}  Serial #{}",
            self.volume(),
            self.number,
            self.serial_label()
        )
    }

    /// The following issue of the same year.
    pub fn next(&self) -> Self {
        IssueNumber {
            year: self.year,
            number: self.number.saturating_add(1),
            serial: self.serial.saturating_add(1),
        }
    }
}

impl Default for IssueNumber {
    fn default() -> Self {
        IssueNumber::new(INAUGURAL_YEAR, 1, 1)
    }
}

/// Five zero-padded digits.
pub fn serial_label(serial: u32) -> String {
    format!("{serial:05}")
}

pub fn volume_line_ja(volume: impl std::fmt::Display, number: u32, serial: u32) -> String {
    format!("第{volume}巻 第{number}号（通巻第{serial}号）")
}

/// `TQ-00012.pdf`
pub fn tokiqr_file_name(serial: u32) -> String {
    format!("TQ-{}.pdf", serial_label(serial))
}

pub fn parse_date(date: &str) -> Option<Date> {
    Date::parse(date, format_description!("[year]-[month]-[day]")).ok()
}

/// Renders `YYYY-MM-DD` as `YYYY年M月D日`; anything else is returned unchanged.
pub fn format_japanese_date(date: &str) -> String {
    match parse_date(date) {
        Some(date) => format!(
            "{}年{}月{}日",
            date.year(),
            u8::from(date.month()),
            date.day()
        ),
        None => date.to_string(),
    }
}

/// `2026年（令和8年）2月13日`, or the verbatim string when it is not a `YYYY-MM-DD` date.
pub fn format_formal_date(date: &str) -> String {
    match parse_date(date) {
        Some(date) => format!(
            "{}年（令和{}年）{}月{}日",
            date.year(),
            date.year() - REIWA_OFFSET,
            u8::from(date.month()),
            date.day()
        ),
        None => date.to_string(),
    }
}

/// `2026年2月`
pub fn month_label(year: i32, month: u8) -> String {
    format!("{year}年{month}月")
}

/// `2026年（令和8年）2月`
pub fn formal_month_label(year: i32, month: u8) -> String {
    format!("{year}年（令和{}年）{month}月", year - REIWA_OFFSET)
}

/// Today's date as `YYYY-MM-DD` (UTC).
pub fn today() -> String {
    let today = OffsetDateTime::now_utc().date();
    format!(
        "{:04}-{:02}-{:02}",
        today.year(),
        u8::from(today.month()),
        today.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_of_the_inaugural_issue() {
        let issue = IssueNumber::default();
        assert_eq!(issue.volume(), 1);
        assert_eq!(issue.file_name(), "2026-01.pdf");
        assert_eq!(issue.volume_line_ja(), "第1巻 第1号（通巻第1号）");
        assert_eq!(issue.volume_line(), "Vol.1  No.1  Serial #00001");
    }

    #[test]
    fn volumes_count_years_from_the_inaugural_year() {
        let issue = IssueNumber::new(2027, 3, 14);
        assert_eq!(issue.volume(), 2);
        assert_eq!(issue.file_name(), "2027-03.pdf");
        assert_eq!(issue.serial_label(), "00014");
        assert_eq!(issue.next(), IssueNumber::new(2027, 4, 15));
        assert_eq!(IssueNumber::new(3026, 12, 99_999).file_name(), "3026-12.pdf");
    }

    #[test]
    fn issues_before_the_inaugural_year_are_rejected() {
        let error = IssueNumber::checked(2025, 1, 1).unwrap_err();
        assert!(error.context.contains("precedes the inaugural year 2026"));
        assert!(IssueNumber::checked(2026, 0, 1).is_err());
        assert!(IssueNumber::checked(2026, 1, 0).is_err());
        assert_eq!(IssueNumber::checked(2026, 2, 2).unwrap(), IssueNumber::new(2026, 2, 2));
    }

    #[test]
    fn the_next_issue_saturates_at_the_largest_serial() {
        let last = IssueNumber::new(2026, u32::MAX, u32::MAX);
        assert_eq!(last.next(), last);
    }

    #[test]
    fn tokiqr_files_are_named_after_the_serial() {
        assert_eq!(tokiqr_file_name(7), "TQ-00007.pdf");
        assert_eq!(tokiqr_file_name(123_456), "TQ-123456.pdf");
    }

    #[test]
    fn japanese_dates_drop_leading_zeros() {
        assert_eq!(format_japanese_date("2026-02-03"), "2026年2月3日");
        assert_eq!(format_formal_date("2026-02-13"), "2026年（令和8年）2月13日");
        assert_eq!(month_label(2026, 2), "2026年2月");
        assert_eq!(formal_month_label(2026, 2), "2026年（令和8年）2月");
    }

    #[test]
    fn unparsable_dates_are_kept_verbatim() {
        assert_eq!(format_japanese_date("2026年 春"), "2026年 春");
        assert_eq!(format_japanese_date("2026-13-01"), "2026-13-01");
        assert_eq!(format_formal_date(""), "");
    }

    #[test]
    fn today_is_an_iso_date() {
        assert!(parse_date(&today()).is_some());
    }
}
