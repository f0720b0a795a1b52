//! Calendar helpers for archive labels and playlist titles.

use chrono::NaiveDate;

use crate::error::{Result, TimeuhError};

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// French name of a month (1-based), lowercase
pub fn month_name_fr(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTHS_FR.get(index).copied()
}

/// Uppercase the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Check that the parts form a real calendar date
pub fn validate_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        TimeuhError::invalid_input(format!(
            "{:04}-{:02}-{:02} is not a valid date",
            year, month, day
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names() {
        assert_eq!(month_name_fr(1), Some("janvier"));
        assert_eq!(month_name_fr(12), Some("décembre"));
        assert_eq!(month_name_fr(0), None);
        assert_eq!(month_name_fr(13), None);
    }

    #[test]
    fn capitalizes_accented_letters() {
        assert_eq!(capitalize("août"), "Août");
        assert_eq!(capitalize("été"), "Été");
        assert_eq!(capitalize(""), "");
    }
}
