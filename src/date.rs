//! Timestamp handling for the document info dictionary.

pub use time::{OffsetDateTime, UtcOffset};

/// Formats a date as the PDF `D:YYYYMMDDHHmmSS+HH'MM'` timestamp used by the
/// `/CreationDate` and `/ModDate` entries of the info dictionary.
pub(crate) fn to_pdf_time_stamp(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month};

    #[test]
    fn pdf_timestamp_positive_offset() {
        let datetime = Date::from_calendar_date(2017, Month::May, 8)
            .unwrap()
            .with_hms(15, 2, 24)
            .unwrap();

        assert_eq!(
            to_pdf_time_stamp(&datetime.assume_offset(UtcOffset::from_hms(2, 28, 15).unwrap())),
            "D:20170508150224+02'28'"
        );
        assert_eq!(
            to_pdf_time_stamp(&datetime.assume_utc()),
            "D:20170508150224+00'00'"
        );
    }

    #[test]
    fn pdf_timestamp_negative_offset() {
        let datetime = Date::from_calendar_date(2017, Month::May, 8)
            .unwrap()
            .with_hms(15, 2, 24)
            .unwrap()
            .assume_offset(UtcOffset::from_hms(-2, -20, -30).unwrap());

        assert_eq!(
            to_pdf_time_stamp(&datetime),
            "D:20170508150224-02'20'"
        );
    }
}
