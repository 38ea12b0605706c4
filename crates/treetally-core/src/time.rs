use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

pub fn now_utc_rfc3339() -> Result<String, time::error::Format> {
    OffsetDateTime::now_utc().format(&Rfc3339)
}

/// Timestamp safe to embed in a directory name, e.g. `20260214T101500Z`.
pub fn now_utc_compact() -> Result<String, time::error::Format> {
    OffsetDateTime::now_utc().format(format_description!(
        "[year][month][day]T[hour][minute][second]Z"
    ))
}
