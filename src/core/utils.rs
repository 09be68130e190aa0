use chrono::{DateTime, FixedOffset, Local};

pub fn datetime_to_string(datetime: DateTime<FixedOffset>) -> String {
    datetime
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub fn datetime_to_string_opt(datetime: Option<DateTime<FixedOffset>>) -> Option<String> {
    datetime.map(datetime_to_string)
}

/// 1-based page number clamped to at least 1, page size clamped to `1..=max`.
pub fn page_params(
    page: Option<u32>,
    page_size: Option<u32>,
    default_size: u32,
    max_size: u32,
) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(default_size).clamp(1, max_size);
    (page, page_size)
}
