use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Render a timestamp in the local offset when it can be determined, UTC
/// otherwise.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    at.to_offset(offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        input.to_string()
    } else {
        let mut out = input.chars().take(max.saturating_sub(1)).collect::<String>();
        out.push('…');
        out
    }
}
