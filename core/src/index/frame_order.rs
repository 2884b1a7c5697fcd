//! Natural ordering and timestamps for frame names like `frame_0012.jpg`.

use std::cmp::Ordering;

/// First run of ASCII digits in `name`, if any.
pub fn frame_number(name: &str) -> Option<u64> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let number = name[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u64::from(digit))
        });
    Some(number)
}

/// Numeric order of the embedded frame number, names without one count as 0;
/// ties fall back to the full name.
pub fn compare_frames(left: &str, right: &str) -> Ordering {
    let left_number = frame_number(left).unwrap_or(0);
    let right_number = frame_number(right).unwrap_or(0);
    left_number
        .cmp(&right_number)
        .then_with(|| left.cmp(right))
}

pub fn sort_frames(frames: &mut [String]) {
    frames.sort_by(|left, right| compare_frames(left, right));
}

/// Display timestamp of a 1-based frame sampled every `interval_seconds`.
pub fn format_timestamp(name: &str, interval_seconds: f64) -> String {
    let index = frame_number(name).unwrap_or(0);
    let offset = index.saturating_sub(1) as f64 * interval_seconds;
    format_duration(offset)
}

/// `HH:MM:SS`; negative or non-finite input reads as zero.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_number_reads_first_digit_run() {
        assert_eq!(frame_number("frame_0012.jpg"), Some(12));
        assert_eq!(frame_number("cam2_frame_7.jpg"), Some(2));
        assert_eq!(frame_number("cover.jpg"), None);
    }

    #[test]
    fn numeric_order_beats_lexical_order() {
        let mut frames = vec![
            "frame_10.jpg".to_string(),
            "frame_2.jpg".to_string(),
            "frame_1.jpg".to_string(),
        ];
        sort_frames(&mut frames);
        assert_eq!(frames, vec!["frame_1.jpg", "frame_2.jpg", "frame_10.jpg"]);
    }

    #[test]
    fn ties_and_unnumbered_names_sort_lexically() {
        let mut frames = vec![
            "b_frame_3.jpg".to_string(),
            "poster.jpg".to_string(),
            "a_frame_3.jpg".to_string(),
            "frame_0.jpg".to_string(),
        ];
        sort_frames(&mut frames);
        assert_eq!(
            frames,
            vec!["frame_0.jpg", "poster.jpg", "a_frame_3.jpg", "b_frame_3.jpg"]
        );
    }

    #[test]
    fn timestamp_is_zero_based_offset() {
        assert_eq!(format_timestamp("frame_0001.jpg", 1.0), "00:00:00");
        assert_eq!(format_timestamp("frame_0062.jpg", 1.0), "00:01:01");
        assert_eq!(format_timestamp("frame_0000.jpg", 1.0), "00:00:00");
        assert_eq!(format_timestamp("frame_3.jpg", 0.5), "00:00:01");
        assert_eq!(format_timestamp("still.jpg", 1.0), "00:00:00");
    }

    #[test]
    fn duration_formats_hours() {
        assert_eq!(format_duration(3725.9), "01:02:05");
        assert_eq!(format_duration(-4.0), "00:00:00");
        assert_eq!(format_duration(f64::NAN), "00:00:00");
    }
}
