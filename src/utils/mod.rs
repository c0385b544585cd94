pub mod geo;

pub use geo::{haversine_km, is_valid_latitude, is_valid_longitude};

/// 颜色必须是 `#` 加 3 位或 6 位十六进制数字
pub fn is_hex_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(digits) => {
            (digits.len() == 3 || digits.len() == 6)
                && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_hex_color;

    #[test]
    fn accepts_short_and_long_hex() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#A1b2C3"));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(!is_hex_color("fff"));
        assert!(!is_hex_color("#ffff"));
        assert!(!is_hex_color("#12345g"));
        assert!(!is_hex_color("#"));
        assert!(!is_hex_color("#ａｂｃ"));
    }
}
