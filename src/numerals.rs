/// Arabic-Indic digits, indexed by value.
pub const ARABIC_INDIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

pub fn arabic_indic_digit_value(c: char) -> Option<u32> {
    ARABIC_INDIC_DIGITS
        .iter()
        .position(|digit| *digit == c)
        .map(|value| value as u32)
}

/// Concatenates the Arabic-Indic digits found in `value`, skipping everything
/// else. A string without any such digit yields 0.
pub fn arabic_numeral_to_int(value: &str) -> u64 {
    value
        .chars()
        .filter_map(arabic_indic_digit_value)
        .fold(0u64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u64::from(digit))
        })
}
