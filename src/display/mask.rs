//! Redaction helpers for human-readable output
//!
//! Masked values are for display only and never reach hashing or disk.

/// Character substituted for hidden positions
pub const MASK_CHAR: char = '*';

/// Keep the first `show_first` and last `show_last` characters, mask the rest.
/// Values too short to hide anything are returned unchanged.
pub fn mask_string(input: &str, show_first: usize, show_last: usize) -> String {
    let len = input.chars().count();
    if len <= show_first + show_last {
        return input.to_string();
    }
    input
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i < show_first || i >= len - show_last {
                c
            } else {
                MASK_CHAR
            }
        })
        .collect()
}

/// Two-decimal amount with every integer digit except the last two masked
pub fn mask_amount(amount: f64) -> String {
    if amount == 0.0 {
        return "0.00".to_string();
    }
    let text = format!("{amount:.2}");
    let decimal_pos = text.find('.').unwrap_or(text.len());
    let visible_from = decimal_pos.saturating_sub(2);
    text.char_indices()
        .map(|(i, c)| {
            if i < visible_from && c.is_ascii_digit() {
                MASK_CHAR
            } else {
                c
            }
        })
        .collect()
}
