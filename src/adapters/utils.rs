//! Shared string checks for adapter-layer validation.

/// Every byte in `0x20..=0x7E`.  Used for the AP SSID and password.
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Printable and free of the characters that would split an
/// `application/x-www-form-urlencoded` body.
pub(super) fn is_form_safe(s: &str) -> bool {
    is_printable_ascii(s) && !s.bytes().any(|b| matches!(b, b'&' | b'=' | b'+' | b'%'))
}
