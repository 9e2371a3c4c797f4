use crate::device::constants::RX_MARKER;

/// Decode a notification payload as UTF-8, dropping invalid byte sequences, and trim surrounding
/// whitespace.
pub fn decode_notification(payload: &[u8]) -> String {
    let mut text = String::with_capacity(payload.len());

    for chunk in payload.utf8_chunks() {
        text.push_str(chunk.valid());
    }

    text.trim().to_string()
}

pub fn print_received(message: &str) {
    println!("{} {}", RX_MARKER, message);
}
