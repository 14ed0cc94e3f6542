//! Response handling
//!
//! Defines response codes and formatting for the command front end.

pub const SENDING: u16 = 150;
pub const OK: u16 = 200;
pub const LISTING: u16 = 211;
pub const HELP: u16 = 214;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const LOGIN_SUCCESS: u16 = 230;
pub const ACTION_OK: u16 = 250;
pub const TOO_MANY_CLIENTS: u16 = 421;
pub const INTERNAL_ERROR: u16 = 451;
pub const UNKNOWN_COMMAND: u16 = 500;
pub const SYNTAX_ERROR: u16 = 501;

/// Format a single-line response
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}

/// Format a multi-line response: `code-item` lines closed by `code End (n)`.
pub fn format_listing<I, S>(code: u16, items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    let mut count = 0;
    for item in items {
        out.push_str(&format!("{}-{}\r\n", code, item.as_ref()));
        count += 1;
    }
    out.push_str(&format!("{} End ({})\r\n", code, count));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_ends_with_count() {
        assert_eq!(
            format_listing(LISTING, ["A", "B"]),
            "211-A\r\n211-B\r\n211 End (2)\r\n"
        );
        assert_eq!(format_listing(LISTING, Vec::<String>::new()), "211 End (0)\r\n");
    }
}
