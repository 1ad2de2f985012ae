// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

// Custom formatter function for hex display
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", truncate(to_hex(data)))
}

/// Lowercase hex without a prefix
pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Short hex label for log lines eg. `0x1a2b3c4d`
pub fn short_hex(data: &[u8]) -> String {
    let hex = to_hex(data);
    let end = hex.len().min(8);
    format!("0x{}", &hex[..end])
}

fn truncate(s: String) -> String {
    let threshold = 100;
    let limit = 50;
    let cutoff = limit / 2;
    if s.len() <= threshold {
        format!("0x{}", s)
    } else {
        let start = &s[..cutoff];
        let end = &s[s.len() - (limit - cutoff)..];
        format!("<bytes({}):0x{}..{}>", s.len(), start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hex<'a>(&'a [u8]);

    impl fmt::Display for Hex<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            hexf(self.0, f)
        }
    }

    #[test]
    fn short_values_are_printed_in_full() {
        assert_eq!(Hex(&[0xde, 0xad]).to_string(), "0xdead");
    }

    #[test]
    fn long_values_are_truncated() {
        let bytes = vec![0xab; 64];
        let out = Hex(&bytes).to_string();
        assert!(out.starts_with("<bytes(128):0xabab"));
        assert!(out.len() < 80);
    }

    #[test]
    fn short_hex_takes_four_bytes() {
        assert_eq!(short_hex(&[1, 2, 3, 4, 5, 6]), "0x01020304");
        assert_eq!(short_hex(&[0xff]), "0xff");
    }
}
