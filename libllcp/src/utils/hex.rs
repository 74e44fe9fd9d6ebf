//! Hexadecimal rendering for trace logs.
//!
//! With the `diagnostics` feature, [`HexDump`] prints every byte; without
//! it only the frame length is shown so production logs stay short.

use std::fmt;

/// Convert a byte slice to a lowercase hex string with a single space
/// between each byte.
///
/// Example: `&[0xde, 0xad]` -> `"de ad"`
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    HexDump(bytes).to_string()
}

/// Lazily formatted frame dump, meant to be passed straight to `log` macros
/// so nothing is rendered when the level is disabled.
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// What trace logs print for a frame.
pub fn frame_summary(bytes: &[u8]) -> String {
    if cfg!(feature = "diagnostics") {
        format!("[{}] {}", bytes.len(), HexDump(bytes))
    } else {
        format!("[{} bytes]", bytes.len())
    }
}
