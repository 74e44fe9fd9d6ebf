//! Link timeout conversions.
//!
//! On the wire LTO counts units of 10 ms in a single byte; the rest of the
//! crate works with `Duration`.

use std::time::Duration;

use crate::constants::DEFAULT_LTO_MS;

/// One LTO unit in milliseconds
pub const LTO_UNIT_MS: u64 = 10;

/// Largest timeout a single LTO byte can express
pub const MAX_LTO_MS: u64 = 255 * LTO_UNIT_MS;

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Link timeout assumed when the peer sends no LTO
pub fn default_lto() -> Duration {
    ms(DEFAULT_LTO_MS)
}

/// Decode an LTO byte.
pub fn lto_to_duration(lto: u8) -> Duration {
    ms(u64::from(lto) * LTO_UNIT_MS)
}

/// Encode a timeout as an LTO byte, rounding down to 10 ms and saturating
/// at 2550 ms.
pub fn duration_to_lto(timeout: Duration) -> u8 {
    let units = timeout.as_millis() / u128::from(LTO_UNIT_MS);
    u8::try_from(units).unwrap_or(u8::MAX)
}
