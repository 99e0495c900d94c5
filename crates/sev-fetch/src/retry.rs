use std::time::Duration;

/// Delay before retry number `retry_count` (0-indexed): `base * 2^retry_count`.
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}
