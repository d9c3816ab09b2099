//! RSSI to distance approximation using the log-distance path-loss model.

/// Measured RSSI at one metre, in dBm.
///
/// Fixed calibration constant; the TX power a beacon advertises is not used.
pub const REFERENCE_POWER_1M: i8 = -40;

/// Free-space path-loss exponent.
pub const PATH_LOSS_EXPONENT: f64 = 2.0;

/// Estimated distance in metres for a received signal strength.
///
/// Positive RSSI readings are clamped to 0 dBm.
pub fn estimate(rssi: i8, ref_power: i8) -> f64 {
    let rssi = f64::from(rssi.min(0));
    let loss = rssi - f64::from(ref_power);
    10f64.powf(loss / (-10.0 * PATH_LOSS_EXPONENT))
}
