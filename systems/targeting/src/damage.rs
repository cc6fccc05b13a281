//! Damage scaling.

/// Scales `base` damage by every multiplier and floors the result once.
///
/// Negative, NaN and infinite products deal no damage. Products beyond
/// `u32::MAX` saturate. Health bookkeeping is left to the caller.
#[must_use]
pub fn apply_damage(base: u32, multipliers: &[f32]) -> u32 {
    let scaled = multipliers
        .iter()
        .fold(f64::from(base), |damage, multiplier| {
            damage * f64::from(*multiplier)
        })
        .floor();

    if !scaled.is_finite() || scaled <= 0.0 {
        return 0;
    }

    if scaled >= f64::from(u32::MAX) {
        return u32::MAX;
    }

    scaled as u32
}
