//! Shared helpers for climate computations.

/// Earth's sidereal rotation rate (rad/s), the reference for band strength.
pub const EARTH_ROTATION_RATE: f32 = 7.292e-5;

/// Water triple-point pressure (hPa). Below it liquid water cannot exist.
pub const TRIPLE_POINT_HPA: f32 = 6.117;

/// Seasonal phase sine wave for season `index` of `count` with fractional phase shift.
///
/// Returns values in [-1, 1]; +1 is northern summer.
pub fn season_phase_sin(index: u32, count: u32, phase: f32) -> f32 {
    let count = count.max(1) as f32;
    let frac = (index as f32 + 0.5) / count; // sample at season center
    (std::f32::consts::TAU * (frac + phase)).sin()
}

/// Saturation vapor pressure over water (Magnus formula), in hPa.
pub fn saturation_vapor_pressure_hpa(temperature_c: f32) -> f32 {
    let t = temperature_c.clamp(-80.0, 100.0);
    6.112 * (17.62 * t / (243.12 + t)).exp()
}

/// Vapor column (mm) that saturates a layer at `temperature_c`, thinned by a
/// sparse atmosphere.
pub fn saturation_column_mm(temperature_c: f32, atmosphere_density: f32) -> f32 {
    1.6 * saturation_vapor_pressure_hpa(temperature_c) * atmosphere_density.clamp(0.0, 1.0)
}

/// Boiling point of water (°C) at the given pressure, from Clausius–Clapeyron.
///
/// Returns `None` below the triple point, where water cannot be liquid at all.
pub fn boiling_point_c(pressure_hpa: f32) -> Option<f32> {
    if !(pressure_hpa >= TRIPLE_POINT_HPA) {
        return None;
    }
    // L / R for water, in kelvin.
    const L_OVER_R: f32 = 4889.0;
    let inv = 1.0 / 373.15 - (pressure_hpa / 1013.25).ln() / L_OVER_R;
    Some(1.0 / inv.max(1e-4) - 273.15)
}

/// Returns true when liquid water can exist at some point of the local day.
pub fn supports_liquid_water(temperature_max_c: f32, temperature_c: f32, pressure_hpa: f32) -> bool {
    match boiling_point_c(pressure_hpa) {
        Some(boiling) => temperature_max_c > 0.0 && temperature_c < boiling,
        None => false,
    }
}

/// Saturating magnitude clamp: `max * tanh(|v| / max)`.
pub fn soft_clamp(v: glam::Vec2, max: f32) -> glam::Vec2 {
    let len = v.length();
    if len < 1e-6 || max <= 0.0 {
        return if max <= 0.0 { glam::Vec2::ZERO } else { v };
    }
    v * (max * (len / max).tanh() / len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn boiling_point_at_sea_level_is_100c() {
        let b = boiling_point_c(1013.25).unwrap();
        assert!((b - 100.0).abs() < 0.5, "{}", b);
    }

    #[test]
    fn boiling_point_drops_with_pressure() {
        let high = boiling_point_c(1013.25).unwrap();
        let low = boiling_point_c(300.0).unwrap();
        assert!(low < high);
        assert_eq!(boiling_point_c(5.0), None);
        assert_eq!(boiling_point_c(f32::NAN), None);
    }

    #[test]
    fn liquid_water_window() {
        assert!(supports_liquid_water(20.0, 15.0, 1013.25));
        assert!(!supports_liquid_water(-5.0, -10.0, 1013.25));
        assert!(!supports_liquid_water(20.0, 15.0, 2.0));
        assert!(!supports_liquid_water(480.0, 460.0, 1013.25));
    }

    #[test]
    fn saturation_grows_with_temperature() {
        assert!(saturation_column_mm(30.0, 1.0) > saturation_column_mm(0.0, 1.0));
        assert!((saturation_vapor_pressure_hpa(0.0) - 6.112).abs() < 1e-3);
        assert_eq!(saturation_column_mm(30.0, 0.0), 0.0);
    }

    #[test]
    fn soft_clamp_saturates() {
        let v = soft_clamp(Vec2::new(400.0, 0.0), 40.0);
        assert!(v.length() <= 40.0 + 1e-3);
        let small = soft_clamp(Vec2::new(1.0, 0.0), 40.0);
        assert!((small.length() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn season_phase_is_bounded() {
        for i in 0..4 {
            let s = season_phase_sin(i, 4, 0.0);
            assert!((-1.0..=1.0).contains(&s));
        }
    }
}
