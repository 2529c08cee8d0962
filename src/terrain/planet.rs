//! Physical description of a planet.

use serde::{Deserialize, Serialize};

/// Earth sea-level pressure in hPa.
pub const EARTH_SURFACE_PRESSURE_HPA: f32 = 1013.25;

/// Atmospheres thinner than this (relative to Earth) are treated as airless.
pub const AIRLESS_DENSITY_THRESHOLD: f32 = 0.005;

/// Direction of the planet's spin relative to its orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationDirection {
    #[default]
    Prograde,
    Retrograde,
}

impl RotationDirection {
    pub fn sign(self) -> f32 {
        match self {
            RotationDirection::Prograde => 1.0,
            RotationDirection::Retrograde => -1.0,
        }
    }
}

/// Coarse surface water class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaterCoverage {
    None,
    Trace,
    Low,
    #[default]
    Moderate,
    High,
    Global,
}

impl WaterCoverage {
    /// Target fraction of cells below sea level.
    pub fn ocean_fraction(self) -> f32 {
        match self {
            WaterCoverage::None => 0.0,
            WaterCoverage::Trace => 0.05,
            WaterCoverage::Low => 0.25,
            WaterCoverage::Moderate => 0.5,
            WaterCoverage::High => 0.7,
            WaterCoverage::Global => 0.95,
        }
    }
}

/// Read-only physical constants for one planet.
///
/// Units: gravity in g (Earth = 1.0), radius in km, atmosphere density relative
/// to Earth sea level, temperatures in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetConfiguration {
    pub gravity: f32,
    pub radius_km: f32,
    pub atmosphere_density: f32,
    pub rotation_period_hours: f32,
    pub rotation: RotationDirection,
    pub axial_tilt_deg: f32,
    pub water_coverage: WaterCoverage,
    pub min_temperature_c: f32,
    pub max_temperature_c: f32,
    pub tidally_locked: bool,
    /// Fraction of the crust that is organic-rich (0..1). Carried for downstream classifiers.
    pub organics_fraction: f32,
    /// Fraction of surface water locked as ice (0..1).
    pub ice_fraction: f32,
    /// Written once by an external stage; the core only reads it.
    pub subsurface_ice_thickness_km: Option<f32>,
}

impl Default for PlanetConfiguration {
    fn default() -> Self {
        Self::earth_like()
    }
}

impl PlanetConfiguration {
    pub fn earth_like() -> Self {
        Self {
            gravity: 1.0,
            radius_km: 6371.0,
            atmosphere_density: 1.0,
            rotation_period_hours: 24.0,
            rotation: RotationDirection::Prograde,
            axial_tilt_deg: 23.44,
            water_coverage: WaterCoverage::High,
            min_temperature_c: -45.0,
            max_temperature_c: 35.0,
            tidally_locked: false,
            organics_fraction: 0.1,
            ice_fraction: 0.05,
            subsurface_ice_thickness_km: None,
        }
    }

    pub fn mars_like() -> Self {
        Self {
            gravity: 0.38,
            radius_km: 3390.0,
            atmosphere_density: 0.012,
            rotation_period_hours: 24.6,
            axial_tilt_deg: 25.2,
            water_coverage: WaterCoverage::None,
            min_temperature_c: -125.0,
            max_temperature_c: 20.0,
            organics_fraction: 0.0,
            ice_fraction: 0.6,
            ..Self::earth_like()
        }
    }

    pub fn moon_like() -> Self {
        Self {
            gravity: 0.165,
            radius_km: 1737.0,
            atmosphere_density: 0.0,
            rotation_period_hours: 655.7,
            axial_tilt_deg: 1.5,
            water_coverage: WaterCoverage::None,
            min_temperature_c: -170.0,
            max_temperature_c: 120.0,
            tidally_locked: true,
            organics_fraction: 0.0,
            ice_fraction: 0.0,
            ..Self::earth_like()
        }
    }

    pub fn venus_like() -> Self {
        Self {
            gravity: 0.9,
            radius_km: 6052.0,
            atmosphere_density: 65.0,
            rotation_period_hours: 5832.5,
            rotation: RotationDirection::Retrograde,
            axial_tilt_deg: 2.6,
            water_coverage: WaterCoverage::None,
            min_temperature_c: 440.0,
            max_temperature_c: 480.0,
            organics_fraction: 0.0,
            ice_fraction: 0.0,
            ..Self::earth_like()
        }
    }

    pub fn lava_world() -> Self {
        Self {
            gravity: 1.4,
            radius_km: 7200.0,
            atmosphere_density: 0.3,
            rotation_period_hours: 18.0,
            water_coverage: WaterCoverage::Moderate,
            min_temperature_c: 700.0,
            max_temperature_c: 1400.0,
            organics_fraction: 0.0,
            ice_fraction: 0.0,
            ..Self::earth_like()
        }
    }

    pub fn ice_world() -> Self {
        Self {
            gravity: 0.6,
            radius_km: 4100.0,
            atmosphere_density: 0.4,
            rotation_period_hours: 31.0,
            water_coverage: WaterCoverage::Global,
            min_temperature_c: -190.0,
            max_temperature_c: -120.0,
            organics_fraction: 0.2,
            ice_fraction: 1.0,
            ..Self::earth_like()
        }
    }

    pub fn tidally_locked_terran() -> Self {
        Self {
            rotation_period_hours: 250.0,
            tidally_locked: true,
            min_temperature_c: -80.0,
            max_temperature_c: 55.0,
            water_coverage: WaterCoverage::Moderate,
            ..Self::earth_like()
        }
    }

    /// Returns true when the atmosphere is too thin to carry wind or moisture.
    pub fn is_airless(&self) -> bool {
        self.atmosphere_density < AIRLESS_DENSITY_THRESHOLD
    }

    /// Returns true when surface temperatures never drop below the melting point of rock.
    pub fn is_molten(&self) -> bool {
        self.min_temperature_c > 600.0
    }

    /// Returns true when even the warmest surface stays frozen.
    pub fn is_frozen(&self) -> bool {
        self.max_temperature_c < -20.0
    }

    /// Mean of the configured temperature extremes.
    pub fn mean_temperature_c(&self) -> f32 {
        0.5 * (self.min_temperature_c + self.max_temperature_c)
    }

    /// Signed sidereal rotation rate in rad/s; retrograde spin is negative.
    ///
    /// Tidally locked planets report zero: their circulation is driven by the
    /// day/night contrast, not by spin.
    pub fn rotation_rate_rad_s(&self) -> f32 {
        if self.tidally_locked || self.rotation_period_hours <= 0.0 {
            return 0.0;
        }
        let period_s = self.rotation_period_hours * 3600.0;
        self.rotation.sign() * std::f32::consts::TAU / period_s
    }

    /// Equatorial surface rotation speed in m/s.
    pub fn rotation_speed_m_s(&self) -> f32 {
        if self.rotation_period_hours <= 0.0 {
            return 0.0;
        }
        std::f32::consts::TAU * self.radius_km * 1000.0 / (self.rotation_period_hours * 3600.0)
    }

    /// Mean sea-level surface pressure in hPa.
    pub fn surface_pressure_hpa(&self) -> f32 {
        EARTH_SURFACE_PRESSURE_HPA * self.atmosphere_density.max(0.0) * self.gravity
    }

    /// Total surface area in km².
    pub fn surface_area_km2(&self) -> f32 {
        4.0 * std::f32::consts::PI * self.radius_km * self.radius_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earth_rotation_rate_matches_sidereal_order_of_magnitude() {
        let earth = PlanetConfiguration::earth_like();
        let omega = earth.rotation_rate_rad_s();
        assert!((omega - 7.27e-5).abs() < 1e-6, "omega = {}", omega);
        assert!((earth.rotation_speed_m_s() - 463.3).abs() < 1.0);
    }

    #[test]
    fn retrograde_and_locked_rotation() {
        let venus = PlanetConfiguration::venus_like();
        assert!(venus.rotation_rate_rad_s() < 0.0);

        let locked = PlanetConfiguration::tidally_locked_terran();
        assert_eq!(locked.rotation_rate_rad_s(), 0.0);
    }

    #[test]
    fn airless_threshold() {
        assert!(PlanetConfiguration::moon_like().is_airless());
        assert!(!PlanetConfiguration::mars_like().is_airless());
        assert!(!PlanetConfiguration::earth_like().is_airless());
    }

    #[test]
    fn surface_pressure_scales_with_density_and_gravity() {
        let earth = PlanetConfiguration::earth_like();
        assert!((earth.surface_pressure_hpa() - EARTH_SURFACE_PRESSURE_HPA).abs() < 1e-3);
        let mars = PlanetConfiguration::mars_like();
        assert!(mars.surface_pressure_hpa() < 10.0);
    }

    #[test]
    fn water_coverage_fractions_are_ordered() {
        let order = [
            WaterCoverage::None,
            WaterCoverage::Trace,
            WaterCoverage::Low,
            WaterCoverage::Moderate,
            WaterCoverage::High,
            WaterCoverage::Global,
        ];
        for w in order.windows(2) {
            assert!(w[0].ocean_fraction() < w[1].ocean_fraction());
        }
    }
}
