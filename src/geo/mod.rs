use thiserror::Error;

/// 地球半径（英里）
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude must be a finite number between -90 and 90, got {0}")]
    Latitude(f64),
    #[error("longitude must be a finite number between -180 and 180, got {0}")]
    Longitude(f64),
}

/// 经纬度坐标（度）。只能通过 [`Coordinates::new`] 构造，保证数值合法。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        distance_miles(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Great-circle distance in miles between two points given in degrees.
///
/// NaN inputs propagate as NaN; callers validate through [`Coordinates::new`].
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // Haversine 公式
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}
