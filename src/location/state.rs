use chrono::{DateTime, Utc};

use crate::geo::Coordinates;

/// A reported position together with the time it was written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coordinates: Coordinates,
    pub last_update: DateTime<Utc>,
}

/// Per-vendor location record.
///
/// Coordinates and their timestamp live in one `Option<Position>`, so the
/// record can never hold one without the other.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VendorLocationState {
    pub active: bool,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactiveVendor;

impl VendorLocationState {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.position.map(|p| p.coordinates)
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.position.map(|p| p.last_update)
    }

    /// Records a new position stamped with `at`. Inactive vendors must
    /// reactivate first; the flag itself is left untouched.
    pub fn with_location(
        self,
        coordinates: Coordinates,
        at: DateTime<Utc>,
    ) -> Result<Self, InactiveVendor> {
        if !self.active {
            return Err(InactiveVendor);
        }
        Ok(Self {
            active: true,
            position: Some(Position {
                coordinates,
                last_update: at,
            }),
        })
    }

    /// Sets the active flag. Deactivation wipes the position.
    pub fn with_active(self, active: bool) -> Self {
        if active {
            Self {
                active: true,
                position: self.position,
            }
        } else {
            Self {
                active: false,
                position: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn coords() -> Coordinates {
        Coordinates::new(40.0, -75.0).unwrap()
    }

    #[test]
    fn new_record_is_inactive_without_position() {
        let s = VendorLocationState::default();
        assert!(!s.active);
        assert_eq!(s.coordinates(), None);
        assert_eq!(s.last_update(), None);
    }

    #[test]
    fn location_on_inactive_is_rejected() {
        let s = VendorLocationState::default();
        assert_eq!(s.with_location(coords(), at()), Err(InactiveVendor));
    }

    #[test]
    fn location_writes_coordinates_and_timestamp_together() {
        let s = VendorLocationState::default()
            .with_active(true)
            .with_location(coords(), at())
            .unwrap();
        assert!(s.active);
        assert_eq!(s.coordinates(), Some(coords()));
        assert_eq!(s.last_update(), Some(at()));
    }

    #[test]
    fn deactivation_always_clears_position() {
        let located = VendorLocationState::default()
            .with_active(true)
            .with_location(coords(), at())
            .unwrap();
        for prior in [VendorLocationState::default(), located, located.with_active(true)] {
            let s = prior.with_active(false);
            assert!(!s.active);
            assert_eq!(s.position, None);
        }
    }

    #[test]
    fn reactivation_keeps_current_position() {
        let located = VendorLocationState::default()
            .with_active(true)
            .with_location(coords(), at())
            .unwrap();
        assert_eq!(located.with_active(true), located);
    }
}
