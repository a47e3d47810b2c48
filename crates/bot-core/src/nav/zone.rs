//! Static data for the scripted zone route.
//!
//! Thresholds were tuned against boundaries measured on the live server:
//!
//! limbo: spawn z = -999.5, portal entry z = -997.5, kick zone past -997.0
//! lobby: spawn z =    4.6, portal entry z =    1.5, kick zone past    1.0
//!
//! Each `safe_threshold` stops the walker strictly inside the zone interior;
//! the margin to the kick boundary is the only buffer against poll latency,
//! so these values must not be rounded or "cleaned up".

use crate::client::{Axis, Vec3};

/// Which side of `safe_threshold` counts as "out of the zone" for the
/// direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    Above,
    Below,
}

#[derive(Debug, Clone)]
pub struct ZoneDescriptor {
    pub name: &'static str,
    pub axis: Axis,
    pub cross: Cross,
    /// Coordinate at which the walker must cut locomotion.
    pub safe_threshold: f64,
    /// Expected landing coordinate on `axis` after teleporting into the zone,
    /// used for the crash-recovery check.
    pub arrival_coord: f64,
}

impl ZoneDescriptor {
    pub fn crossed(&self, coord: f64) -> bool {
        match self.cross {
            Cross::Above => coord > self.safe_threshold,
            Cross::Below => coord < self.safe_threshold,
        }
    }

    /// True when `pos` already sits near this zone's landing point, i.e. the
    /// teleport into the zone happened before we started watching for it
    /// (typically right after a crash-recovery reconnect).
    pub fn contains(&self, pos: &Vec3, slack: f64) -> bool {
        (pos.axis(self.axis) - self.arrival_coord).abs() < slack
    }
}

/// The fixed route out to the main world: limbo first, then the lobby.
pub fn scripted_route() -> Vec<ZoneDescriptor> {
    vec![
        ZoneDescriptor {
            name: "limbo",
            axis: Axis::Z,
            cross: Cross::Above,
            safe_threshold: -998.0,
            arrival_coord: -999.0,
        },
        ZoneDescriptor {
            name: "lobby",
            axis: Axis::Z,
            cross: Cross::Below,
            safe_threshold: 2.0,
            arrival_coord: 4.6,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_respects_direction_of_travel() {
        let limbo = &scripted_route()[0];
        assert!(!limbo.crossed(-999.2));
        assert!(!limbo.crossed(-998.0));
        assert!(limbo.crossed(-997.9));

        let lobby = &scripted_route()[1];
        assert!(!lobby.crossed(4.1));
        assert!(!lobby.crossed(2.0));
        assert!(lobby.crossed(1.9));
    }

    #[test]
    fn contains_checks_only_the_zone_axis() {
        let limbo = &scripted_route()[0];
        let at_spawn = Vec3 { x: 120.0, y: 100.0, z: -999.5 };
        let elsewhere = Vec3 { x: 0.0, y: 64.0, z: 0.5 };
        assert!(limbo.contains(&at_spawn, 20.0));
        assert!(!limbo.contains(&elsewhere, 20.0));
    }

    #[test]
    fn route_constants_are_pinned() {
        let route = scripted_route();
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].safe_threshold, -998.0);
        assert_eq!(route[1].safe_threshold, 2.0);
    }
}
