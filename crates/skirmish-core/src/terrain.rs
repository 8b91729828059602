//! Reachability queries.
//!
//! The core never computes paths. It only asks the host whether one point can
//! reach another in a straight line (a navmesh raycast in a full game), which
//! gates attacks, heals and resurrection through walls.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Line-of-reach provider.
pub trait Terrain: Send + Sync {
    /// Returns true if nothing blocks the straight segment `from -> to`.
    fn can_reach(&self, from: Vec2, to: Vec2) -> bool;
}

/// Terrain without obstacles.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTerrain;

impl Terrain for OpenTerrain {
    fn can_reach(&self, _from: Vec2, _to: Vec2) -> bool {
        true
    }
}

/// A wall segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// First endpoint.
    pub start: Vec2,
    /// Second endpoint.
    pub end: Vec2,
}

impl Wall {
    /// Creates a wall between two points.
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Returns true if segment `a -> b` crosses or touches this wall.
    #[must_use]
    pub fn blocks(&self, a: Vec2, b: Vec2) -> bool {
        let d1 = orientation(self.start, self.end, a);
        let d2 = orientation(self.start, self.end, b);
        let d3 = orientation(a, b, self.start);
        let d4 = orientation(a, b, self.end);

        if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
        {
            return true;
        }

        // collinear touching cases
        (d1 == 0.0 && on_segment(self.start, self.end, a))
            || (d2 == 0.0 && on_segment(self.start, self.end, b))
            || (d3 == 0.0 && on_segment(a, b, self.start))
            || (d4 == 0.0 && on_segment(a, b, self.end))
    }
}

fn orientation(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Terrain made of blocking wall segments.
///
/// # Example
///
/// ```
/// use skirmish_core::terrain::{Terrain, Wall, WalledTerrain};
/// use glam::Vec2;
///
/// let terrain = WalledTerrain::new(vec![Wall::new(Vec2::new(5.0, -5.0), Vec2::new(5.0, 5.0))]);
/// assert!(!terrain.can_reach(Vec2::ZERO, Vec2::new(10.0, 0.0)));
/// assert!(terrain.can_reach(Vec2::ZERO, Vec2::new(0.0, 10.0)));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalledTerrain {
    walls: Vec<Wall>,
}

impl WalledTerrain {
    /// Creates terrain from walls.
    #[must_use]
    pub fn new(walls: Vec<Wall>) -> Self {
        Self { walls }
    }

    /// Adds a wall.
    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.push(wall);
    }

    /// All walls.
    #[must_use]
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }
}

impl Terrain for WalledTerrain {
    fn can_reach(&self, from: Vec2, to: Vec2) -> bool {
        !self.walls.iter().any(|wall| wall.blocks(from, to))
    }
}
