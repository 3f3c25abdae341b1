use std::collections::VecDeque;

use crate::world::position::Position;

/// A predetermined waypoint sequence an entity follows instead of ad hoc
/// wandering or combat movement.
#[derive(Debug, Clone, Default)]
pub struct Route {
    waypoints: VecDeque<Position>,
}

impl Route {
    pub fn from_waypoints(waypoints: impl IntoIterator<Item = Position>) -> Self {
        Self {
            waypoints: waypoints.into_iter().collect(),
        }
    }

    pub fn next_waypoint(&self) -> Option<Position> {
        self.waypoints.front().copied()
    }

    /// Drop the front waypoint once the follower stands on it.
    pub fn arrive_at(&mut self, position: Position) {
        if self.waypoints.front() == Some(&position) {
            self.waypoints.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoints_pop_on_arrival_only() {
        let a = Position { x: 1, y: 1, z: 0 };
        let b = Position { x: 2, y: 1, z: 0 };
        let mut route = Route::from_waypoints([a, b]);
        assert_eq!(route.next_waypoint(), Some(a));
        route.arrive_at(b);
        assert_eq!(route.next_waypoint(), Some(a));
        route.arrive_at(a);
        assert_eq!(route.next_waypoint(), Some(b));
        route.arrive_at(b);
        assert!(route.is_empty());
    }
}
