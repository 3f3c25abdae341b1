#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::Northeast,
    Direction::East,
    Direction::Southeast,
    Direction::South,
    Direction::Southwest,
    Direction::West,
    Direction::Northwest,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionDelta {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
}

/// Query shape shared by combat targeting and message delivery: a planar
/// radius and a vertical tile-layer reach, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub radius: i32,
    pub z_radius: i32,
}

impl Position {
    pub fn offset(self, delta: PositionDelta) -> Self {
        Self {
            x: self.x + delta.dx,
            y: self.y + delta.dy,
            z: self.z + delta.dz,
        }
    }

    pub fn step(self, direction: Direction) -> Self {
        self.offset(direction.delta())
    }

    /// Chebyshev (L-infinity) distance on the plane.
    pub fn plane_distance(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl Direction {
    pub fn delta(self) -> PositionDelta {
        match self {
            Direction::North => PositionDelta { dx: 0, dy: -1, dz: 0 },
            Direction::Northeast => PositionDelta { dx: 1, dy: -1, dz: 0 },
            Direction::East => PositionDelta { dx: 1, dy: 0, dz: 0 },
            Direction::Southeast => PositionDelta { dx: 1, dy: 1, dz: 0 },
            Direction::South => PositionDelta { dx: 0, dy: 1, dz: 0 },
            Direction::Southwest => PositionDelta { dx: -1, dy: 1, dz: 0 },
            Direction::West => PositionDelta { dx: -1, dy: 0, dz: 0 },
            Direction::Northwest => PositionDelta { dx: -1, dy: -1, dz: 0 },
        }
    }

    /// Reflect the x-component of the step; directions without an
    /// x-component are unchanged.
    pub fn mirror_x(self) -> Direction {
        match self {
            Direction::Northeast => Direction::Northwest,
            Direction::East => Direction::West,
            Direction::Southeast => Direction::Southwest,
            Direction::Southwest => Direction::Southeast,
            Direction::West => Direction::East,
            Direction::Northwest => Direction::Northeast,
            other => other,
        }
    }

    /// Reflect the y-component of the step; directions without a
    /// y-component are unchanged.
    pub fn mirror_y(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::Northeast => Direction::Southeast,
            Direction::Southeast => Direction::Northeast,
            Direction::South => Direction::North,
            Direction::Southwest => Direction::Northwest,
            Direction::Northwest => Direction::Southwest,
            other => other,
        }
    }

    /// One step toward `to`, or `None` when already there.
    pub fn toward(from: Position, to: Position) -> Option<Direction> {
        let dx = (to.x - from.x).signum();
        let dy = (to.y - from.y).signum();
        match (dx, dy) {
            (0, -1) => Some(Direction::North),
            (1, -1) => Some(Direction::Northeast),
            (1, 0) => Some(Direction::East),
            (1, 1) => Some(Direction::Southeast),
            (0, 1) => Some(Direction::South),
            (-1, 1) => Some(Direction::Southwest),
            (-1, 0) => Some(Direction::West),
            (-1, -1) => Some(Direction::Northwest),
            _ => None,
        }
    }
}

impl Range {
    pub fn planar(radius: i32) -> Self {
        Self { radius, z_radius: 0 }
    }

    pub fn contains(self, center: Position, pos: Position) -> bool {
        center.plane_distance(pos) <= self.radius && (center.z - pos.z).abs() <= self.z_radius
    }
}
