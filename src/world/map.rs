use std::collections::HashSet;

use crate::world::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub blocked: bool,
}

/// Narrow map contract consumed by the tick phases. `None` means the
/// field does not exist (edge of world or unloaded chunk) and is ignored
/// at non-fatal call sites.
pub trait WorldMap: Send {
    fn field_at(&self, position: Position) -> Option<Field>;

    fn is_walkable(&self, position: Position) -> bool {
        match self.field_at(position) {
            Some(field) => !field.blocked,
            None => false,
        }
    }
}

/// In-memory map: everything inside the bounds exists, selected tiles are
/// blocked. Without bounds the plane is unbounded.
#[derive(Debug, Default)]
pub struct GridMap {
    blocked: HashSet<Position>,
    bounds: Option<(Position, Position)>,
}

impl GridMap {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(min: Position, max: Position) -> Self {
        Self {
            blocked: HashSet::new(),
            bounds: Some((min, max)),
        }
    }

    pub fn block(&mut self, position: Position) {
        self.blocked.insert(position);
    }
}

impl WorldMap for GridMap {
    fn field_at(&self, position: Position) -> Option<Field> {
        if let Some((min, max)) = self.bounds {
            let inside = position.x >= min.x
                && position.x <= max.x
                && position.y >= min.y
                && position.y <= max.y
                && position.z >= min.z
                && position.z <= max.z;
            if !inside {
                return None;
            }
        }
        Some(Field {
            blocked: self.blocked.contains(&position),
        })
    }
}
