use crate::entities::character::{CharacterId, TargetRef};
use crate::world::position::Position;

/// Default target selection when a species script declines or is absent.
pub trait FightingPolicy: Send + Sync {
    fn select_target(
        &self,
        monster: CharacterId,
        from: Position,
        candidates: &[TargetRef],
    ) -> Option<TargetRef>;
}

/// Picks the nearest candidate by Chebyshev distance; ties break toward
/// the lowest character id.
#[derive(Debug, Default)]
pub struct StandardFighting;

impl FightingPolicy for StandardFighting {
    fn select_target(
        &self,
        _monster: CharacterId,
        from: Position,
        candidates: &[TargetRef],
    ) -> Option<TargetRef> {
        candidates
            .iter()
            .copied()
            .min_by_key(|candidate| (from.plane_distance(candidate.position), candidate.id))
    }
}
