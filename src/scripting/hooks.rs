use crate::entities::character::{CharacterId, TargetRef};
use crate::world::talk::TalkMode;

/// Outcome of a species script's target pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetChoice {
    /// Script declines; the default fighting policy governs.
    NotHandled,
    Target(TargetRef),
    NoTarget,
}

/// Per-species behavior hooks. Every method has a no-op default so a
/// script implements only the events it cares about; a species without a
/// script falls back to the default fighting policy at the call sites.
pub trait MonsterHooks: Send + Sync {
    fn set_target(&self, _monster: CharacterId, _candidates: &[TargetRef]) -> TargetChoice {
        TargetChoice::NotHandled
    }

    /// Enemy inside weapon range. A truthy result short-circuits the rest
    /// of the monster's turn.
    fn enemy_near(&self, _monster: CharacterId, _enemy: CharacterId) -> bool {
        false
    }

    /// Enemy inside view range. A truthy result short-circuits the rest
    /// of the monster's turn.
    fn enemy_on_sight(&self, _monster: CharacterId, _enemy: CharacterId) -> bool {
        false
    }

    fn abort_route(&self, _monster: CharacterId) {}

    fn on_spawn(&self, _monster: CharacterId) {}

    fn receive_text(
        &self,
        _monster: CharacterId,
        _mode: TalkMode,
        _text: &str,
        _speaker: CharacterId,
    ) {
    }
}

/// Per-NPC script surface driven by the NPC phase.
pub trait NpcScript: Send + Sync {
    fn next_cycle(&self, _npc: CharacterId) {}

    fn abort_route(&self, _npc: CharacterId) {}

    fn receive_text(&self, _npc: CharacterId, _mode: TalkMode, _text: &str, _speaker: CharacterId) {
    }
}

/// Global chat transform applied to player speech: once before range
/// resolution and once per recipient.
pub trait ChatFilter: Send + Sync {
    fn before_send(&self, _speaker: CharacterId, _mode: TalkMode, text: &str) -> String {
        text.to_string()
    }

    fn before_receive(
        &self,
        _listener: CharacterId,
        _mode: TalkMode,
        text: &str,
        _speaker: CharacterId,
    ) -> String {
        text.to_string()
    }
}
