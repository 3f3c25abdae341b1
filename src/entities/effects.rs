#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Paralyzed,
    Regenerating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEffect {
    pub kind: EffectKind,
    pub expires_at_ms: u64,
}

/// Timed status effects on a character. Expired entries are dropped when
/// the owning phase advances the list; active ones gate or modify behavior
/// for as long as they remain.
#[derive(Debug, Clone, Default)]
pub struct EffectList {
    entries: Vec<TimedEffect>,
}

impl EffectList {
    pub fn add(&mut self, kind: EffectKind, expires_at_ms: u64) {
        self.entries.push(TimedEffect { kind, expires_at_ms });
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.entries.iter().any(|effect| effect.kind == kind)
    }

    /// Drop expired effects and return their kinds.
    pub fn advance(&mut self, now_ms: u64) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        self.entries.retain(|effect| {
            if effect.expires_at_ms <= now_ms {
                expired.push(effect.kind);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
