use crate::entities::effects::{EffectKind, EffectList};
use crate::world::items::ItemId;
use crate::world::position::{Direction, Position};
use crate::world::tuning::{
    ATTACK_FIGHT_COST, MAX_ACTION_POINTS, MAX_FIGHT_POINTS, MIN_AP_FOR_ACTION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterKind {
    Player,
    Monster,
    Npc,
}

/// The eight spoken-language slots. Common is the unprefixed slot every
/// character falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Common,
    Human,
    Dwarf,
    Elf,
    Lizard,
    Orc,
    Halfling,
    Ancient,
}

pub const ALL_LANGUAGES: [Language; 8] = [
    Language::Common,
    Language::Human,
    Language::Dwarf,
    Language::Elf,
    Language::Lizard,
    Language::Orc,
    Language::Halfling,
    Language::Ancient,
];

impl Language {
    pub fn index(self) -> usize {
        match self {
            Language::Common => 0,
            Language::Human => 1,
            Language::Dwarf => 2,
            Language::Elf => 3,
            Language::Lizard => 4,
            Language::Orc => 5,
            Language::Halfling => 6,
            Language::Ancient => 7,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Language::Common => "",
            Language::Human => "[Human] ",
            Language::Dwarf => "[Dwarf] ",
            Language::Elf => "[Elf] ",
            Language::Lizard => "[Lizard] ",
            Language::Orc => "[Orc] ",
            Language::Halfling => "[Halfling] ",
            Language::Ancient => "[Ancient] ",
        }
    }

    pub fn skill_name(self) -> &'static str {
        match self {
            Language::Common => "common language",
            Language::Human => "human language",
            Language::Dwarf => "dwarf language",
            Language::Elf => "elf language",
            Language::Lizard => "lizard language",
            Language::Orc => "orc language",
            Language::Halfling => "halfling language",
            Language::Ancient => "ancient language",
        }
    }
}

/// Lightweight snapshot of a potential combat target, resolved back
/// through the registries when acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRef {
    pub id: CharacterId,
    pub kind: CharacterKind,
    pub position: Position,
}

/// State shared by every character kind. Kind-specific extension data
/// lives on the wrapping `Player`/`Monster`/`Npc` struct.
#[derive(Debug, Clone)]
pub struct CharacterBody {
    pub id: CharacterId,
    pub name: String,
    pub position: Position,
    pub facing: Direction,
    pub action_points: i32,
    pub fight_points: i32,
    pub hitpoints: i32,
    pub max_hitpoints: i32,
    pub alive: bool,
    pub active_language: Language,
    pub language_skills: [u8; 8],
    pub mental_capacity: i32,
    pub left_tool: Option<ItemId>,
    pub right_tool: Option<ItemId>,
    pub effects: EffectList,
}

impl CharacterBody {
    pub fn new(id: CharacterId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            facing: Direction::South,
            action_points: 0,
            fight_points: 0,
            hitpoints: 100,
            max_hitpoints: 100,
            alive: true,
            active_language: Language::Common,
            language_skills: [0; 8],
            mental_capacity: 100,
            left_tool: None,
            right_tool: None,
            effects: EffectList::default(),
        }
    }

    pub fn increase_action_points(&mut self, delta: i32) {
        self.action_points = (self.action_points + delta).clamp(0, MAX_ACTION_POINTS);
    }

    pub fn increase_fight_points(&mut self, delta: i32) {
        self.fight_points = (self.fight_points + delta).clamp(0, MAX_FIGHT_POINTS);
    }

    pub fn can_act(&self) -> bool {
        self.alive
            && self.action_points >= MIN_AP_FOR_ACTION
            && !self.effects.is_active(EffectKind::Paralyzed)
    }

    pub fn can_fight(&self) -> bool {
        self.alive && self.fight_points >= ATTACK_FIGHT_COST
    }

    /// Whether combat is permitted at all; unlike `can_act` this does not
    /// demand an action point reserve.
    pub fn can_attack(&self) -> bool {
        self.alive && !self.effects.is_active(EffectKind::Paralyzed)
    }

    pub fn turn_toward(&mut self, target: Position) {
        if let Some(direction) = Direction::toward(self.position, target) {
            self.facing = direction;
        }
    }

    pub fn heal(&mut self, amount: i32) {
        if self.alive {
            self.hitpoints = (self.hitpoints + amount).min(self.max_hitpoints);
        }
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hitpoints = (self.hitpoints - amount).max(0);
        if self.hitpoints == 0 {
            self.alive = false;
        }
    }

    pub fn restore_to_full(&mut self) {
        self.hitpoints = self.max_hitpoints;
        self.alive = true;
    }

    pub fn language_skill(&self, language: Language) -> u8 {
        self.language_skills[language.index()]
    }

    pub fn set_language_skill(&mut self, language: Language, skill: u8) {
        self.language_skills[language.index()] = skill.min(100);
    }

    /// Periodic decay driven by the recurring scheduler.
    pub fn reduce_mental_capacity(&mut self) {
        self.mental_capacity = (self.mental_capacity - 1).max(0);
    }

    /// Render `message` as this character hears it given its `skill`
    /// (0-100) in the speaker's language. Letters the listener fails to
    /// catch are swapped for noise; punctuation and spacing survive.
    pub fn alter_spoken_message(&self, message: &str, skill: u8) -> String {
        if skill >= 100 {
            return message.to_string();
        }
        const NOISE: &[u8] = b"szrgnmlh";
        let mut state = u64::from(self.id.0).wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1;
        let mut garbled = String::with_capacity(message.len());
        for ch in message.chars() {
            if !ch.is_alphabetic() {
                garbled.push(ch);
                continue;
            }
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let roll = ((state >> 32) % 100) as u8;
            if roll < skill {
                garbled.push(ch);
            } else {
                let noise = NOISE[((state >> 16) as usize) % NOISE.len()] as char;
                if ch.is_uppercase() {
                    garbled.push(noise.to_ascii_uppercase());
                } else {
                    garbled.push(noise);
                }
            }
        }
        garbled
    }
}

/// Capability surface shared by the three entity kinds; the registries and
/// the proximity engine operate through it.
pub trait Actor {
    fn body(&self) -> &CharacterBody;
    fn body_mut(&mut self) -> &mut CharacterBody;
    fn kind(&self) -> CharacterKind;

    fn id(&self) -> CharacterId {
        self.body().id
    }

    fn position(&self) -> Position {
        self.body().position
    }

    fn is_alive(&self) -> bool {
        self.body().alive
    }

    fn target_ref(&self) -> TargetRef {
        TargetRef {
            id: self.id(),
            kind: self.kind(),
            position: self.position(),
        }
    }
}
