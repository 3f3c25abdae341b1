use crate::entities::character::{Actor, CharacterId, CharacterKind, Language};
use crate::entities::player::ClientLocale;
use crate::telemetry::logging;
use crate::world::position::{Position, Range};
use crate::world::state::WorldState;

/// Communication mode; determines the delivery radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalkMode {
    Say,
    Whisper,
    Yell,
}

/// Two-variant text resolved against a player's client locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedText {
    pub german: String,
    pub english: String,
}

impl LocalizedText {
    pub fn new(german: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            german: german.into(),
            english: english.into(),
        }
    }

    /// One text for all audiences. Detected downstream by content
    /// equality of the two variants.
    pub fn same(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            german: text.clone(),
            english: text,
        }
    }

    pub fn is_same(&self) -> bool {
        self.german == self.english
    }

    fn is_action(&self) -> bool {
        self.german.starts_with("#me") || self.english.starts_with("#me")
    }
}

pub fn talk_range(mode: TalkMode) -> Range {
    match mode {
        TalkMode::Say => Range::planar(14),
        TalkMode::Whisper => Range::planar(2),
        TalkMode::Yell => Range::planar(30),
    }
}

impl WorldState {
    /// Deliver `text` to every live listener in range of the speaker:
    /// players, NPCs and monsters alike. Player speech with one shared
    /// text variant passes through the chat filter, once before range
    /// resolution and once per recipient. Listeners who do not share the
    /// speaker's active language hear a rendering garbled by their skill
    /// in it; monsters always receive the raw english variant.
    pub fn broadcast_text(&mut self, speaker: CharacterId, text: &LocalizedText, mode: TalkMode) {
        let Some((kind, position, language)) = self.character_snapshot(speaker) else {
            return;
        };
        let range = talk_range(mode);
        let is_action = text.is_action();
        let is_same = text.is_same();
        let prefix = language.prefix();

        let mut outgoing = text.english.clone();
        if !is_action && is_same && kind == CharacterKind::Player {
            if let Some(filter) = self.chat_filter.clone() {
                outgoing = filter.before_send(speaker, mode, &outgoing);
            }
        }

        logging::log_talk(&format!(
            "{:?} from {} at ({},{},{}): {}",
            mode, speaker.0, position.x, position.y, position.z, outgoing
        ));

        for listener_id in self.players.ids_in_range(position, range, true) {
            let Some(player) = self.players.get(listener_id) else {
                continue;
            };
            let delivered = if is_action {
                player.nls(text).to_string()
            } else if listener_id == speaker {
                format!("{prefix}{}", player.nls(text))
            } else if is_same && self.chat_filter.is_some() {
                let filtered = match &self.chat_filter {
                    Some(filter) => filter.before_receive(listener_id, mode, &outgoing, speaker),
                    None => outgoing.clone(),
                };
                let heard = self.render_for_listener(&player.body, language, &filtered);
                format!("{prefix}{heard}")
            } else {
                let heard = self.render_for_listener(&player.body, language, player.nls(text));
                format!("{prefix}{heard}")
            };
            player.receive_text(mode, delivered, speaker, position);
        }

        for listener_id in self.npcs.ids_in_range(position, range, true) {
            if listener_id == speaker {
                continue;
            }
            let Some(npc) = self.npcs.get(listener_id) else {
                continue;
            };
            let heard = self.render_for_listener(&npc.body, language, &outgoing);
            let delivered = format!("{prefix}{heard}");
            let script = npc.script.clone();
            if let Some(npc) = self.npcs.get_mut(listener_id) {
                npc.heard.push((mode, delivered.clone()));
            }
            if let Some(script) = script {
                script.receive_text(listener_id, mode, &delivered, speaker);
            }
        }

        for listener_id in self.monsters.ids_in_range(position, range, true) {
            if listener_id == speaker {
                continue;
            }
            let race = match self.monsters.get_mut(listener_id) {
                Some(monster) => {
                    monster.heard.push((mode, text.english.clone()));
                    monster.race
                }
                None => continue,
            };
            if let Some(hooks) = self.species.hooks(race).cloned() {
                hooks.receive_text(listener_id, mode, &text.english, speaker);
            }
        }
    }

    /// Locale-filtered delivery: only players whose client locale matches
    /// receive the message; speaker- and listener-side garbling both
    /// apply. NPCs and monsters hear it regardless of locale.
    pub fn broadcast_text_for_locale(
        &mut self,
        speaker: CharacterId,
        text: &str,
        mode: TalkMode,
        locale: ClientLocale,
    ) {
        let Some((_, position, language)) = self.character_snapshot(speaker) else {
            return;
        };
        let range = talk_range(mode);
        let is_action = text.starts_with("#me");
        let prefix = language.prefix();

        let spoken = match self.speaker_rendering(speaker, language, text) {
            Some(spoken) => spoken,
            None => text.to_string(),
        };

        for listener_id in self.players.ids_in_range(position, range, true) {
            let Some(player) = self.players.get(listener_id) else {
                continue;
            };
            if player.client_locale != locale {
                continue;
            }
            let delivered = if is_action {
                text.to_string()
            } else if listener_id == speaker {
                format!("{prefix}{text}")
            } else {
                let skill = player.body.language_skill(language);
                let heard = player.body.alter_spoken_message(&spoken, skill);
                format!("{prefix}{heard}")
            };
            player.receive_text(mode, delivered, speaker, position);
        }

        for listener_id in self.npcs.ids_in_range(position, range, true) {
            if listener_id == speaker {
                continue;
            }
            let Some(npc) = self.npcs.get(listener_id) else {
                continue;
            };
            let skill = npc.body.language_skill(language);
            let heard = format!("{prefix}{}", npc.body.alter_spoken_message(&spoken, skill));
            let script = npc.script.clone();
            if let Some(npc) = self.npcs.get_mut(listener_id) {
                npc.heard.push((mode, heard.clone()));
            }
            if let Some(script) = script {
                script.receive_text(listener_id, mode, &heard, speaker);
            }
        }

        for listener_id in self.monsters.ids_in_range(position, range, true) {
            if listener_id == speaker {
                continue;
            }
            if let Some(monster) = self.monsters.get_mut(listener_id) {
                monster.heard.push((mode, text.to_string()));
            }
        }
    }

    /// Non-text path: graphic effect to all players within `radius`, no
    /// language handling.
    pub fn broadcast_gfx(&self, position: Position, radius: i32, gfx: u16) {
        let range = Range::planar(radius);
        self.players.for_each(|player| {
            if range.contains(position, player.position()) {
                player
                    .connection
                    .send(crate::net::connection::ServerEffect::GraphicEffect { position, gfx });
            }
        });
    }

    /// Non-text path: sound to all players within `radius`.
    pub fn broadcast_sound(&self, position: Position, radius: i32, sound: u16) {
        let range = Range::planar(radius);
        self.players.for_each(|player| {
            if range.contains(position, player.position()) {
                player
                    .connection
                    .send(crate::net::connection::ServerEffect::Sound { position, sound });
            }
        });
    }

    /// Server-wide announcement, all connected players.
    pub fn broadcast_to_all_players(&self, text: &str) {
        self.players.for_each(|player| player.inform(text));
    }

    /// How `listener` hears `text`: clear when the active languages
    /// match, otherwise garbled by the listener's skill in the speaker's
    /// language.
    fn render_for_listener(
        &self,
        listener: &crate::entities::character::CharacterBody,
        speaker_language: Language,
        text: &str,
    ) -> String {
        if listener.active_language == speaker_language {
            return text.to_string();
        }
        let skill = listener.language_skill(speaker_language);
        listener.alter_spoken_message(text, skill)
    }

    /// The speaker's own rendering of `text` given their skill in their
    /// active language.
    fn speaker_rendering(
        &self,
        speaker: CharacterId,
        language: Language,
        text: &str,
    ) -> Option<String> {
        let body = self.character_body(speaker)?;
        let skill = body.language_skill(language);
        Some(body.alter_spoken_message(text, skill))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::entities::character::{CharacterBody, CharacterId};
    use crate::entities::npc::Npc;
    use crate::net::connection::ServerEffect;
    use crate::scripting::hooks::ChatFilter;
    use crate::world::state::test_support::{add_monster, add_player, world};

    fn at(x: i32, y: i32) -> Position {
        Position { x, y, z: 0 }
    }

    fn talk_texts(effects: &[ServerEffect]) -> Vec<String> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                ServerEffect::Talk { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn whisper_reaches_two_tiles_but_not_three() {
        let mut world = world();
        add_player(&mut world, 1, at(0, 0));
        let near = add_player(&mut world, 2, at(2, 0));
        let far = add_player(&mut world, 3, at(3, 0));
        let below = add_player(&mut world, 4, Position { x: 0, y: 1, z: -1 });

        world.broadcast_text(
            CharacterId(1),
            &LocalizedText::same("psst"),
            TalkMode::Whisper,
        );

        assert_eq!(talk_texts(&near.sent()), vec!["psst".to_string()]);
        assert!(talk_texts(&far.sent()).is_empty());
        assert!(talk_texts(&below.sent()).is_empty());
    }

    #[test]
    fn yell_carries_past_say_range() {
        let mut world = world();
        add_player(&mut world, 1, at(0, 0));
        let distant = add_player(&mut world, 2, at(20, 0));

        world.broadcast_text(CharacterId(1), &LocalizedText::same("hello"), TalkMode::Say);
        assert!(talk_texts(&distant.sent()).is_empty());

        world.broadcast_text(
            CharacterId(1),
            &LocalizedText::same("HELLO"),
            TalkMode::Yell,
        );
        assert_eq!(talk_texts(&distant.sent()), vec!["HELLO".to_string()]);
    }

    #[test]
    fn non_common_speech_is_prefixed_and_garbled_for_strangers() {
        let mut world = world();
        add_player(&mut world, 1, at(0, 0));
        let fluent = add_player(&mut world, 2, at(1, 0));
        let stranger = add_player(&mut world, 3, at(2, 0));
        if let Some(player) = world.players.get_mut(CharacterId(1)) {
            player.body.active_language = Language::Orc;
        }
        if let Some(player) = world.players.get_mut(CharacterId(2)) {
            player.body.active_language = Language::Orc;
        }

        world.broadcast_text(
            CharacterId(1),
            &LocalizedText::same("blood and iron"),
            TalkMode::Say,
        );

        assert_eq!(
            talk_texts(&fluent.sent()),
            vec!["[Orc] blood and iron".to_string()]
        );
        let heard = talk_texts(&stranger.sent());
        assert_eq!(heard.len(), 1);
        assert!(heard[0].starts_with("[Orc] "));
        assert_ne!(heard[0], "[Orc] blood and iron");
        assert_eq!(heard[0].len(), "[Orc] blood and iron".len());
    }

    #[test]
    fn action_text_skips_prefix_and_filter() {
        struct Shouter;
        impl ChatFilter for Shouter {
            fn before_send(&self, _: CharacterId, _: TalkMode, text: &str) -> String {
                text.to_uppercase()
            }
        }

        let mut world = world();
        world.chat_filter = Some(Arc::new(Shouter));
        add_player(&mut world, 1, at(0, 0));
        let listener = add_player(&mut world, 2, at(1, 0));
        if let Some(player) = world.players.get_mut(CharacterId(1)) {
            player.body.active_language = Language::Dwarf;
        }

        world.broadcast_text(
            CharacterId(1),
            &LocalizedText::same("#me strokes his beard"),
            TalkMode::Say,
        );

        assert_eq!(
            talk_texts(&listener.sent()),
            vec!["#me strokes his beard".to_string()]
        );
    }

    #[test]
    fn chat_filter_applies_only_when_both_variants_match() {
        struct Shouter;
        impl ChatFilter for Shouter {
            fn before_send(&self, _: CharacterId, _: TalkMode, text: &str) -> String {
                text.to_uppercase()
            }
        }

        let mut world = world();
        world.chat_filter = Some(Arc::new(Shouter));
        add_player(&mut world, 1, at(0, 0));
        let listener = add_player(&mut world, 2, at(1, 0));

        world.broadcast_text(CharacterId(1), &LocalizedText::same("quiet"), TalkMode::Say);
        world.broadcast_text(
            CharacterId(1),
            &LocalizedText::new("leise", "quiet"),
            TalkMode::Say,
        );

        // The shared text is filtered, the translated pair is not.
        assert_eq!(
            talk_texts(&listener.sent()),
            vec!["QUIET".to_string(), "quiet".to_string()]
        );
    }

    #[test]
    fn npcs_hear_prefixed_text_and_monsters_hear_raw_english() {
        let mut world = world();
        add_player(&mut world, 1, at(0, 0));
        if let Some(player) = world.players.get_mut(CharacterId(1)) {
            player.body.active_language = Language::Elf;
            player.body.set_language_skill(Language::Elf, 100);
        }
        let body = CharacterBody::new(CharacterId(20), "innkeeper", at(1, 0));
        world.npcs.insert(Npc::new(body, None));
        if let Some(npc) = world.npcs.get_mut(CharacterId(20)) {
            npc.body.active_language = Language::Elf;
        }
        add_monster(&mut world, 30, at(2, 0), 7);

        world.broadcast_text(
            CharacterId(1),
            &LocalizedText::new("gruesse", "greetings"),
            TalkMode::Say,
        );

        let npc = world.npcs.get(CharacterId(20)).expect("npc");
        assert_eq!(
            npc.heard,
            vec![(TalkMode::Say, "[Elf] greetings".to_string())]
        );
        let monster = world.monsters.get(CharacterId(30)).expect("monster");
        assert_eq!(monster.heard, vec![(TalkMode::Say, "greetings".to_string())]);
    }

    #[test]
    fn speaker_hears_their_own_words_clearly() {
        let mut world = world();
        let own = add_player(&mut world, 1, at(0, 0));
        if let Some(player) = world.players.get_mut(CharacterId(1)) {
            player.body.active_language = Language::Halfling;
        }

        world.broadcast_text(
            CharacterId(1),
            &LocalizedText::same("second breakfast"),
            TalkMode::Say,
        );

        assert_eq!(
            talk_texts(&own.sent()),
            vec!["[Halfling] second breakfast".to_string()]
        );
    }

    #[test]
    fn locale_broadcast_skips_players_on_the_other_client_locale() {
        let mut world = world();
        let own = add_player(&mut world, 1, at(0, 0));
        let english = add_player(&mut world, 2, at(1, 0));
        let german = add_player(&mut world, 3, at(2, 0));
        for id in [1u32, 2, 3] {
            if let Some(player) = world.players.get_mut(CharacterId(id)) {
                player.body.set_language_skill(Language::Common, 100);
            }
        }
        if let Some(player) = world.players.get_mut(CharacterId(3)) {
            player.client_locale = ClientLocale::German;
        }

        world.broadcast_text_for_locale(
            CharacterId(1),
            "closing soon",
            TalkMode::Say,
            ClientLocale::English,
        );

        assert_eq!(talk_texts(&own.sent()), vec!["closing soon".to_string()]);
        assert_eq!(talk_texts(&english.sent()), vec!["closing soon".to_string()]);
        assert!(talk_texts(&german.sent()).is_empty());
    }

    #[test]
    fn locale_broadcast_garbles_on_the_speaker_side_too() {
        let mut world = world();
        add_player(&mut world, 1, at(0, 0));
        let fluent = add_player(&mut world, 2, at(1, 0));
        // The speaker barely knows the language and mangles it before
        // anyone hears it.
        if let Some(player) = world.players.get_mut(CharacterId(1)) {
            player.body.active_language = Language::Elf;
        }
        if let Some(player) = world.players.get_mut(CharacterId(2)) {
            player.body.set_language_skill(Language::Elf, 100);
        }

        world.broadcast_text_for_locale(
            CharacterId(1),
            "the ferry waits",
            TalkMode::Say,
            ClientLocale::English,
        );

        let heard = talk_texts(&fluent.sent());
        assert_eq!(heard.len(), 1);
        assert!(heard[0].starts_with("[Elf] "));
        // Fluency cannot recover what the speaker mangled.
        assert_ne!(heard[0], "[Elf] the ferry waits");
        assert_eq!(heard[0].len(), "[Elf] the ferry waits".len());
    }

    #[test]
    fn sound_carries_exactly_to_the_given_radius() {
        let mut world = world();
        let edge = add_player(&mut world, 1, at(5, 0));
        let outside = add_player(&mut world, 2, at(6, 0));

        world.broadcast_sound(at(0, 0), 5, 3);

        assert!(edge
            .sent()
            .iter()
            .any(|effect| matches!(effect, ServerEffect::Sound { sound: 3, .. })));
        assert!(!outside
            .sent()
            .iter()
            .any(|effect| matches!(effect, ServerEffect::Sound { .. })));
    }

    #[test]
    fn server_announcements_reach_every_player() {
        let mut world = world();
        let near = add_player(&mut world, 1, at(0, 0));
        let far = add_player(&mut world, 2, at(500, 500));

        world.broadcast_to_all_players("the gates close at dusk");

        for connection in [near, far] {
            assert!(connection.sent().iter().any(|effect| matches!(
                effect,
                ServerEffect::Inform { text } if text == "the gates close at dusk"
            )));
        }
    }
}
