use std::collections::VecDeque;
use std::sync::Arc;

use crate::entities::character::{Actor, CharacterBody, CharacterId, CharacterKind};
use crate::net::connection::{ClientConnection, ServerEffect};
use crate::world::position::{Direction, Position};
use crate::world::talk::{LocalizedText, TalkMode};

/// The client-side display language; two-variant texts are resolved
/// against it (`nls`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLocale {
    German,
    English,
}

/// Command decoded by the network layer and queued for the player phase
/// (or the immediate drain loop).
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    Talk { mode: TalkMode, text: LocalizedText },
    Move(Direction),
    Attack(CharacterId),
}

pub struct Player {
    pub body: CharacterBody,
    pub connection: Arc<dyn ClientConnection>,
    pub client_locale: ClientLocale,
    /// Unix seconds of the last keepalive received from the client.
    pub last_keepalive: i64,
    pub pending_commands: VecDeque<PlayerCommand>,
}

impl Player {
    pub fn new(
        body: CharacterBody,
        connection: Arc<dyn ClientConnection>,
        client_locale: ClientLocale,
        last_keepalive: i64,
    ) -> Self {
        Self {
            body,
            connection,
            client_locale,
            last_keepalive,
            pending_commands: VecDeque::new(),
        }
    }

    pub fn mark_keepalive(&mut self, now_secs: i64) {
        self.last_keepalive = now_secs;
    }

    pub fn enqueue_command(&mut self, command: PlayerCommand) {
        self.pending_commands.push_back(command);
    }

    /// Pick the text variant matching the client locale.
    pub fn nls<'a>(&self, text: &'a LocalizedText) -> &'a str {
        match self.client_locale {
            ClientLocale::German => &text.german,
            ClientLocale::English => &text.english,
        }
    }

    pub fn inform(&self, text: impl Into<String>) {
        self.connection.send(ServerEffect::Inform { text: text.into() });
    }

    pub fn receive_text(
        &self,
        mode: TalkMode,
        text: impl Into<String>,
        speaker: CharacterId,
        speaker_position: Position,
    ) {
        self.connection.send(ServerEffect::Talk {
            mode,
            speaker,
            position: speaker_position,
            text: text.into(),
        });
    }
}

impl Actor for Player {
    fn body(&self) -> &CharacterBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut CharacterBody {
        &mut self.body
    }

    fn kind(&self) -> CharacterKind {
        CharacterKind::Player
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.body.id)
            .field("name", &self.body.name)
            .field("position", &self.body.position)
            .field("last_keepalive", &self.last_keepalive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::connection::QueueConnection;

    #[test]
    fn nls_picks_the_client_locale_variant() {
        let connection = Arc::new(QueueConnection::new());
        let body = CharacterBody::new(CharacterId(1), "Mira", Position { x: 0, y: 0, z: 0 });
        let mut player = Player::new(body, connection, ClientLocale::English, 0);
        let text = LocalizedText::new("Hallo", "Hello");
        assert_eq!(player.nls(&text), "Hello");
        player.client_locale = ClientLocale::German;
        assert_eq!(player.nls(&text), "Hallo");
    }
}
