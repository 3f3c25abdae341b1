use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::entities::character::CharacterId;
use crate::world::position::Position;
use crate::world::talk::TalkMode;

/// Reasons a player can be pushed off the server from inside the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    UnstableConnection,
    Shutdown,
}

/// Outbound effect handed to a connection's send queue. Encoding to the
/// wire format happens in the network layer, outside this core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEffect {
    Talk {
        mode: TalkMode,
        speaker: CharacterId,
        position: Position,
        text: String,
    },
    GraphicEffect {
        position: Position,
        gfx: u16,
    },
    Sound {
        position: Position,
        sound: u16,
    },
    CharacterAppeared {
        id: CharacterId,
        position: Position,
    },
    CharacterMoved {
        id: CharacterId,
        from: Position,
        to: Position,
    },
    CharacterRemoved {
        id: CharacterId,
        position: Position,
    },
    CharacterSpin {
        id: CharacterId,
    },
    GameDay {
        day: i64,
    },
    Inform {
        text: String,
    },
    Disconnect {
        reason: DisconnectReason,
    },
}

/// Narrow transport contract: fire-and-forget, ordering preserved per
/// connection, never blocks the tick thread.
pub trait ClientConnection: Send + Sync {
    fn send(&self, effect: ServerEffect);
    fn is_online(&self) -> bool;

    /// Queue a final effect and mark the connection for teardown.
    fn shutdown_send(&self, effect: ServerEffect);
}

/// In-memory connection used by tests and by the loopback client.
#[derive(Debug, Default)]
pub struct QueueConnection {
    online: AtomicBool,
    effects: Mutex<Vec<ServerEffect>>,
}

impl QueueConnection {
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            effects: Mutex::new(Vec::new()),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn drain(&self) -> Vec<ServerEffect> {
        match self.effects.lock() {
            Ok(mut effects) => std::mem::take(&mut *effects),
            Err(_) => Vec::new(),
        }
    }

    pub fn sent(&self) -> Vec<ServerEffect> {
        match self.effects.lock() {
            Ok(effects) => effects.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl ClientConnection for QueueConnection {
    fn send(&self, effect: ServerEffect) {
        if let Ok(mut effects) = self.effects.lock() {
            effects.push(effect);
        }
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn shutdown_send(&self, effect: ServerEffect) {
        self.send(effect);
        self.set_online(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_send_queues_then_goes_offline() {
        let connection = QueueConnection::new();
        assert!(connection.is_online());
        connection.shutdown_send(ServerEffect::Disconnect {
            reason: DisconnectReason::UnstableConnection,
        });
        assert!(!connection.is_online());
        let sent = connection.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            ServerEffect::Disconnect {
                reason: DisconnectReason::UnstableConnection,
            }
        );
    }
}
