//! Message contract for an external signaling/relay server.
//!
//! The engine itself does not own a transport and does not negotiate
//! sessions or rooms — that is the job of an external signaling/relay
//! service. This module only describes the wire shape of that
//! conversation (room lifecycle, roster changes, rematch) so a caller can
//! serialize/deserialize it with the same `serde` stack the rest of the
//! crate uses. There is no server implementation here and no transport
//! binding; [`P2PSession`](crate::P2PSession) and
//! [`SpectatorSession`](crate::SpectatorSession) exchange a separate,
//! unrelated wire format once peers are already connected (see
//! [`Message`](crate::Message)).
//!
//! Two ordering guarantees apply to every message below:
//! - `room-created`/`room-joined` are always sent before any
//!   `player-joined` event for that room.
//! - `game-started` is sent exactly once per match and always after the
//!   last `player-joined` that preceded it.

use serde::{Deserialize, Serialize};

/// Stable identifier for a signaling room, opaque to the engine.
pub type RoomId = String;

/// Stable identifier for a participant, opaque to the engine.
pub type ParticipantId = String;

/// A message exchanged with an external signaling/relay server.
///
/// `#[serde(tag = "type", rename_all = "kebab-case")]` gives each variant
/// the wire name from the table in the signaling contract (e.g.
/// `"create-room"`, `"player-joined"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalingMessage {
    /// Client → server: request a new room.
    CreateRoom,
    /// Client → server: join an existing room.
    JoinRoom {
        /// Room to join.
        room: RoomId,
    },
    /// Server → client: a room was created on the client's behalf.
    RoomCreated {
        /// Newly created room.
        room: RoomId,
    },
    /// Server → client: the client successfully joined a room.
    RoomJoined {
        /// Joined room.
        room: RoomId,
        /// Controller slot assigned to the joining participant (§6.3).
        slot: u32,
    },
    /// Server → all clients in a room: a participant joined.
    PlayerJoined {
        /// Joining participant.
        participant: ParticipantId,
        /// Controller slot assigned to the joining participant.
        slot: u32,
    },
    /// Server → all clients in a room: a participant left.
    PlayerLeft {
        /// Leaving participant.
        participant: ParticipantId,
    },
    /// Server → all clients in a room: host responsibility moved to a
    /// different participant. Roster-only — the engine attaches no
    /// simulation meaning to this; an in-progress match continues
    /// unaffected (see the open question on mid-match host migration).
    HostChanged {
        /// New host.
        participant: ParticipantId,
    },
    /// Host client → server: request the match begin.
    StartGame {
        /// Descriptor identifying what is being played (e.g. a ROM URL,
        /// core URL, or other game-content identifier).
        game_type: String,
        /// Shared 31-bit random seed (§6.2) for the match, chosen by the host.
        seed: u32,
    },
    /// Server → all clients in a room: the match begins. `player_order`
    /// is the authoritative slot assignment every client must use to map
    /// [`PlayerHandle`](crate::PlayerHandle)s to the participant list (§6.3).
    GameStarted {
        /// Participants in slot order: `player_order[i]` occupies slot `i`.
        player_order: Vec<ParticipantId>,
        /// Shared 31-bit random seed (§6.2) every simulator must adopt as
        /// the determinism root before advancing the first frame.
        seed: u32,
        /// Descriptor identifying what is being played, echoed from the
        /// `start-game` message that triggered this match.
        game_type: String,
    },
    /// Client → server → other clients: an out-of-band input message
    /// relayed outside the direct peer wire protocol (e.g. while peers
    /// are still establishing a direct connection).
    Input {
        /// Sending participant.
        participant: ParticipantId,
        /// Opaque, already-serialized input payload.
        payload: Vec<u8>,
    },
    /// Host client → server → all clients in a room: start a new match
    /// with the same roster.
    Rematch,
}
