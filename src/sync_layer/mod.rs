//! # Sync Layer - Rollback Networking Core
//!
//! The sync layer manages game state synchronization for rollback-based netcode.
//! It handles state saving, input prediction, and rollback/re-simulation.
//!
//! ## How Rollback Works
//!
//! Rollback networking allows games to run smoothly despite network latency by
//! predicting remote player inputs and correcting mistakes when actual inputs arrive.
//!
//! ### Step 1: State Saving
//!
//! Each frame, the game state is saved to a circular buffer managed by [`SavedStates`].
//! The buffer holds `max_prediction + 1` frames, allowing rollback up to `max_prediction`
//! frames into the past. States are stored in [`GameStateCell`] containers for thread-safe
//! access. When the buffer is full, the oldest state is overwritten.
//!
//! ### Step 2: Input Handling
//!
//! - **Local inputs**: Added immediately via `SyncLayer::add_local_input`
//! - **Remote inputs**: Arrive over the network with variable latency
//! - Each player has a dedicated [`InputQueue`] tracking confirmed and predicted inputs
//! - The `input_delay` setting adds buffer frames to smooth network jitter
//!
//! ### Step 3: Prediction
//!
//! When remote inputs haven't arrived for a frame, the sync layer uses the
//! [`PredictionStrategy`](crate::input_queue::PredictionStrategy) to guess what
//! the remote player will do:
//!
//! - **`RepeatLastConfirmed`** (default): Use the last known input - works well
//!   for most games since players typically hold inputs for multiple frames
//! - **`BlankPrediction`**: Use a neutral/default input
//!
//! **Critical**: Predictions must be deterministic. Given the same game state and
//! last confirmed input, all peers must predict the same value.
//!
//! ### Step 4: Rollback
//!
//! When actual remote inputs arrive and differ from predictions:
//!
//! 1. **Detection**: The input queue detects the misprediction
//! 2. **Load State**: Load the saved state from before the misprediction via
//!    [`FortressRequest::LoadGameState`]
//! 3. **Re-simulation**: Advance forward with correct inputs, generating
//!    [`FortressRequest::AdvanceFrame`] requests
//! 4. **Bounds**: Rollback is bounded by `max_prediction` frames
//!
//! ### Step 5: Desync Detection
//!
//! Checksums are compared between peers to detect when game states have diverged.
//! Desyncs typically indicate non-determinism bugs and cannot be automatically
//! recovered - the game must be restarted or resynchronized.
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Game Loop (per frame)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  1. Add local inputs    ──►  InputQueue (local player)      │
//! │  2. Receive network     ──►  InputQueue (remote players)    │
//! │  3. Check for rollback  ──►  If misprediction detected:     │
//! │                              └─► LoadGameState request      │
//! │                              └─► Re-simulate frames         │
//! │  4. Get synchronized    ──►  All players' inputs for frame  │
//! │     inputs                                                   │
//! │  5. Save state          ──►  SavedStates circular buffer    │
//! │  6. Advance simulation  ──►  AdvanceFrame request           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bounds and Limits
//!
//! - **`max_prediction`**: Maximum frames of prediction (default: 8, typical: 7-15)
//!   - Higher = more latency tolerance, more memory, longer rollbacks
//!   - At 60 FPS: 8 frames ≈ 133ms, 15 frames ≈ 250ms
//! - **State buffer size**: `max_prediction + 1` slots in circular buffer
//! - **Input queue length**: Configurable, default 128 frames (~2.1s at 60 FPS)
//!
//! ## Determinism Requirement
//!
//! **Critical**: The game simulation MUST be deterministic. Given the same inputs,
//! every peer must produce identical game states. Non-determinism causes desyncs.
//!
//! Common sources of non-determinism to avoid:
//! - **Floating-point**: Use fixed-point or integers for physics/positions
//! - **HashMap iteration**: Use `BTreeMap` or sort keys before iterating
//! - **System time**: Use frame counter, not wall clock
//! - **Random numbers**: Use the provided deterministic [`Rng`](crate::rng::Rng)
//! - **Uninitialized memory**: Always initialize all fields
//! - **Multithreading**: Run simulation on a single thread
//! - **External I/O**: Only read inputs from the input queue
//!
//! ## Module Structure
//!
//! - [`GameStateCell`] and [`GameStateAccessor`] - Types for saving/loading game states
//! - [`SavedStates`] - Circular buffer holding saved game states
//! - [`SyncLayer`] - The main synchronization layer managing state and inputs

mod game_state_cell;
mod saved_states;

pub use game_state_cell::{GameStateAccessor, GameStateCell};
pub use saved_states::SavedStates;

use crate::frame_info::PlayerInput;
use crate::input_queue::InputQueue;
use crate::network::messages::ConnectionStatus;
use crate::sessions::config::SaveMode;
use crate::telemetry::{InvariantChecker, InvariantViolation, ViolationKind, ViolationSeverity};
use crate::{report_violation, safe_frame_add, safe_frame_sub};
use crate::{
    Config, FortressError, FortressRequest, Frame, IndexOutOfBounds, InputStatus, InputVec,
    InternalErrorKind, InvalidFrameReason, PlayerHandle,
};

/// The synchronization layer manages game state, input queues, and rollback operations.
///
/// # Note
///
/// This type is re-exported in [`__internal`](crate::__internal) for testing and fuzzing.
/// It is not part of the stable public API.
///
/// # Formal Specification Alignment
/// - **Invariants verified**:
///   - INV-1: Frame monotonicity (except during rollback)
///   - INV-2: Rollback bounded by `max_prediction`
///   - INV-6: State availability for rollback frames
///   - INV-7: `last_confirmed_frame <= current_frame`
///   - INV-8: `last_saved_frame <= current_frame`
/// - **Kani proofs**: 14 proofs in `sync_layer.rs` verify bounds and state transitions
/// - **Loom tests**: `GameStateCell` concurrent access verified in `loom-tests/`
pub struct SyncLayer<T>
where
    T: Config,
{
    num_players: usize,
    /// Maximum frames of prediction allowed before rollback is required.
    ///
    /// # Formal Specification Alignment
    /// - **Z3**: `MAX_PREDICTION` in `tests/test_z3_verification.rs`
    max_prediction: usize,
    saved_states: SavedStates<T::State>,
    /// The last frame where all player inputs are confirmed.
    ///
    /// # Formal Specification Alignment
    last_confirmed_frame: Frame,
    /// The most recently saved frame.
    ///
    /// # Formal Specification Alignment
    last_saved_frame: Frame,
    /// The current simulation frame.
    ///
    /// # Formal Specification Alignment
    current_frame: Frame,
    input_queues: Vec<InputQueue<T>>,
}

impl<T: Config> SyncLayer<T> {
    /// Creates a new `SyncLayer` instance with given values and default queue length.
    ///
    /// Note: This function exists for backward compatibility and testing.
    /// The main construction path uses `with_queue_length` via `SessionBuilder`.
    #[allow(dead_code)]
    #[must_use]
    pub fn new(num_players: usize, max_prediction: usize) -> Self {
        Self::with_queue_length(
            num_players,
            max_prediction,
            crate::input_queue::INPUT_QUEUE_LENGTH,
        )
    }

    /// Creates a new `SyncLayer` instance with a custom input queue length.
    ///
    /// # Arguments
    /// * `num_players` - The number of players in the session
    /// * `max_prediction` - Maximum frames of prediction allowed
    /// * `queue_length` - The size of the input queue circular buffer per player
    #[must_use]
    pub fn with_queue_length(
        num_players: usize,
        max_prediction: usize,
        queue_length: usize,
    ) -> Self {
        // initialize input_queues with player indices for deterministic prediction
        let mut input_queues = Vec::new();
        for player_index in 0..num_players {
            // queue_length should be validated before calling this function
            // If it's invalid, report a violation and use a default
            match InputQueue::with_queue_length(player_index, queue_length) {
                Some(queue) => input_queues.push(queue),
                None => {
                    // Fallback: use the default queue length
                    if let Some(queue) = InputQueue::with_queue_length(
                        player_index,
                        crate::input_queue::INPUT_QUEUE_LENGTH,
                    ) {
                        input_queues.push(queue);
                    }
                },
            }
        }
        Self {
            num_players,
            max_prediction,
            last_confirmed_frame: Frame::NULL,
            last_saved_frame: Frame::NULL,
            current_frame: Frame::new(0),
            saved_states: SavedStates::new(max_prediction),
            input_queues,
        }
    }

    /// Returns the current simulation frame.
    ///
    /// # Note
    /// This method is exposed via `__internal` for testing. It is not part of the stable public API.
    #[must_use]
    pub fn current_frame(&self) -> Frame {
        self.current_frame
    }

    /// Advances the simulation by one frame.
    ///
    /// Uses safe arithmetic that reports a violation if overflow would occur.
    /// In practice, at 60 FPS, it would take over a year to reach `i32::MAX`,
    /// but we detect and report it gracefully rather than panicking.
    ///
    /// # Note
    /// This method is exposed via `__internal` for testing. It is not part of the stable public API.
    pub fn advance_frame(&mut self) {
        self.current_frame = safe_frame_add!(self.current_frame, 1, "SyncLayer::advance_frame");
    }

    /// Saves the current game state.
    ///
    /// This method maintains the invariant that `current_frame` is always valid (>= 0),
    /// which is guaranteed by construction (initialized to 0) and by the fact that
    /// the only mutation is via `advance_frame()` which increments it.
    ///
    /// # Note
    /// This method is exposed via `__internal` for testing. It is not part of the stable public API.
    pub fn save_current_state(&mut self) -> FortressRequest<T> {
        self.last_saved_frame = self.current_frame;
        // Debug assertion to catch invariant violations during development.
        // current_frame is initialized to 0 and only incremented, so this should never fail.
        debug_assert!(
            self.current_frame.as_i32() >= 0,
            "Internal invariant violation: current_frame must be non-negative"
        );
        // Use match to handle the theoretical error case gracefully instead of panicking.
        // In the impossible case of an invalid frame, create a default cell.
        let cell = match self.saved_states.get_cell(self.current_frame) {
            Ok(cell) => cell,
            Err(_) => {
                // This should never happen due to our invariants, but if it does,
                // report it and return a default cell to avoid panicking.
                report_violation!(
                    ViolationSeverity::Critical,
                    ViolationKind::InternalError,
                    "save_current_state: current_frame {} failed get_cell - this indicates an internal bug",
                    self.current_frame
                );
                GameStateCell::default()
            },
        };
        FortressRequest::SaveGameState {
            cell,
            frame: self.current_frame,
        }
    }

    /// Sets the frame delay for a player.
    ///
    /// # Errors
    /// Returns `FortressError::InvalidPlayerHandle` if `player_handle >= num_players`.
    /// Returns `FortressError::InvalidRequest` if `delay` exceeds the maximum allowed value.
    ///
    /// # Note
    /// This method is exposed via `__internal` for testing. It is not part of the stable public API.
    pub fn set_frame_delay(
        &mut self,
        player_handle: PlayerHandle,
        delay: usize,
    ) -> Result<(), FortressError> {
        if !player_handle.is_valid_player_for(self.num_players) {
            return Err(FortressError::InvalidPlayerHandle {
                handle: player_handle,
                max_handle: PlayerHandle::new(self.num_players.saturating_sub(1)),
            });
        }
        let len = self.input_queues.len();
        self.input_queues
            .get_mut(player_handle.as_usize())
            .ok_or(FortressError::InternalErrorStructured {
                kind: InternalErrorKind::IndexOutOfBounds(IndexOutOfBounds {
                    name: "input_queues",
                    index: player_handle.as_usize(),
                    length: len,
                }),
            })?
            .set_frame_delay(delay)?;
        Ok(())
    }

    /// Resets the prediction state for all input queues.
    ///
    /// # Note
    /// This method is exposed via `__internal` for testing. It is not part of the stable public API.
    pub fn reset_prediction(&mut self) {
        for i in 0..self.num_players {
            if let Some(queue) = self.input_queues.get_mut(i) {
                queue.reset_prediction();
            }
        }
    }

    /// Loads the gamestate indicated by `frame_to_load`.
    ///
    /// # Errors
    /// Returns `FortressError::InvalidFrame` if:
    /// - `frame_to_load` is `NULL_FRAME`
    /// - `frame_to_load` is not in the past (>= current_frame)
    /// - `frame_to_load` is outside the prediction window
    /// - The saved state for `frame_to_load` doesn't exist or has wrong frame
    ///
    /// # Note
    /// This method is exposed via `__internal` for testing. It is not part of the stable public API.
    pub fn load_frame(
        &mut self,
        frame_to_load: Frame,
    ) -> Result<FortressRequest<T>, FortressError> {
        // The state should not be the current state or the state should not be in the future or too far away in the past
        if frame_to_load.is_null() {
            return Err(FortressError::InvalidFrameStructured {
                frame: frame_to_load,
                reason: InvalidFrameReason::NullFrame,
            });
        }

        if frame_to_load >= self.current_frame {
            return Err(FortressError::InvalidFrameStructured {
                frame: frame_to_load,
                reason: InvalidFrameReason::NotInPast {
                    current_frame: self.current_frame,
                },
            });
        }

        if frame_to_load.as_i32() < self.current_frame.as_i32() - self.max_prediction as i32 {
            return Err(FortressError::InvalidFrameStructured {
                frame: frame_to_load,
                reason: InvalidFrameReason::OutsidePredictionWindow {
                    current_frame: self.current_frame,
                    max_prediction: self.max_prediction,
                },
            });
        }

        let cell = self.saved_states.get_cell(frame_to_load)?;
        #[cfg(not(loom))]
        let cell_frame = cell.0.lock().frame;
        #[cfg(loom)]
        let cell_frame = cell.0.lock().unwrap().frame;
        if cell_frame != frame_to_load {
            return Err(FortressError::InvalidFrameStructured {
                frame: frame_to_load,
                reason: InvalidFrameReason::WrongSavedFrame {
                    saved_frame: cell_frame,
                },
            });
        }
        self.current_frame = frame_to_load;
        // Update last_saved_frame to maintain invariant: last_saved_frame <= current_frame
        // After rollback, we're working from the loaded state, which is now our reference point
        self.last_saved_frame = frame_to_load;

        Ok(FortressRequest::LoadGameState {
            cell,
            frame: frame_to_load,
        })
    }

    /// Adds local input to the corresponding input queue. Checks if the prediction threshold has been reached. Returns the frame number where the input is actually added to.
    /// This number will only be different if the input delay was set to a number higher than 0.
    ///
    /// Returns `Frame::NULL` if the input frame doesn't match the current frame.
    pub(crate) fn add_local_input(
        &mut self,
        player_handle: PlayerHandle,
        input: PlayerInput<T::Input>,
    ) -> Frame {
        // The input provided should match the current frame, we account for input delay later
        if input.frame != self.current_frame {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::FrameSync,
                "Input frame {} doesn't match current frame {}",
                input.frame,
                self.current_frame
            );
            return Frame::NULL;
        }
        self.input_queues
            .get_mut(player_handle.as_usize())
            .map_or(Frame::NULL, |queue| queue.add_input(input))
    }

    /// Adds remote input to the corresponding input queue.
    /// Unlike `add_local_input`, this will not check for correct conditions, as remote inputs have already been checked on another device.
    pub(crate) fn add_remote_input(
        &mut self,
        player_handle: PlayerHandle,
        input: PlayerInput<T::Input>,
    ) {
        if let Some(queue) = self.input_queues.get_mut(player_handle.as_usize()) {
            queue.add_input(input);
        }
    }

    /// Returns inputs for all players for the current frame of the sync layer. If there are none for a specific player, return predictions.
    ///
    /// # Returns
    /// Returns `None` if any input queue operation fails (indicates a severe internal error).
    ///
    /// # Performance
    /// Uses [`InputVec`] (a [`SmallVec`]) to avoid heap allocation for games with 1-4 players.
    pub(crate) fn synchronized_inputs(
        &mut self,
        connect_status: &[ConnectionStatus],
    ) -> Option<InputVec<T::Input>> {
        let num_players = connect_status.len();
        let mut inputs = if num_players <= 4 {
            InputVec::new()
        } else {
            InputVec::with_capacity(num_players)
        };
        for (i, con_stat) in connect_status.iter().enumerate() {
            if con_stat.disconnected && con_stat.last_frame < self.current_frame {
                inputs.push((T::Input::default(), InputStatus::Disconnected));
            } else {
                let queue = self.input_queues.get_mut(i)?;
                inputs.push(queue.input(self.current_frame)?);
            }
        }
        Some(inputs)
    }

    /// Returns confirmed inputs for all players for the current frame of the sync layer.
    pub(crate) fn confirmed_inputs(
        &self,
        frame: Frame,
        connect_status: &[ConnectionStatus],
    ) -> Result<Vec<PlayerInput<T::Input>>, FortressError> {
        let mut inputs = Vec::new();
        for (i, con_stat) in connect_status.iter().enumerate() {
            if con_stat.disconnected && con_stat.last_frame < frame {
                inputs.push(PlayerInput::blank_input(Frame::NULL));
            } else {
                let queue =
                    self.input_queues
                        .get(i)
                        .ok_or(FortressError::InternalErrorStructured {
                            kind: InternalErrorKind::IndexOutOfBounds(IndexOutOfBounds {
                                name: "input_queues",
                                index: i,
                                length: self.input_queues.len(),
                            }),
                        })?;
                inputs.push(queue.confirmed_input(frame)?);
            }
        }
        Ok(inputs)
    }

    /// Sets the last confirmed frame to a given frame. By raising the last confirmed frame, we can discard all previous frames, as they are no longer necessary.
    pub(crate) fn set_last_confirmed_frame(&mut self, mut frame: Frame, save_mode: SaveMode) {
        // don't set the last confirmed frame after the first incorrect frame before a rollback has happened
        let mut first_incorrect: Frame = Frame::NULL;
        for handle in 0..self.num_players {
            if let Some(queue) = self.input_queues.get(handle) {
                first_incorrect = std::cmp::max(first_incorrect, queue.first_incorrect_frame());
            }
        }

        // if sparse saving option is turned on, don't set the last confirmed frame after the last saved frame
        if save_mode == SaveMode::Sparse {
            frame = std::cmp::min(frame, self.last_saved_frame);
        }

        // never delete stuff ahead of the current frame
        frame = std::cmp::min(frame, self.current_frame());

        // if we set the last confirmed frame beyond the first incorrect frame, we discard inputs that we need later for adjusting the gamestate.
        // Clamp frame to not exceed first_incorrect as a safety measure and log if this happens
        if !first_incorrect.is_null() && first_incorrect < frame {
            report_violation!(
                ViolationSeverity::Warning,
                ViolationKind::FrameSync,
                "Clamping confirmed frame {} to first_incorrect {} - this may indicate a bug",
                frame,
                first_incorrect
            );
            frame = first_incorrect;
        }

        self.last_confirmed_frame = frame;
        if self.last_confirmed_frame.as_i32() > 0 {
            let discard_frame = safe_frame_sub!(frame, 1, "SyncLayer::confirm_frame");
            for i in 0..self.num_players {
                if let Some(queue) = self.input_queues.get_mut(i) {
                    queue.discard_confirmed_frames(discard_frame);
                }
            }
        }
    }

    /// Finds the earliest incorrect frame detected by the individual input queues
    pub(crate) fn check_simulation_consistency(&self, mut first_incorrect: Frame) -> Frame {
        for handle in 0..self.num_players {
            if let Some(queue) = self.input_queues.get(handle) {
                let incorrect = queue.first_incorrect_frame();
                if !incorrect.is_null()
                    && (first_incorrect.is_null() || incorrect < first_incorrect)
                {
                    first_incorrect = incorrect;
                }
            }
        }
        first_incorrect
    }

    /// Returns a gamestate through given frame
    pub(crate) fn saved_state_by_frame(&self, frame: Frame) -> Option<GameStateCell<T::State>> {
        let cell = self.saved_states.get_cell(frame).ok()?;

        #[cfg(not(loom))]
        let cell_frame = cell.0.lock().frame;
        #[cfg(loom)]
        let cell_frame = cell.0.lock().unwrap().frame;

        (cell_frame == frame).then_some(cell)
    }

    /// Returns the latest saved frame.
    ///
    /// # Note
    /// This method is exposed via `__internal` for testing. It is not part of the stable public API.
    #[must_use]
    pub fn last_saved_frame(&self) -> Frame {
        self.last_saved_frame
    }

    /// Returns the latest confirmed frame.
    ///
    /// # Note
    /// This method is exposed via `__internal` for testing. It is not part of the stable public API.
    #[must_use]
    pub fn last_confirmed_frame(&self) -> Frame {
        self.last_confirmed_frame
    }
}

impl<T: Config> InvariantChecker for SyncLayer<T> {
    /// Checks the invariants of the SyncLayer.
    ///
    /// # Invariants
    ///
    /// 1. `num_players` must be > 0
    /// 2. `max_prediction` must be > 0
    /// 3. `current_frame` must be >= 0
    /// 4. `last_confirmed_frame` must be <= `current_frame`
    /// 5. `last_saved_frame` must be <= `current_frame`
    /// 6. Input queues count must match `num_players`
    /// 7. Saved states count must be `max_prediction + 1`
    /// 8. All input queues must pass their invariant checks
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        // Invariant 1: num_players > 0
        if self.num_players == 0 {
            return Err(InvariantViolation::new(
                "SyncLayer",
                "num_players must be greater than 0",
            ));
        }

        // Invariant 2: max_prediction > 0
        if self.max_prediction == 0 {
            return Err(InvariantViolation::new(
                "SyncLayer",
                "max_prediction must be greater than 0",
            ));
        }

        // Invariant 3: current_frame >= 0
        if self.current_frame.as_i32() < 0 {
            return Err(
                InvariantViolation::new("SyncLayer", "current_frame must be non-negative")
                    .with_details(format!("current_frame={}", self.current_frame)),
            );
        }

        // Invariant 4: last_confirmed_frame <= current_frame
        if !self.last_confirmed_frame.is_null() && self.last_confirmed_frame > self.current_frame {
            return Err(InvariantViolation::new(
                "SyncLayer",
                "last_confirmed_frame exceeds current_frame",
            )
            .with_details(format!(
                "last_confirmed_frame={}, current_frame={}",
                self.last_confirmed_frame, self.current_frame
            )));
        }

        // Invariant 5: last_saved_frame <= current_frame
        if !self.last_saved_frame.is_null() && self.last_saved_frame > self.current_frame {
            return Err(InvariantViolation::new(
                "SyncLayer",
                "last_saved_frame exceeds current_frame",
            )
            .with_details(format!(
                "last_saved_frame={}, current_frame={}",
                self.last_saved_frame, self.current_frame
            )));
        }

        // Invariant 6: input queues count matches num_players
        if self.input_queues.len() != self.num_players {
            return Err(InvariantViolation::new(
                "SyncLayer",
                "input_queues count does not match num_players",
            )
            .with_details(format!(
                "input_queues.len()={}, num_players={}",
                self.input_queues.len(),
                self.num_players
            )));
        }

        // Invariant 7: saved states count is max_prediction + 1
        let expected_states = self.max_prediction + 1;
        if self.saved_states.states.len() != expected_states {
            return Err(
                InvariantViolation::new("SyncLayer", "saved_states count is incorrect")
                    .with_details(format!(
                        "saved_states.len()={}, expected={}",
                        self.saved_states.states.len(),
                        expected_states
                    )),
            );
        }

        // Invariant 8: all input queues pass their invariant checks
        for (i, queue) in self.input_queues.iter().enumerate() {
            if let Err(violation) = queue.check_invariants() {
                return Err(InvariantViolation::new(
                    "SyncLayer",
                    format!("input_queue[{}] invariant violated", i),
                )
                .with_details(violation.to_string()));
            }
        }

        Ok(())
    }
}

// #########
// # TESTS #
// #########

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod sync_layer_tests {

    use super::*;
    use serde::{Deserialize, Serialize};
    use std::net::SocketAddr;

    #[repr(C)]
    #[derive(Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct TestInput {
        inp: u8,
    }

    struct TestConfig;

    impl Config for TestConfig {
        type Input = TestInput;
        type State = u8;
        type Address = SocketAddr;
    }

    #[test]
    fn test_different_delays() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        let p1_delay = 2;
        let p2_delay = 0;
        sync_layer
            .set_frame_delay(PlayerHandle::new(0), p1_delay)
            .unwrap();
        sync_layer
            .set_frame_delay(PlayerHandle::new(1), p2_delay)
            .unwrap();

        let mut dummy_connect_status = Vec::new();
        dummy_connect_status.push(ConnectionStatus::default());
        dummy_connect_status.push(ConnectionStatus::default());

        for i in 0..20i32 {
            let game_input = PlayerInput::new(Frame::new(i), TestInput { inp: i as u8 });
            // adding input as remote to avoid prediction threshold detection
            sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
            sync_layer.add_remote_input(PlayerHandle::new(1), game_input);
            // update the dummy connect status
            dummy_connect_status[0].last_frame = Frame::new(i);
            dummy_connect_status[1].last_frame = Frame::new(i);

            if i >= 3 {
                let sync_inputs = sync_layer
                    .synchronized_inputs(&dummy_connect_status)
                    .expect("synchronized inputs should be available");
                let player0_inputs = sync_inputs[0].0.inp;
                let player1_inputs = sync_inputs[1].0.inp;
                assert_eq!(player0_inputs, i as u8 - p1_delay as u8);
                assert_eq!(player1_inputs, i as u8 - p2_delay as u8);
            }

            sync_layer.advance_frame();
        }
    }

    #[test]
    fn test_set_frame_delay_invalid_handle() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        // Valid handles are 0 and 1 (num_players = 2)
        let result = sync_layer.set_frame_delay(PlayerHandle::new(2), 0);
        assert!(result.is_err());
        match result {
            Err(FortressError::InvalidPlayerHandle { handle, max_handle }) => {
                assert_eq!(handle, PlayerHandle::new(2));
                assert_eq!(max_handle, PlayerHandle::new(1));
            },
            _ => panic!("Expected InvalidPlayerHandle error"),
        }
    }

    #[test]
    fn test_sync_layer_new_initializes_correctly() {
        let sync_layer = SyncLayer::<TestConfig>::new(4, 7);
        assert_eq!(sync_layer.current_frame(), Frame::new(0));
        assert_eq!(sync_layer.last_confirmed_frame(), Frame::NULL);
        assert_eq!(sync_layer.last_saved_frame(), Frame::NULL);
        assert_eq!(sync_layer.num_players, 4);
        assert_eq!(sync_layer.max_prediction, 7);
        assert_eq!(sync_layer.input_queues.len(), 4);
    }

    #[test]
    fn test_advance_frame() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        assert_eq!(sync_layer.current_frame(), Frame::new(0));
        sync_layer.advance_frame();
        assert_eq!(sync_layer.current_frame(), Frame::new(1));
        sync_layer.advance_frame();
        assert_eq!(sync_layer.current_frame(), Frame::new(2));
    }

    #[test]
    fn test_save_current_state() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save state at frame 0
        let request = sync_layer.save_current_state();
        match request {
            FortressRequest::SaveGameState { cell, frame } => {
                assert_eq!(frame, Frame::new(0));
                // Save some data
                cell.save(Frame::new(0), Some(42u8), Some(1234));
                assert_eq!(cell.frame(), Frame::new(0));
            },
            _ => panic!("Expected SaveGameState request"),
        }
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(0));

        // Advance and save at frame 1
        sync_layer.advance_frame();
        let request = sync_layer.save_current_state();
        match request {
            FortressRequest::SaveGameState { frame, .. } => {
                assert_eq!(frame, Frame::new(1));
            },
            _ => panic!("Expected SaveGameState request"),
        }
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(1));
    }

    #[test]
    fn test_load_frame_success() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save state at frame 0
        let request = sync_layer.save_current_state();
        if let FortressRequest::SaveGameState { cell, frame } = request {
            cell.save(frame, Some(100u8), None);
        }

        // Advance a few frames
        sync_layer.advance_frame();
        sync_layer.advance_frame();
        sync_layer.advance_frame();
        assert_eq!(sync_layer.current_frame(), Frame::new(3));

        // Load frame 0
        let request = sync_layer.load_frame(Frame::new(0)).unwrap();
        match request {
            FortressRequest::LoadGameState { frame, cell } => {
                assert_eq!(frame, Frame::new(0));
                assert_eq!(cell.load(), Some(100u8));
            },
            _ => panic!("Expected LoadGameState request"),
        }
        assert_eq!(sync_layer.current_frame(), Frame::new(0));
    }

    #[test]
    fn test_load_frame_null_frame_error() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        sync_layer.advance_frame();

        let result = sync_layer.load_frame(Frame::NULL);
        assert!(result.is_err());
        match result {
            Err(FortressError::InvalidFrameStructured { frame, reason }) => {
                assert_eq!(frame, Frame::NULL);
                assert!(matches!(reason, InvalidFrameReason::NullFrame));
            },
            _ => panic!("Expected InvalidFrameStructured error"),
        }
    }

    #[test]
    fn test_load_frame_future_frame_error() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        // Current frame is 0

        // Try to load frame 5 (in the future)
        let result = sync_layer.load_frame(Frame::new(5));
        assert!(result.is_err());
        match result {
            Err(FortressError::InvalidFrameStructured { frame, reason }) => {
                assert_eq!(frame, Frame::new(5));
                assert!(matches!(reason, InvalidFrameReason::NotInPast { .. }));
            },
            _ => panic!("Expected InvalidFrameStructured error"),
        }
    }

    #[test]
    fn test_load_frame_current_frame_error() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        sync_layer.advance_frame();
        sync_layer.advance_frame();
        // Current frame is 2

        // Try to load current frame
        let result = sync_layer.load_frame(Frame::new(2));
        assert!(result.is_err());
        match result {
            Err(FortressError::InvalidFrameStructured { frame, reason }) => {
                assert_eq!(frame, Frame::new(2));
                assert!(matches!(reason, InvalidFrameReason::NotInPast { .. }));
            },
            _ => panic!("Expected InvalidFrameStructured error"),
        }
    }

    #[test]
    fn test_load_frame_outside_prediction_window() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3); // max_prediction = 3

        // Advance to frame 10
        for _ in 0..10 {
            sync_layer.advance_frame();
        }
        assert_eq!(sync_layer.current_frame(), Frame::new(10));

        // Try to load frame 0 (too far back, outside prediction window of 3)
        let result = sync_layer.load_frame(Frame::new(0));
        assert!(result.is_err());
        match result {
            Err(FortressError::InvalidFrameStructured { frame, reason }) => {
                assert_eq!(frame, Frame::new(0));
                assert!(matches!(
                    reason,
                    InvalidFrameReason::OutsidePredictionWindow { .. }
                ));
            },
            _ => panic!("Expected InvalidFrameStructured error"),
        }
    }

    /// Test that rollback to frame 0 works correctly when within prediction window.
    /// This is an important edge case: frame 0 is valid and should be loadable.
    #[test]
    fn test_load_frame_zero_within_prediction_window() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8); // max_prediction = 8

        // Save state at frame 0
        let request = sync_layer.save_current_state();
        if let FortressRequest::SaveGameState { cell, frame } = request {
            assert_eq!(frame, Frame::new(0));
            cell.save(frame, Some(42u8), Some(12345));
        }

        // Advance to frame 5 (within prediction window of 8)
        for _ in 0..5 {
            sync_layer.advance_frame();
        }
        assert_eq!(sync_layer.current_frame(), Frame::new(5));

        // Load frame 0 - should succeed
        let result = sync_layer.load_frame(Frame::new(0));
        assert!(
            result.is_ok(),
            "Frame 0 should be loadable within prediction window"
        );

        match result.unwrap() {
            FortressRequest::LoadGameState { frame, cell } => {
                assert_eq!(frame, Frame::new(0));
                assert_eq!(cell.frame(), Frame::new(0));
                assert_eq!(cell.load(), Some(42u8));
                assert_eq!(cell.checksum(), Some(12345));
            },
            _ => panic!("Expected LoadGameState request"),
        }

        // Current frame should now be 0
        assert_eq!(sync_layer.current_frame(), Frame::new(0));
    }

    /// Test that frame 0 rollback fails when outside prediction window.
    #[test]
    fn test_load_frame_zero_outside_prediction_window() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 4); // max_prediction = 4

        // Save state at frame 0
        let request = sync_layer.save_current_state();
        if let FortressRequest::SaveGameState { cell, frame } = request {
            cell.save(frame, Some(42u8), None);
        }

        // Advance to frame 6 (frame 0 is now outside prediction window of 4)
        for _ in 0..6 {
            sync_layer.advance_frame();
        }
        assert_eq!(sync_layer.current_frame(), Frame::new(6));

        // Load frame 0 - should fail (outside prediction window)
        let result = sync_layer.load_frame(Frame::new(0));
        assert!(result.is_err());

        match result {
            Err(FortressError::InvalidFrameStructured { frame, reason }) => {
                assert_eq!(frame, Frame::new(0));
                assert!(matches!(
                    reason,
                    InvalidFrameReason::OutsidePredictionWindow { .. }
                ));
            },
            _ => panic!("Expected InvalidFrameStructured error"),
        }
    }

    // =========================================================================
    // Rollback Invariant Tests
    // These tests verify that invariants are maintained during rollback:
    // - INV-4: last_confirmed_frame <= current_frame
    // - INV-5: last_saved_frame <= current_frame
    // =========================================================================

    /// Test that load_frame updates last_saved_frame to maintain invariant.
    ///
    /// This is a critical test case discovered during TLA+ verification:
    /// After rollback, last_saved_frame must be <= current_frame.
    #[test]
    fn test_load_frame_updates_last_saved_frame_invariant() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save state at frame 0
        let request = sync_layer.save_current_state();
        if let FortressRequest::SaveGameState { cell, frame } = request {
            cell.save(frame, Some(100u8), None);
        }
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(0));

        // Advance to frame 5 and save state
        for i in 1..=5 {
            sync_layer.advance_frame();
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
        }
        assert_eq!(sync_layer.current_frame(), Frame::new(5));
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(5));

        // Rollback to frame 2
        sync_layer.load_frame(Frame::new(2)).unwrap();

        // INVARIANT CHECK: last_saved_frame must be <= current_frame after rollback
        assert_eq!(sync_layer.current_frame(), Frame::new(2));
        assert_eq!(
            sync_layer.last_saved_frame(),
            Frame::new(2),
            "last_saved_frame should be updated to rollback target"
        );
        assert!(
            sync_layer.last_saved_frame() <= sync_layer.current_frame(),
            "Invariant violated: last_saved_frame ({}) > current_frame ({})",
            sync_layer.last_saved_frame(),
            sync_layer.current_frame()
        );
    }

    /// Test that rollback to frame 0 correctly updates last_saved_frame.
    #[test]
    fn test_load_frame_zero_updates_last_saved_frame() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save state at frame 0
        let request = sync_layer.save_current_state();
        if let FortressRequest::SaveGameState { cell, frame } = request {
            cell.save(frame, Some(0u8), None);
        }

        // Advance to frame 3 and save each frame
        for i in 1..=3 {
            sync_layer.advance_frame();
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
        }
        assert_eq!(sync_layer.current_frame(), Frame::new(3));
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(3));

        // Rollback all the way to frame 0
        sync_layer.load_frame(Frame::new(0)).unwrap();

        // Verify invariant
        assert_eq!(sync_layer.current_frame(), Frame::new(0));
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(0));
    }

    /// Test multiple consecutive rollbacks maintain invariants.
    #[test]
    fn test_multiple_rollbacks_maintain_invariants() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save states for frames 0-5
        for i in 0..=5 {
            if i > 0 {
                sync_layer.advance_frame();
            }
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
        }

        // First rollback: 5 -> 3
        let _ = sync_layer.load_frame(Frame::new(3));
        assert_eq!(sync_layer.current_frame(), Frame::new(3));
        assert!(sync_layer.last_saved_frame() <= sync_layer.current_frame());

        // Re-advance to frame 5
        for _ in 0..2 {
            sync_layer.advance_frame();
        }

        // Second rollback: 5 -> 1
        let _ = sync_layer.load_frame(Frame::new(1));
        assert_eq!(sync_layer.current_frame(), Frame::new(1));
        assert!(sync_layer.last_saved_frame() <= sync_layer.current_frame());

        // Third rollback: 1 -> 0
        sync_layer.advance_frame();
        let _ = sync_layer.load_frame(Frame::new(0));
        assert_eq!(sync_layer.current_frame(), Frame::new(0));
        assert!(sync_layer.last_saved_frame() <= sync_layer.current_frame());
    }

    /// Test that check_invariants passes after rollback.
    #[test]
    fn test_check_invariants_after_rollback() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Setup: save states for frames 0-4
        for i in 0..=4 {
            if i > 0 {
                sync_layer.advance_frame();
            }
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
        }

        // Verify invariants before rollback
        assert!(
            sync_layer.check_invariants().is_ok(),
            "Invariants should pass before rollback"
        );

        // Rollback to frame 1
        let _ = sync_layer.load_frame(Frame::new(1));

        // Verify invariants after rollback
        assert!(
            sync_layer.check_invariants().is_ok(),
            "Invariants should pass after rollback"
        );
    }

    /// Test rollback at the edge of prediction window maintains invariants.
    #[test]
    fn test_rollback_at_prediction_window_edge() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 4); // max_prediction = 4

        // Save states for frames 0-4
        for i in 0..=4 {
            if i > 0 {
                sync_layer.advance_frame();
            }
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
        }
        assert_eq!(sync_layer.current_frame(), Frame::new(4));

        // Rollback exactly to the edge of prediction window (frame 0)
        // current_frame (4) - max_prediction (4) = 0
        sync_layer.load_frame(Frame::new(0)).unwrap();

        // Verify invariants
        assert_eq!(sync_layer.current_frame(), Frame::new(0));
        assert!(sync_layer.last_saved_frame() <= sync_layer.current_frame());
        sync_layer.check_invariants().unwrap();
    }

    /// Test that last_confirmed_frame invariant is maintained.
    /// Note: last_confirmed_frame is set separately from load_frame, but
    /// this test ensures the SyncLayer invariant checker works correctly.
    #[test]
    fn test_last_confirmed_frame_invariant() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Add inputs and advance
        for i in 0..5i32 {
            let game_input = PlayerInput::new(Frame::new(i), TestInput { inp: i as u8 });
            sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
            sync_layer.add_remote_input(PlayerHandle::new(1), game_input);
            sync_layer.advance_frame();
        }

        // Set confirmed frame
        sync_layer.set_last_confirmed_frame(Frame::new(3), SaveMode::EveryFrame);

        // Verify invariant: last_confirmed_frame <= current_frame
        assert!(sync_layer.last_confirmed_frame() <= sync_layer.current_frame());
        sync_layer.check_invariants().unwrap();
    }

    /// Test that set_last_confirmed_frame clamps to current_frame.
    /// Note: This test uses a smaller confirmed frame to avoid triggering
    /// a separate issue in discard_confirmed_frames when discarding all inputs.
    #[test]
    fn test_set_last_confirmed_frame_clamps_to_current() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Add inputs and advance to frame 10
        for i in 0..10i32 {
            let game_input = PlayerInput::new(Frame::new(i), TestInput { inp: i as u8 });
            sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
            sync_layer.add_remote_input(PlayerHandle::new(1), game_input);
            sync_layer.advance_frame();
        }
        assert_eq!(sync_layer.current_frame(), Frame::new(10));

        // Try to set confirmed frame beyond current frame
        sync_layer.set_last_confirmed_frame(Frame::new(15), SaveMode::EveryFrame);

        // Should be clamped to current_frame
        assert!(
            sync_layer.last_confirmed_frame() <= sync_layer.current_frame(),
            "last_confirmed_frame ({}) should be clamped to current_frame ({})",
            sync_layer.last_confirmed_frame(),
            sync_layer.current_frame()
        );

        // The confirmed frame should be at most current_frame
        assert_eq!(sync_layer.last_confirmed_frame(), Frame::new(10));
    }

    /// Test invariant checking catches invalid states.
    #[test]
    fn test_invariant_checker_validates_player_count() {
        // Create sync layer with valid player count
        let sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        sync_layer.check_invariants().unwrap();

        // Note: We can't easily create an invalid state from outside,
        // so this test just verifies the checker runs successfully.
    }

    /// Test full rollback cycle: advance, rollback, re-advance, verify invariants.
    #[test]
    fn test_full_rollback_cycle_maintains_invariants() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Phase 1: Advance to frame 5, saving states
        for i in 0..=5 {
            if i > 0 {
                sync_layer.advance_frame();
            }
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
        }
        assert!(sync_layer.check_invariants().is_ok(), "Before rollback");

        // Phase 2: Rollback to frame 2
        let _ = sync_layer.load_frame(Frame::new(2));
        assert!(sync_layer.check_invariants().is_ok(), "After rollback");
        assert_eq!(sync_layer.current_frame(), Frame::new(2));
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(2));

        // Phase 3: Re-advance to frame 5, saving states again
        for _ in 0..3 {
            sync_layer.advance_frame();
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(99u8), None);
            }
        }
        assert!(sync_layer.check_invariants().is_ok(), "After re-advance");
        assert_eq!(sync_layer.current_frame(), Frame::new(5));

        // Phase 4: Another rollback
        let _ = sync_layer.load_frame(Frame::new(3));
        assert!(
            sync_layer.check_invariants().is_ok(),
            "After second rollback"
        );
        assert_eq!(sync_layer.current_frame(), Frame::new(3));
        assert!(sync_layer.last_saved_frame() <= sync_layer.current_frame());
    }

    #[test]
    fn test_saved_state_by_frame_found() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save state at frame 0
        let request = sync_layer.save_current_state();
        if let FortressRequest::SaveGameState { cell, frame } = request {
            cell.save(frame, Some(77u8), Some(9999));
        }

        // Retrieve the saved state
        let cell = sync_layer.saved_state_by_frame(Frame::new(0));
        assert!(cell.is_some());
        let cell = cell.unwrap();
        assert_eq!(cell.frame(), Frame::new(0));
        assert_eq!(cell.checksum(), Some(9999));
    }

    #[test]
    fn test_saved_state_by_frame_not_found() {
        let sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Frame 5 was never saved
        let cell = sync_layer.saved_state_by_frame(Frame::new(5));
        assert!(cell.is_none());
    }

    #[test]
    fn test_saved_state_by_frame_negative() {
        let sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Negative frame
        let cell = sync_layer.saved_state_by_frame(Frame::new(-1));
        assert!(cell.is_none());
    }

    #[test]
    fn test_set_last_confirmed_frame() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Add some inputs
        for i in 0..10i32 {
            let game_input = PlayerInput::new(Frame::new(i), TestInput { inp: i as u8 });
            sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
            sync_layer.add_remote_input(PlayerHandle::new(1), game_input);
            sync_layer.advance_frame();
        }

        // Confirm up to frame 5
        sync_layer.set_last_confirmed_frame(Frame::new(5), SaveMode::EveryFrame);
        assert_eq!(sync_layer.last_confirmed_frame(), Frame::new(5));
    }

    #[test]
    fn test_set_last_confirmed_frame_with_sparse_saving() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save state at frame 0
        sync_layer.save_current_state();

        // Advance and add inputs
        for i in 0..10i32 {
            let game_input = PlayerInput::new(Frame::new(i), TestInput { inp: i as u8 });
            sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
            sync_layer.add_remote_input(PlayerHandle::new(1), game_input);
            sync_layer.advance_frame();
        }

        // With sparse saving, confirmed frame should not exceed last saved frame (0)
        sync_layer.set_last_confirmed_frame(Frame::new(5), SaveMode::Sparse);
        assert_eq!(sync_layer.last_confirmed_frame(), Frame::new(0));
    }

    #[test]
    fn test_check_simulation_consistency_no_errors() {
        let sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        let result = sync_layer.check_simulation_consistency(Frame::NULL);
        assert_eq!(result, Frame::NULL);
    }

    #[test]
    fn test_reset_prediction() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Add some inputs
        let game_input = PlayerInput::new(Frame::new(0), TestInput { inp: 1 });
        sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
        sync_layer.add_remote_input(PlayerHandle::new(1), game_input);

        // Get input for future frame (triggers prediction)
        let connect_status = vec![ConnectionStatus::default(); 2];
        let _ = sync_layer.synchronized_inputs(&connect_status);

        // Reset predictions
        sync_layer.reset_prediction();
        // Should not panic and should clear prediction state
    }

    #[test]
    fn test_synchronized_inputs_with_disconnected_player() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Add input for player 0
        let game_input = PlayerInput::new(Frame::new(0), TestInput { inp: 42 });
        sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
        sync_layer.add_remote_input(PlayerHandle::new(1), game_input);

        // Player 1 disconnected before current frame
        let mut connect_status = vec![ConnectionStatus::default(); 2];
        connect_status[1].disconnected = true;
        connect_status[1].last_frame = Frame::NULL; // Disconnected before frame 0

        let inputs = sync_layer
            .synchronized_inputs(&connect_status)
            .expect("synchronized inputs should be available");
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].1, InputStatus::Confirmed);
        assert_eq!(inputs[1].1, InputStatus::Disconnected);
    }

    #[test]
    fn test_confirmed_inputs_with_disconnected_player() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Add input for both players
        let game_input = PlayerInput::new(Frame::new(0), TestInput { inp: 42 });
        sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
        sync_layer.add_remote_input(PlayerHandle::new(1), game_input);

        // Player 1 disconnected before frame 0
        let mut connect_status = vec![ConnectionStatus::default(); 2];
        connect_status[1].disconnected = true;
        connect_status[1].last_frame = Frame::NULL;

        let inputs = sync_layer
            .confirmed_inputs(Frame::new(0), &connect_status)
            .unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].input.inp, 42);
        assert_eq!(inputs[1].frame, Frame::NULL); // Blank input for disconnected
    }

    #[test]
    fn test_game_state_cell_save_load() {
        let cell = GameStateCell::<u32>::default();

        // Initially no data
        assert!(cell.load().is_none());

        // Save data
        cell.save(Frame::new(5), Some(12345), Some(999));

        // Load data
        assert_eq!(cell.frame(), Frame::new(5));
        assert_eq!(cell.checksum(), Some(999));
        assert_eq!(cell.load(), Some(12345));
    }

    #[test]
    fn test_game_state_cell_data_accessor() {
        let cell = GameStateCell::<String>::default();
        cell.save(Frame::new(1), Some("hello".to_string()), None);

        let accessor = cell.data();
        assert!(accessor.is_some());
        let accessor = accessor.unwrap();
        assert_eq!(&*accessor, "hello");
    }

    #[test]
    #[allow(clippy::redundant_clone)] // Testing Clone trait - cell2 shares Arc with cell1
    fn test_game_state_cell_clone() {
        let cell1 = GameStateCell::<u8>::default();
        cell1.save(Frame::new(10), Some(200), Some(5555));

        let cell2 = cell1.clone();

        // Both should point to same data (Arc clone)
        assert_eq!(cell2.frame(), Frame::new(10));
        assert_eq!(cell2.load(), Some(200));

        // Modifying through one affects the other
        cell1.save(Frame::new(11), Some(201), Some(6666));
        assert_eq!(cell2.frame(), Frame::new(11));
        assert_eq!(cell2.load(), Some(201));
    }

    #[test]
    fn test_game_state_cell_null_frame_rejected() {
        let cell = GameStateCell::<u32>::default();

        // Saving with null frame should return false
        let result = cell.save(Frame::NULL, Some(42), None);
        assert!(!result);

        // Cell should remain empty/unchanged
        assert!(cell.load().is_none());
    }

    #[test]
    fn test_game_state_cell_debug_format() {
        let cell = GameStateCell::<u32>::default();
        cell.save(Frame::new(42), Some(12345), Some(0xDEAD_BEEF));

        let debug_str = format!("{:?}", cell);
        assert!(debug_str.contains("GameStateCell"));
        assert!(debug_str.contains("42") || debug_str.contains("frame"));
    }

    #[test]
    fn test_game_state_cell_empty_debug() {
        let cell = GameStateCell::<u32>::default();
        let debug_str = format!("{:?}", cell);
        assert!(debug_str.contains("GameStateCell"));
    }

    #[test]
    fn test_game_state_cell_save_none_data() {
        let cell = GameStateCell::<u32>::default();

        // Save with None data
        let result = cell.save(Frame::new(1), None, Some(123));
        assert!(result);

        // Load returns None
        assert!(cell.load().is_none());
        assert!(cell.data().is_none());

        // But frame and checksum are set
        assert_eq!(cell.frame(), Frame::new(1));
        assert_eq!(cell.checksum(), Some(123));
    }

    #[test]
    fn test_game_state_cell_save_none_checksum() {
        let cell = GameStateCell::<u32>::default();

        // Save with None checksum
        let result = cell.save(Frame::new(5), Some(42), None);
        assert!(result);

        assert_eq!(cell.load(), Some(42));
        assert_eq!(cell.checksum(), None);
    }

    #[test]
    fn test_game_state_cell_overwrite() {
        let cell = GameStateCell::<u32>::default();

        // First save
        cell.save(Frame::new(1), Some(100), Some(1));
        assert_eq!(cell.load(), Some(100));

        // Overwrite with new data
        cell.save(Frame::new(2), Some(200), Some(2));
        assert_eq!(cell.load(), Some(200));
        assert_eq!(cell.frame(), Frame::new(2));
        assert_eq!(cell.checksum(), Some(2));
    }

    #[test]
    fn test_game_state_cell_data_accessor_deref() {
        let cell = GameStateCell::<Vec<i32>>::default();
        cell.save(Frame::new(1), Some(vec![1, 2, 3]), None);

        let accessor = cell.data().unwrap();
        // Use Deref to access Vec methods
        assert_eq!(accessor.len(), 3);
        assert_eq!(accessor[0], 1);
    }

    #[test]
    fn test_game_state_cell_data_accessor_mut_dangerous() {
        let cell = GameStateCell::<Vec<i32>>::default();
        cell.save(Frame::new(1), Some(vec![1, 2, 3]), None);

        {
            let mut accessor = cell.data().unwrap();
            // Use the dangerous mut accessor
            let data = accessor.as_mut_dangerous();
            data.push(4);
        }

        // Verify the modification persisted
        let loaded = cell.load().unwrap();
        assert_eq!(loaded, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_game_state_cell_data_returns_none_when_empty() {
        let cell = GameStateCell::<u32>::default();
        assert!(cell.data().is_none());

        // Save None explicitly
        cell.save(Frame::new(1), None, None);
        assert!(cell.data().is_none());
    }

    // ==========================================
    // Invariant Checker Tests
    // ==========================================

    #[test]
    fn test_invariant_checker_new_sync_layer() {
        let sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        sync_layer.check_invariants().unwrap();
    }

    #[test]
    fn test_invariant_checker_after_advance_frame() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        for _ in 0..20 {
            sync_layer.advance_frame();
            sync_layer.check_invariants().unwrap();
        }
    }

    #[test]
    fn test_invariant_checker_after_save_state() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        for i in 0..10 {
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
            sync_layer.check_invariants().unwrap();
            sync_layer.advance_frame();
        }
    }

    #[test]
    fn test_invariant_checker_after_add_inputs() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        for i in 0..10i32 {
            let game_input = PlayerInput::new(Frame::new(i), TestInput { inp: i as u8 });
            sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
            sync_layer.add_remote_input(PlayerHandle::new(1), game_input);
            sync_layer.check_invariants().unwrap();
            sync_layer.advance_frame();
        }
    }

    #[test]
    fn test_invariant_checker_after_set_last_confirmed_frame() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        for i in 0..10i32 {
            let game_input = PlayerInput::new(Frame::new(i), TestInput { inp: i as u8 });
            sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
            sync_layer.add_remote_input(PlayerHandle::new(1), game_input);
            sync_layer.advance_frame();
        }

        sync_layer.set_last_confirmed_frame(Frame::new(5), SaveMode::EveryFrame);
        sync_layer.check_invariants().unwrap();
    }

    #[test]
    fn test_invariant_checker_with_frame_delay() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);
        sync_layer.set_frame_delay(PlayerHandle::new(0), 2).unwrap();
        sync_layer.set_frame_delay(PlayerHandle::new(1), 3).unwrap();

        sync_layer.check_invariants().unwrap();

        for i in 0..10i32 {
            let game_input = PlayerInput::new(Frame::new(i), TestInput { inp: i as u8 });
            sync_layer.add_remote_input(PlayerHandle::new(0), game_input);
            sync_layer.add_remote_input(PlayerHandle::new(1), game_input);
            sync_layer.advance_frame();
            sync_layer.check_invariants().unwrap();
        }
    }

    // ==========================================
    // save_current_state Invariant Tests
    // ==========================================

    /// Verifies that save_current_state maintains the current_frame invariant
    /// by checking that current_frame is always non-negative.
    #[test]
    fn test_save_current_state_maintains_frame_invariant() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save at frame 0 - the initial state
        let request = sync_layer.save_current_state();
        match &request {
            FortressRequest::SaveGameState { frame, .. } => {
                assert!(frame.as_i32() >= 0, "Frame should be non-negative");
                assert_eq!(*frame, Frame::new(0));
            },
            _ => panic!("Expected SaveGameState request"),
        }

        // Advance many frames and verify invariant holds at each
        for expected_frame in 1..100 {
            sync_layer.advance_frame();
            let request = sync_layer.save_current_state();
            match &request {
                FortressRequest::SaveGameState { frame, .. } => {
                    assert!(frame.as_i32() >= 0, "Frame should be non-negative");
                    assert_eq!(*frame, Frame::new(expected_frame));
                },
                _ => panic!("Expected SaveGameState request"),
            }
        }
    }

    /// Verifies that save_current_state correctly updates last_saved_frame.
    #[test]
    fn test_save_current_state_updates_last_saved_frame() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Initially last_saved_frame is NULL
        assert_eq!(sync_layer.last_saved_frame(), Frame::NULL);

        // After saving, it should be updated
        sync_layer.save_current_state();
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(0));

        // Advance and save again
        sync_layer.advance_frame();
        sync_layer.save_current_state();
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(1));
    }

    /// Verifies that save_current_state works correctly after rollback.
    #[test]
    fn test_save_current_state_after_rollback() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Save and advance several frames
        for i in 0..5 {
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
            sync_layer.advance_frame();
        }

        assert_eq!(sync_layer.current_frame(), Frame::new(5));

        // Load frame 2 (rollback)
        sync_layer.load_frame(Frame::new(2)).unwrap();
        assert_eq!(sync_layer.current_frame(), Frame::new(2));

        // Now save_current_state should work correctly at frame 2
        let request = sync_layer.save_current_state();
        match &request {
            FortressRequest::SaveGameState { frame, .. } => {
                assert_eq!(*frame, Frame::new(2));
            },
            _ => panic!("Expected SaveGameState request"),
        }
        assert_eq!(sync_layer.last_saved_frame(), Frame::new(2));
    }

    /// Verifies save_current_state works correctly at frame 0 (boundary condition).
    #[test]
    fn test_save_current_state_at_frame_zero() {
        let sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Should work correctly at frame 0
        assert_eq!(sync_layer.current_frame(), Frame::new(0));

        // Note: We use a non-mutable borrow pattern to test the const-ness
        // but save_current_state needs &mut self, so this is mainly documenting
        // that frame 0 is a valid state
        let mut sync_layer = sync_layer;
        let request = sync_layer.save_current_state();
        match request {
            FortressRequest::SaveGameState { frame, cell } => {
                assert_eq!(frame, Frame::new(0));
                // Cell should be usable
                cell.save(Frame::new(0), Some(42u8), Some(12345));
                assert_eq!(cell.frame(), Frame::new(0));
                assert_eq!(cell.load(), Some(42u8));
            },
            _ => panic!("Expected SaveGameState request"),
        }
    }

    /// Verifies that save_current_state provides correct cell cycling
    /// when frames exceed max_prediction.
    #[test]
    fn test_save_current_state_cell_cycling() {
        const MAX_PREDICTION: usize = 4;
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, MAX_PREDICTION);

        // Save more frames than we have cells (max_prediction + 1 = 5 cells)
        // Frame 0 and Frame 5 should use the same cell slot (index 0)
        // Frame 1 and Frame 6 should use the same cell slot (index 1)

        // First, save frames 0-4
        for i in 0..=MAX_PREDICTION {
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some((i * 10) as u8), None);
            }
            if i < MAX_PREDICTION {
                sync_layer.advance_frame();
            }
        }

        // Now at frame 4, advance to frame 5
        sync_layer.advance_frame();
        assert_eq!(sync_layer.current_frame(), Frame::new(5));

        // Save at frame 5 - this should overwrite cell slot 0
        let request = sync_layer.save_current_state();
        if let FortressRequest::SaveGameState { cell, frame } = request {
            assert_eq!(frame, Frame::new(5));
            cell.save(frame, Some(50u8), None);
            // Verify the cell now has frame 5's data
            assert_eq!(cell.load(), Some(50u8));
        }
    }

    /// Documents the invariant that save_current_state relies on:
    /// current_frame is always non-negative because it's initialized to 0
    /// and only modified by advance_frame() which increments it.
    #[test]
    fn test_save_current_state_invariant_documentation() {
        // This test documents and verifies the invariant that save_current_state relies on.
        //
        // Invariant: current_frame >= 0
        //
        // Proof:
        // 1. SyncLayer::new() initializes current_frame to Frame::new(0)
        // 2. advance_frame() is the only method that modifies current_frame
        // 3. advance_frame() only increments: self.current_frame += 1
        // 4. load_frame() can reduce current_frame but only to a frame that was
        //    previously valid (saved state exists)
        // 5. Therefore, current_frame is always >= 0
        //
        // The save_current_state() method uses this invariant to call get_cell()
        // which requires frame >= 0. If this invariant were violated (which should
        // be impossible), the telemetry system would report a Critical violation.

        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 8);

        // Verify initial state
        assert_eq!(sync_layer.current_frame(), Frame::new(0));
        assert!(sync_layer.current_frame().as_i32() >= 0);

        // Verify after many operations
        for _ in 0..1000 {
            sync_layer.advance_frame();
            assert!(sync_layer.current_frame().as_i32() >= 0);
        }
    }
}

// ###################
// # KANI PROOFS     #
// ###################

/// Kani proofs for SyncLayer state consistency.
///
/// These proofs verify:
/// - INV-1: Frame monotonicity (current_frame never decreases except during rollback)
/// - INV-7: Confirmed frame consistency (last_confirmed_frame <= current_frame)
/// - INV-8: Saved frame consistency (last_saved_frame <= current_frame)
/// - State cell management and rollback bounds
///
/// Note: Requires Kani verifier. Install with:
///   cargo install --locked kani-verifier
///   cargo kani setup
///
/// Run proofs with:
///   cargo kani --tests
///
/// ## Unwind Bound Guidelines for SyncLayer Proofs
///
/// SyncLayer construction is more expensive than InputQueue because it creates:
/// - Multiple InputQueues (one per player), each with Vec of INPUT_QUEUE_LENGTH elements
/// - SavedStates with (max_prediction + 1) cells
///
/// Recommended unwind bounds for `SyncLayer::new(num_players, max_prediction)`:
/// - Base: 12-15 for construction with small num_players (1-2) and max_prediction (1-3)
/// - Add loop iterations for any additional loops in the proof
///
/// If proofs timeout:
/// 1. Use concrete values instead of symbolic (kani::any())
/// 2. Reduce loop iteration counts
/// 3. Avoid calling complex methods like `add_remote_input` which involve InputQueue operations
/// 4. Test one behavior at a time rather than multiple assertions in one proof
#[cfg(kani)]
mod kani_sync_layer_proofs {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::net::SocketAddr;

    #[repr(C)]
    #[derive(Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct TestInput {
        inp: u8,
    }

    struct TestConfig;

    impl Config for TestConfig {
        type Input = TestInput;
        type State = u8;
        type Address = SocketAddr;
    }

    /// Proof: New SyncLayer has valid initial state
    ///
    /// Verifies all invariants hold at initialization.
    /// Note: Bounds are reduced for Kani verification tractability.
    #[kani::proof]
    #[kani::unwind(12)]
    fn proof_new_sync_layer_valid() {
        let num_players: usize = kani::any();
        let max_prediction: usize = kani::any();

        kani::assume(num_players > 0 && num_players <= 2);
        kani::assume(max_prediction > 0 && max_prediction <= 3);

        let sync_layer = SyncLayer::<TestConfig>::new(num_players, max_prediction);

        // INV-1: current_frame starts at 0
        kani::assert(
            sync_layer.current_frame() == Frame::new(0),
            "New SyncLayer should start at frame 0",
        );

        // INV-7: last_confirmed_frame <= current_frame (NULL is treated as -1)
        kani::assert(
            sync_layer.last_confirmed_frame().is_null(),
            "New SyncLayer should have null last_confirmed_frame",
        );

        // INV-8: last_saved_frame <= current_frame
        kani::assert(
            sync_layer.last_saved_frame().is_null(),
            "New SyncLayer should have null last_saved_frame",
        );

        // Structural invariants
        kani::assert(
            sync_layer.num_players == num_players,
            "num_players should be set correctly",
        );
        kani::assert(
            sync_layer.max_prediction == max_prediction,
            "max_prediction should be set correctly",
        );
        kani::assert(
            sync_layer.input_queues.len() == num_players,
            "Should have one input queue per player",
        );
    }

    /// Proof: advance_frame maintains INV-1 (monotonicity)
    ///
    /// Verifies that advance_frame always increases current_frame.
    #[kani::proof]
    #[kani::unwind(12)]
    fn proof_advance_frame_monotonic() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);

        let initial_frame = sync_layer.current_frame();
        sync_layer.advance_frame();
        let new_frame = sync_layer.current_frame();

        kani::assert(
            new_frame > initial_frame,
            "advance_frame should increase current_frame",
        );
        kani::assert(
            new_frame == initial_frame + 1,
            "advance_frame should increment by exactly 1",
        );
    }

    /// Proof: Multiple advances maintain monotonicity
    ///
    /// Note: unwind(15) accounts for SyncLayer construction + loop iterations
    #[kani::proof]
    #[kani::unwind(15)]
    fn proof_multiple_advances_monotonic() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);
        // Use concrete count for tractability (symbolic count creates too many paths)
        let count: usize = 2;

        let mut prev_frame = sync_layer.current_frame();
        for _ in 0..count {
            sync_layer.advance_frame();
            let curr_frame = sync_layer.current_frame();

            kani::assert(
                curr_frame > prev_frame,
                "Each advance should increase frame",
            );
            prev_frame = curr_frame;
        }

        kani::assert(
            sync_layer.current_frame() == Frame::new(count as i32),
            "Final frame should equal advance count",
        );
    }

    /// Proof: save_current_state maintains INV-8
    ///
    /// Verifies that after saving, last_saved_frame == current_frame.
    ///
    /// Note: unwind(15) accounts for SyncLayer construction + loop iterations
    #[kani::proof]
    #[kani::unwind(15)]
    fn proof_save_maintains_inv8() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);

        // Advance a bit (concrete count for tractability)
        let advances: usize = 2;
        for _ in 0..advances {
            sync_layer.advance_frame();
        }

        let frame_before_save = sync_layer.current_frame();
        let _request = sync_layer.save_current_state();
        let saved_frame = sync_layer.last_saved_frame();

        kani::assert(
            saved_frame == frame_before_save,
            "last_saved_frame should equal current_frame after save",
        );
        kani::assert(
            saved_frame <= sync_layer.current_frame(),
            "INV-8: last_saved_frame <= current_frame",
        );
    }

    /// Proof: load_frame validates bounds correctly
    ///
    /// Verifies that load_frame rejects invalid frames.
    ///
    /// Note: unwind(20) accounts for SyncLayer construction + loop iterations (5)
    #[kani::proof]
    #[kani::unwind(20)]
    fn proof_load_frame_validates_bounds() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);

        // Advance to frame 5 and save each frame
        for i in 0..5i32 {
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
            sync_layer.advance_frame();
        }
        // Now at frame 5, max_prediction is 4

        // Load NULL_FRAME should fail
        let result_null = sync_layer.load_frame(Frame::NULL);
        kani::assert(result_null.is_err(), "Loading NULL_FRAME should fail");

        // Load current frame should fail (not in the past)
        let result_current = sync_layer.load_frame(Frame::new(5));
        kani::assert(result_current.is_err(), "Loading current frame should fail");

        // Load future frame should fail
        let result_future = sync_layer.load_frame(Frame::new(10));
        kani::assert(result_future.is_err(), "Loading future frame should fail");

        // Load frame outside prediction window should fail (frame 0 is > 4 frames back)
        let result_too_old = sync_layer.load_frame(Frame::new(0));
        kani::assert(
            result_too_old.is_err(),
            "Loading frame outside prediction window should fail",
        );
    }

    /// Proof: load_frame success maintains invariants
    ///
    /// Note: unwind(20) accounts for SyncLayer construction + loop iterations
    #[kani::proof]
    #[kani::unwind(20)]
    fn proof_load_frame_success_maintains_invariants() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);

        // Advance to frame 5 and save each frame
        for i in 0..5i32 {
            let request = sync_layer.save_current_state();
            if let FortressRequest::SaveGameState { cell, frame } = request {
                cell.save(frame, Some(i as u8), None);
            }
            sync_layer.advance_frame();
        }
        // Now at frame 5

        // Load frame 2 (valid: in past, within prediction window)
        let result = sync_layer.load_frame(Frame::new(2));
        kani::assert(result.is_ok(), "Loading valid frame should succeed");

        // After load, current_frame should be the loaded frame
        kani::assert(
            sync_layer.current_frame() == Frame::new(2),
            "current_frame should be set to loaded frame",
        );
    }

    /// Proof: set_frame_delay validates player handle
    ///
    /// Note: unwind(15) accounts for SyncLayer construction
    /// Tests that invalid handles are rejected
    #[kani::proof]
    #[kani::unwind(15)]
    fn proof_set_frame_delay_validates_handle() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);

        // Invalid handle (>= num_players) should fail
        let result_invalid = sync_layer.set_frame_delay(PlayerHandle::new(5), 2);
        kani::assert(result_invalid.is_err(), "Invalid handle should fail");
    }

    /// Proof: Saved states count is correct
    #[kani::proof]
    #[kani::unwind(12)]
    fn proof_saved_states_count() {
        let max_prediction: usize = kani::any();
        kani::assume(max_prediction > 0 && max_prediction <= 3);

        let sync_layer = SyncLayer::<TestConfig>::new(2, max_prediction);

        // Should have max_prediction + 1 state slots
        kani::assert(
            sync_layer.saved_states.states.len() == max_prediction + 1,
            "Should have max_prediction + 1 saved state slots",
        );
    }

    /// Proof: SavedStates get_cell validates frame
    #[kani::proof]
    #[kani::unwind(10)]
    fn proof_get_cell_validates_frame() {
        let saved_states: SavedStates<u8> = SavedStates::new(3);

        // Negative frame should fail
        let result_neg = saved_states.get_cell(Frame::new(-1));
        kani::assert(result_neg.is_err(), "Negative frame should fail");

        // Valid frame should succeed
        let valid_frame: i32 = kani::any();
        kani::assume(valid_frame >= 0 && valid_frame <= 1000);
        let result_valid = saved_states.get_cell(Frame::new(valid_frame));
        kani::assert(result_valid.is_ok(), "Valid frame should succeed");
    }

    /// Proof: SavedStates uses circular indexing correctly
    #[kani::proof]
    #[kani::unwind(10)]
    fn proof_saved_states_circular_index() {
        let max_prediction: usize = kani::any();
        kani::assume(max_prediction > 0 && max_prediction <= 3);

        // Create SavedStates to verify num_cells calculation matches
        let _saved_states: SavedStates<u8> = SavedStates::new(max_prediction);
        let num_cells = max_prediction + 1;

        let frame: i32 = kani::any();
        kani::assume(frame >= 0 && frame <= 10000);

        let expected_pos = frame as usize % num_cells;

        // The get_cell implementation should use this index
        kani::assert(
            expected_pos < num_cells,
            "Calculated position should be within bounds",
        );
    }

    /// Proof: reset_prediction doesn't affect frame state
    ///
    /// Note: unwind(15) accounts for SyncLayer construction + loop iterations
    #[kani::proof]
    #[kani::unwind(15)]
    fn proof_reset_prediction_preserves_frames() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);

        // Advance and save
        for _ in 0..3 {
            sync_layer.save_current_state();
            sync_layer.advance_frame();
        }

        let current_before = sync_layer.current_frame();
        let confirmed_before = sync_layer.last_confirmed_frame();
        let saved_before = sync_layer.last_saved_frame();

        sync_layer.reset_prediction();

        kani::assert(
            sync_layer.current_frame() == current_before,
            "reset_prediction should not change current_frame",
        );
        kani::assert(
            sync_layer.last_confirmed_frame() == confirmed_before,
            "reset_prediction should not change last_confirmed_frame",
        );
        kani::assert(
            sync_layer.last_saved_frame() == saved_before,
            "reset_prediction should not change last_saved_frame",
        );
    }

    /// Proof: INV-7 holds after set_last_confirmed_frame
    ///
    /// Note: unwind(15) accounts for SyncLayer construction
    /// Verifies that set_last_confirmed_frame maintains INV-7 invariant
    #[kani::proof]
    #[kani::unwind(15)]
    fn proof_confirmed_frame_bounded() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);

        // Advance a couple frames without adding inputs (simplified for tractability)
        sync_layer.advance_frame();
        sync_layer.advance_frame();
        // Now at frame 2

        // Set confirmed frame to a concrete value that should be clamped
        sync_layer.set_last_confirmed_frame(Frame::new(5), SaveMode::EveryFrame);

        // INV-7: last_confirmed_frame <= current_frame
        kani::assert(
            sync_layer.last_confirmed_frame() <= sync_layer.current_frame(),
            "INV-7: last_confirmed_frame should be <= current_frame",
        );
    }

    /// Proof: Sparse saving respects last_saved_frame
    ///
    /// Note: unwind(15) accounts for SyncLayer construction
    /// Verifies that sparse save mode clamps confirm frame to last_saved
    #[kani::proof]
    #[kani::unwind(15)]
    fn proof_sparse_saving_respects_saved_frame() {
        let mut sync_layer = SyncLayer::<TestConfig>::new(2, 3);

        // Save at frame 0
        sync_layer.save_current_state();

        // Advance to frame 2 (simplified - no add_remote_input for tractability)
        sync_layer.advance_frame();
        sync_layer.advance_frame();

        // With sparse saving enabled, confirm frame should not exceed last_saved (0)
        sync_layer.set_last_confirmed_frame(Frame::new(2), SaveMode::Sparse);

        kani::assert(
            sync_layer.last_confirmed_frame() <= sync_layer.last_saved_frame(),
            "With sparse saving, confirmed frame should not exceed last saved",
        );
    }
}
