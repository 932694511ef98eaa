pub mod game_trait;
pub mod pet;
pub mod powerup;
pub mod storage;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::game_trait::{FrameGame, GameEvent};

    /// One 60 Hz frame.
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Run N frames, returning all accumulated events.
    pub fn run_frames(game: &mut dyn FrameGame, n: usize, dt: f32) -> Vec<GameEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(game.update(dt));
        }
        all_events
    }

    /// Assert that the game's serialized state differs from `before`.
    pub fn assert_game_state_changed(game: &dyn FrameGame, before: &[u8]) {
        let after = game.serialize_state();
        assert_ne!(
            before,
            &after[..],
            "Game state should have changed after operation"
        );
    }

    // ================================================================
    // Game Trait Contract Tests
    // ================================================================
    // Generic checks every FrameGame implementation must pass. Game crates
    // call them from their own #[cfg(test)] modules.

    /// serialize_state() must return non-empty bytes for a fresh game.
    pub fn contract_fresh_game_has_state(game: &dyn FrameGame) {
        let state = game.serialize_state();
        assert!(
            !state.is_empty(),
            "serialize_state() must return non-empty bytes for a fresh game"
        );
    }

    /// apply_input() with valid data followed by update() must change state.
    pub fn contract_apply_input_changes_state(game: &mut dyn FrameGame, valid_input: &[u8]) {
        let before = game.serialize_state();
        game.apply_input(valid_input);
        game.update(0.1);
        let after = game.serialize_state();
        assert_ne!(
            before, after,
            "State must change after apply_input + update"
        );
    }

    /// update() with dt>0 must advance the simulation.
    pub fn contract_update_advances_time(game: &mut dyn FrameGame) {
        let before = game.serialize_state();
        game.update(0.25);
        let after = game.serialize_state();
        assert_ne!(before, after, "update(dt>0) must advance game state");
    }

    /// serialize_state → apply_state must be stable after one roundtrip.
    pub fn contract_state_roundtrip_preserves(game: &mut dyn FrameGame) {
        let state_a = game.serialize_state();
        game.apply_state(&state_a);
        let state_b = game.serialize_state();
        game.apply_state(&state_b);
        let state_c = game.serialize_state();
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// pause() must freeze the simulation, resume() must unfreeze it.
    pub fn contract_pause_stops_updates(game: &mut dyn FrameGame) {
        game.pause();
        assert!(game.is_paused());
        let before = game.serialize_state();
        game.update(0.25);
        let during_pause = game.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        game.resume();
        game.update(0.25);
        let after_resume = game.serialize_state();
        assert_ne!(during_pause, after_resume, "State must change after resume");
    }

    /// A hidden game must not advance; becoming visible again resumes it.
    pub fn contract_hidden_stops_updates(game: &mut dyn FrameGame) {
        game.set_visible(false);
        let before = game.serialize_state();
        game.update(0.25);
        assert_eq!(
            before,
            game.serialize_state(),
            "State must not change while hidden"
        );

        game.set_visible(true);
        game.update(0.25);
        assert_ne!(
            before,
            game.serialize_state(),
            "State must change once visible again"
        );
    }

    /// Garbage input bytes must be ignored without panicking.
    pub fn contract_garbage_input_ignored(game: &mut dyn FrameGame) {
        game.apply_input(&[0xFF, 0xFE, 0x00, 0x01, 0xAB, 0xCD]);
        game.update(FRAME_DT);
    }

    /// Truncated state bytes must be ignored and leave the game usable.
    pub fn contract_truncated_state_ignored(game: &mut dyn FrameGame) {
        let state = game.serialize_state();
        let truncated = &state[..state.len() / 2];
        game.apply_state(truncated);
        assert_eq!(
            state,
            game.serialize_state(),
            "Truncated state must not replace the current state"
        );
    }
}
