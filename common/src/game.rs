//! Game engine: ball motion, scrolling lines, collision and score.
//!
//! The engine owns all round state and draws onto a [`DisplaySurface`] it is
//! handed on every call. It never flushes and never blocks; the orchestrator
//! decides when those happen.
//!
//! # Round State Machine
//!
//! ```text
//!            collision
//!  Running ------------> Ending
//!     ^                    |
//!     +---- reset() -------+
//! ```
//!
//! While `Ending`, every update is a no-op, so the frozen board and score
//! are exactly what the round ended with.
//!
//! # Fixed-Point Positions
//!
//! Ball coordinates are stored at [`POS_SCALE`] times their pixel value, so a
//! small tilt accumulates over several updates before the sprite moves.
//! The displayed pixel is `position / POS_SCALE`, truncating toward zero.

use crate::config::{
    BALL_COL_LIMIT, BALL_ROW_LIMIT, BALL_SIZE, BALL_START_COL, BALL_START_ROW, LINE_START_COL, LOWER_LINE_LENGTH,
    LOWER_LINE_START_ROW, MAX_ANGLE_DIVISOR, POS_SCALE, UPPER_LINE_LENGTH, UPPER_LINE_START_ROW,
};
use crate::sensor::Angles;
use crate::surface::{DisplayError, DisplaySurface};

// =============================================================================
// Ball
// =============================================================================

/// Fixed-point ball position (scale [`POS_SCALE`]).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    /// Where every round starts.
    pub const START: Self = Self {
        row: BALL_START_ROW,
        col: BALL_START_COL,
    };

    pub const fn new(
        row: i32,
        col: i32,
    ) -> Self {
        Self { row, col }
    }

    /// Check if the sprite at this position lies fully on the grid.
    #[inline]
    pub const fn in_bounds(self) -> bool {
        self.row >= 0 && self.row < BALL_ROW_LIMIT && self.col >= 0 && self.col < BALL_COL_LIMIT
    }

    /// Top-left pixel of the sprite. Only meaningful when [`in_bounds`](Self::in_bounds).
    #[inline]
    pub const fn pixel(self) -> (usize, usize) { ((self.row / POS_SCALE) as usize, (self.col / POS_SCALE) as usize) }

    /// Position after one update at `angles`, or `None` if it would leave the grid.
    pub fn step(
        self,
        angles: Angles,
    ) -> Option<Self> {
        let row = self.row as f32 + angles.theta_x / MAX_ANGLE_DIVISOR;
        let col = self.col as f32 + angles.theta_y / MAX_ANGLE_DIVISOR;
        if !row.is_finite() || !col.is_finite() {
            return None;
        }
        let next = Self::new(row as i32, col as i32);
        next.in_bounds().then_some(next)
    }
}

impl Default for Position {
    fn default() -> Self { Self::START }
}

// =============================================================================
// Obstacle Lines
// =============================================================================

/// Which of the two obstacle lines.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineId {
    /// Short line in the top half, moves faster.
    Upper,
    /// Line in the bottom half, moves slower.
    Lower,
}

/// A vertical segment scrolling right to left.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ObstacleLine {
    start_row: usize,
    length: usize,
    current_col: i16,
    drawn_col: Option<i16>,
}

impl ObstacleLine {
    pub const fn new(
        start_row: usize,
        length: usize,
    ) -> Self {
        Self {
            start_row,
            length,
            current_col: LINE_START_COL,
            drawn_col: None,
        }
    }

    /// Upper line at its start column.
    pub const fn upper() -> Self { Self::new(UPPER_LINE_START_ROW, UPPER_LINE_LENGTH) }

    /// Lower line at its start column.
    pub const fn lower() -> Self { Self::new(LOWER_LINE_START_ROW, LOWER_LINE_LENGTH) }

    /// Column the next update draws at.
    #[inline]
    pub const fn current_col(&self) -> i16 { self.current_col }

    /// Column the line is currently drawn at, if it has been drawn this round.
    #[inline]
    pub const fn drawn_col(&self) -> Option<i16> { self.drawn_col }

    #[inline]
    pub const fn start_row(&self) -> usize { self.start_row }

    #[inline]
    pub const fn length(&self) -> usize { self.length }

    /// Move the next draw to `col`. The segment already on screen is left alone.
    pub fn set_current_col(
        &mut self,
        col: i16,
    ) {
        self.current_col = col.clamp(0, LINE_START_COL);
    }

    /// Draw at the current column, erase the previous one, then step left.
    ///
    /// Returns `true` when the line went past column 0 and wrapped.
    pub fn advance(
        &mut self,
        surface: &mut DisplaySurface,
    ) -> Result<bool, DisplayError> {
        let col = self.current_col;
        surface.draw_vertical_line(self.start_row, col as usize, self.length, true)?;
        if let Some(previous) = self.drawn_col.filter(|&previous| previous != col) {
            surface.draw_vertical_line(self.start_row, previous as usize, self.length, false)?;
        }
        self.drawn_col = Some(col);

        self.current_col -= 1;
        if self.current_col < 0 {
            self.current_col = LINE_START_COL;
            return Ok(true);
        }
        Ok(false)
    }

    /// Check if the ball sprite at `ball` shares a cell with the drawn segment.
    pub fn overlaps(
        &self,
        ball: Position,
    ) -> bool {
        let Some(col) = self.drawn_col else {
            return false;
        };
        if !ball.in_bounds() {
            return false;
        }
        let (row, ball_col) = ball.pixel();
        let col = col as usize;
        let hits_col = col >= ball_col && col < ball_col + BALL_SIZE;
        let hits_rows = row < self.start_row + self.length && self.start_row < row + BALL_SIZE;
        hits_col && hits_rows
    }

    /// Draw the segment at the current column without moving or tracking it.
    pub fn draw_preview(
        &self,
        surface: &mut DisplaySurface,
    ) -> Result<(), DisplayError> {
        surface.draw_vertical_line(self.start_row, self.current_col as usize, self.length, true)
    }

    /// Back to the start column, forgetting the drawn segment.
    pub fn reset(&mut self) {
        self.current_col = LINE_START_COL;
        self.drawn_col = None;
    }
}

// =============================================================================
// Round State
// =============================================================================

/// Whether the round is being played.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RoundState {
    #[default]
    Running,
    /// Collision detected; waiting for the round-end handler.
    Ending,
}

/// All mutable game state.
#[derive(Clone, Debug)]
pub struct Game {
    ball: Position,
    upper: ObstacleLine,
    lower: ObstacleLine,
    score: u16,
    final_score: u16,
    tilt: Angles,
    state: RoundState,
}

impl Game {
    /// Fresh round: ball and lines at their start, score zero.
    pub const fn new() -> Self {
        Self {
            ball: Position::START,
            upper: ObstacleLine::upper(),
            lower: ObstacleLine::lower(),
            score: 0,
            final_score: 0,
            tilt: Angles::LEVEL,
            state: RoundState::Running,
        }
    }

    #[inline]
    pub const fn ball(&self) -> Position { self.ball }

    #[inline]
    pub const fn score(&self) -> u16 { self.score }

    /// Score captured at the collision that ended the round.
    #[inline]
    pub const fn final_score(&self) -> u16 { self.final_score }

    #[inline]
    pub const fn state(&self) -> RoundState { self.state }

    #[inline]
    pub const fn tilt(&self) -> Angles { self.tilt }

    pub const fn line(
        &self,
        id: LineId,
    ) -> &ObstacleLine {
        match id {
            LineId::Upper => &self.upper,
            LineId::Lower => &self.lower,
        }
    }

    pub fn line_mut(
        &mut self,
        id: LineId,
    ) -> &mut ObstacleLine {
        match id {
            LineId::Upper => &mut self.upper,
            LineId::Lower => &mut self.lower,
        }
    }

    /// Store the latest tilt. Both axes change together.
    pub fn set_tilt(
        &mut self,
        angles: Angles,
    ) {
        self.tilt = angles;
    }

    /// Place the ball without drawing. Out-of-bounds positions are refused.
    pub fn place_ball(
        &mut self,
        position: Position,
    ) -> bool {
        if !position.in_bounds() {
            return false;
        }
        self.ball = position;
        true
    }

    /// Draw the ball at its current position.
    pub fn draw_ball(
        &self,
        surface: &mut DisplaySurface,
    ) -> Result<(), DisplayError> {
        let (row, col) = self.ball.pixel();
        surface.set_ball_block(row, col, true)
    }

    /// Draw the ball and both lines where they currently stand.
    ///
    /// Lines drawn this way are not tracked; a cleared surface forgets them.
    pub fn draw_scene(
        &self,
        surface: &mut DisplaySurface,
    ) -> Result<(), DisplayError> {
        self.draw_ball(surface)?;
        self.upper.draw_preview(surface)?;
        self.lower.draw_preview(surface)
    }

    /// Move the ball by the stored tilt.
    ///
    /// A move that would leave the grid is dropped. Returns `true` when the
    /// new position was committed (and collision re-checked).
    pub fn update_ball(
        &mut self,
        surface: &mut DisplaySurface,
    ) -> Result<bool, DisplayError> {
        if self.state != RoundState::Running {
            return Ok(false);
        }
        let Some(next) = self.ball.step(self.tilt) else {
            return Ok(false);
        };

        let (old_row, old_col) = self.ball.pixel();
        let (new_row, new_col) = next.pixel();
        surface.set_ball_block(old_row, old_col, false)?;
        surface.set_ball_block(new_row, new_col, true)?;
        self.ball = next;

        self.check_collision();
        Ok(true)
    }

    /// Scroll one line by a column, scoring a point when it wraps.
    pub fn update_line(
        &mut self,
        id: LineId,
        surface: &mut DisplaySurface,
    ) -> Result<(), DisplayError> {
        if self.state != RoundState::Running {
            return Ok(());
        }
        if self.line_mut(id).advance(surface)? {
            self.score = self.score.saturating_add(1);
        }
        self.check_collision();
        Ok(())
    }

    /// End the round if the ball touches either drawn line.
    ///
    /// Returns `true` only on the transition into `Ending`.
    pub fn check_collision(&mut self) -> bool {
        if self.state != RoundState::Running {
            return false;
        }
        if self.upper.overlaps(self.ball) || self.lower.overlaps(self.ball) {
            self.state = RoundState::Ending;
            self.final_score = self.score;
            return true;
        }
        false
    }

    /// Back to a fresh `Running` round. The stored tilt is kept.
    pub fn reset(&mut self) {
        self.ball = Position::START;
        self.upper.reset();
        self.lower.reset();
        self.score = 0;
        self.final_score = 0;
        self.state = RoundState::Running;
    }
}

impl Default for Game {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::COLS;

    #[test]
    fn test_level_tilt_does_not_move() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        assert_eq!(game.update_ball(&mut surface), Ok(true));
        assert_eq!(game.ball(), Position::START);
    }

    #[test]
    fn test_full_tilt_moves_one_pixel() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.set_tilt(Angles::new(900.0, 0.0));
        game.update_ball(&mut surface).unwrap();
        assert_eq!(game.ball(), Position::new(BALL_START_ROW + 10, BALL_START_COL));
        game.update_ball(&mut surface).unwrap();
        assert_eq!(game.ball().row, BALL_START_ROW + 20);
    }

    #[test]
    fn test_ball_redrawn_at_new_pixel() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.draw_ball(&mut surface).unwrap();
        assert!(surface.is_set(5, 5));

        game.set_tilt(Angles::new(0.0, 900.0));
        game.update_ball(&mut surface).unwrap();
        assert!(!surface.is_set(5, 5));
        assert!(surface.is_set(5, 6));
        assert!(surface.is_set(6, 7));
    }

    #[test]
    fn test_small_tilt_accumulates() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.set_tilt(Angles::new(0.0, 270.0));
        for _ in 0..4 {
            game.update_ball(&mut surface).unwrap();
        }
        assert_eq!(game.ball().col, BALL_START_COL + 12);
        assert_eq!(game.ball().pixel(), (5, 6));
    }

    #[test]
    fn test_ball_never_leaves_grid() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        for tilt in [
            Angles::new(900.0, 900.0),
            Angles::new(-900.0, -900.0),
            Angles::new(900.0, -900.0),
        ] {
            game.set_tilt(tilt);
            for _ in 0..2000 {
                let before = game.ball();
                game.update_ball(&mut surface).unwrap();
                assert!(game.ball().in_bounds() || game.ball() == before);
            }
        }
    }

    #[test]
    fn test_ball_stops_at_edge() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        assert!(game.place_ball(Position::new(625, 1265)));
        game.set_tilt(Angles::new(900.0, 900.0));
        assert_eq!(game.update_ball(&mut surface), Ok(false));
        assert_eq!(game.ball(), Position::new(625, 1265));
    }

    #[test]
    fn test_nan_tilt_is_dropped() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.set_tilt(Angles::new(f32::NAN, 0.0));
        assert_eq!(game.update_ball(&mut surface), Ok(false));
        assert_eq!(game.ball(), Position::START);
    }

    #[test]
    fn test_line_wraps_and_scores() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.line_mut(LineId::Upper).set_current_col(0);

        game.update_line(LineId::Upper, &mut surface).unwrap();
        assert_eq!(game.line(LineId::Upper).current_col(), 127);
        assert_eq!(game.score(), 1);

        game.update_line(LineId::Upper, &mut surface).unwrap();
        assert_eq!(game.line(LineId::Upper).current_col(), 126);
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn test_line_scroll_erases_previous_column() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.update_line(LineId::Lower, &mut surface).unwrap();
        assert!(surface.is_set(LOWER_LINE_START_ROW, 127));

        game.update_line(LineId::Lower, &mut surface).unwrap();
        assert!(!surface.is_set(LOWER_LINE_START_ROW, 127));
        assert!(surface.is_set(LOWER_LINE_START_ROW, 126));
        assert!(surface.is_set(LOWER_LINE_START_ROW + LOWER_LINE_LENGTH - 1, 126));
        assert!(!surface.is_set(LOWER_LINE_START_ROW - 1, 126));
    }

    #[test]
    fn test_full_sweep_scores_once() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.place_ball(Position::new(620, 0));
        for _ in 0..COLS {
            game.update_line(LineId::Upper, &mut surface).unwrap();
        }
        assert_eq!(game.score(), 1);
        assert_eq!(game.state(), RoundState::Running);
    }

    #[test]
    fn test_collision_ends_round() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        // Ball pixel (40, 100) sits inside the lower line's rows.
        game.place_ball(Position::new(400, 1000));
        game.line_mut(LineId::Lower).set_current_col(101);
        game.update_line(LineId::Lower, &mut surface).unwrap();
        assert_eq!(game.state(), RoundState::Ending);
        assert_eq!(game.final_score(), 0);

        // Frozen until reset.
        let lower = *game.line(LineId::Lower);
        game.update_line(LineId::Lower, &mut surface).unwrap();
        game.set_tilt(Angles::new(900.0, 0.0));
        game.update_ball(&mut surface).unwrap();
        assert_eq!(*game.line(LineId::Lower), lower);
        assert_eq!(game.ball(), Position::new(400, 1000));
        assert!(!game.check_collision());
        assert_eq!(game.state(), RoundState::Ending);
    }

    #[test]
    fn test_line_beside_ball_is_no_collision() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.place_ball(Position::new(400, 1000));
        game.line_mut(LineId::Lower).set_current_col(102);
        game.update_line(LineId::Lower, &mut surface).unwrap();
        // Upper line rows end at 30, ball is at 40.
        game.line_mut(LineId::Upper).set_current_col(100);
        game.update_line(LineId::Upper, &mut surface).unwrap();
        assert_eq!(game.state(), RoundState::Running);
    }

    #[test]
    fn test_ball_moving_onto_line_collides() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.line_mut(LineId::Upper).set_current_col(7);
        game.update_line(LineId::Upper, &mut surface).unwrap();
        assert_eq!(game.state(), RoundState::Running);

        game.set_tilt(Angles::new(0.0, 900.0));
        game.update_ball(&mut surface).unwrap();
        assert_eq!(game.state(), RoundState::Ending);
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let mut game = Game::new();
        let mut surface = DisplaySurface::new();
        game.set_tilt(Angles::new(-450.0, 300.0));
        for _ in 0..300 {
            game.update_ball(&mut surface).unwrap();
            game.update_line(LineId::Upper, &mut surface).unwrap();
        }
        game.reset();
        assert_eq!(game.ball(), Position::START);
        assert_eq!(game.score(), 0);
        assert_eq!(game.state(), RoundState::Running);
        assert_eq!(*game.line(LineId::Upper), ObstacleLine::upper());
        assert_eq!(*game.line(LineId::Lower), ObstacleLine::lower());
        assert_eq!(game.tilt(), Angles::new(-450.0, 300.0));
    }

    #[test]
    fn test_draw_scene_at_start_positions() {
        let game = Game::new();
        let mut surface = DisplaySurface::new();
        game.draw_scene(&mut surface).unwrap();
        assert!(surface.is_set(5, 5));
        assert!((0..30).all(|r| surface.is_set(r, 127)));
        assert!((30..63).all(|r| surface.is_set(r, 127)));
        assert!(!surface.is_set(63, 127));
        // Preview draws do not count for collisions.
        assert_eq!(game.line(LineId::Upper).drawn_col(), None);
    }

    #[test]
    fn test_place_ball_rejects_out_of_bounds() {
        let mut game = Game::new();
        assert!(!game.place_ball(Position::new(630, 0)));
        assert!(!game.place_ball(Position::new(0, -1)));
        assert_eq!(game.ball(), Position::START);
    }
}
