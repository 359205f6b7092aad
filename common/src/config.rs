//! Centralized game configuration.
//!
//! All tuning values are compile-time constants. Derived values (bounds,
//! page counts) are computed in `const` context and checked with `const`
//! assertions, so an inconsistent edit fails the build instead of corrupting
//! sprites at runtime.
//!
//! # Units
//!
//! - Periods are in scheduler ticks (one tick = `1 / TICK_RATE_HZ` seconds).
//! - Ball positions are fixed-point with scale [`POS_SCALE`].
//! - Tilt angles are deci-degrees (`900` = 90 degrees).

use crate::scheduler::SchedulerError;

// =============================================================================
// Tick Source
// =============================================================================

/// Rate at which the hardware tick source calls `Scheduler::advance`.
pub const TICK_RATE_HZ: u32 = 1000;

/// Maximum number of periodic tasks the scheduler can hold.
pub const MAX_TASKS: usize = 8;

// =============================================================================
// Display Geometry (DEM 128064B, two KS0108 controllers)
// =============================================================================

/// Display height in pixels.
pub const ROWS: usize = 64;

/// Display width in pixels.
pub const COLS: usize = 128;

/// Rows packed into one display page byte.
pub const PAGE_HEIGHT: usize = 8;

/// Number of pages (byte rows) on the display.
pub const PAGES: usize = ROWS / PAGE_HEIGHT;

/// Columns driven by each of the two controllers.
pub const CONTROLLER_COLS: usize = COLS / 2;

const _: () = assert!(ROWS % PAGE_HEIGHT == 0);
const _: () = assert!(COLS % 2 == 0);

// =============================================================================
// Ball
// =============================================================================

/// Fixed-point scale of ball positions (stored position = pixel * 10).
pub const POS_SCALE: i32 = 10;

/// Edge length of the square ball sprite, in pixels.
pub const BALL_SIZE: usize = 2;

/// Ball start row (fixed-point).
pub const BALL_START_ROW: i32 = 50;

/// Ball start column (fixed-point).
pub const BALL_START_COL: i32 = 50;

/// Tilt divisor applied per ball update: `delta = angle / MAX_ANGLE_DIVISOR`.
///
/// A full 90 degree tilt (900 deci-degrees) moves the ball one pixel per update.
pub const MAX_ANGLE_DIVISOR: f32 = 90.0;

/// Exclusive upper bound of the fixed-point ball row (sprite stays on screen).
pub const BALL_ROW_LIMIT: i32 = (ROWS - BALL_SIZE + 1) as i32 * POS_SCALE;

/// Exclusive upper bound of the fixed-point ball column.
pub const BALL_COL_LIMIT: i32 = (COLS - BALL_SIZE + 1) as i32 * POS_SCALE;

const _: () = assert!(BALL_START_ROW >= 0 && BALL_START_ROW < BALL_ROW_LIMIT);
const _: () = assert!(BALL_START_COL >= 0 && BALL_START_COL < BALL_COL_LIMIT);

// =============================================================================
// Obstacle Lines
// =============================================================================

/// Column every line starts from and wraps back to.
pub const LINE_START_COL: i16 = (COLS - 1) as i16;

/// First row of the fast (upper) line.
pub const UPPER_LINE_START_ROW: usize = 0;

/// Length of the fast (upper) line in pixels.
pub const UPPER_LINE_LENGTH: usize = 30;

/// First row of the slow (lower) line.
pub const LOWER_LINE_START_ROW: usize = 30;

/// Length of the slow (lower) line in pixels.
pub const LOWER_LINE_LENGTH: usize = 33;

const _: () = assert!(UPPER_LINE_START_ROW + UPPER_LINE_LENGTH <= ROWS);
const _: () = assert!(LOWER_LINE_START_ROW + LOWER_LINE_LENGTH <= ROWS);

// =============================================================================
// Score
// =============================================================================

/// Scores at or above this value are counted but not rendered.
pub const MAX_SCORE: u16 = 100;

/// Left column of the tens digit on the game over screen.
pub const TENS_DIGIT_COL: usize = 30;

/// Left column of the units digit on the game over screen.
pub const UNITS_DIGIT_COL: usize = 60;

/// Top row of the score digits on the game over screen.
pub const SCORE_ROW: usize = 26;

/// Top row of the banner text.
pub const BANNER_ROW: usize = 2;

// =============================================================================
// Delays
// =============================================================================

/// How long the welcome banner stays up before the first round.
pub const WELCOME_DELAY_MS: u32 = 2000;

/// How long the game over banner and score stay up.
pub const GAME_OVER_DELAY_MS: u32 = 2000;

/// Settle time between clearing the welcome banner and the first refresh.
pub const SETTLE_DELAY_MS: u32 = 100;

// =============================================================================
// Accelerometer
// =============================================================================

/// Raw counts per milli-g at the +-2 g range.
pub const ACCEL_COUNTS_PER_MG: f32 = 16.384;

/// Symmetric clamp applied to each axis before `asin`, in milli-g.
pub const ACCEL_CLAMP_MG: f32 = 1000.0;

// =============================================================================
// Task Periods
// =============================================================================

/// Scheduler divisors for every periodic task the game registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TaskPeriods {
    /// Accelerometer refresh.
    pub sensor: u16,
    /// Ball movement.
    pub ball: u16,
    /// Panel refresh (flush).
    pub refresh: u16,
    /// Fast (upper) line movement.
    pub upper_line: u16,
    /// Slow (lower) line movement.
    pub lower_line: u16,
}

impl TaskPeriods {
    /// Periods tuned for a 1 kHz tick.
    pub const DEFAULT: Self = Self {
        sensor: 50,
        ball: 20,
        refresh: 50,
        upper_line: 30,
        lower_line: 40,
    };

    /// Reject any zero divisor before a single task is registered.
    pub const fn validate(&self) -> Result<(), SchedulerError> {
        if self.sensor == 0 || self.ball == 0 || self.refresh == 0 || self.upper_line == 0 || self.lower_line == 0 {
            return Err(SchedulerError::InvalidDivisor);
        }
        Ok(())
    }

    /// Convert a period to its firing frequency in millihertz.
    pub const fn frequency_mhz(divisor: u16) -> u32 {
        if divisor == 0 {
            return 0;
        }
        TICK_RATE_HZ * 1000 / divisor as u32
    }
}

impl Default for TaskPeriods {
    fn default() -> Self { Self::DEFAULT }
}

// =============================================================================
// Unit Tests
// =============================================================================
