//! Orchestrator: wires the scheduler, surface, sensor and game together.
//!
//! [`App`] owns everything. The platform layer only has to:
//!
//! 1. build a [`Panel`], a [`TiltSensor`] and a [`DiagnosticSink`],
//! 2. call [`App::start`] once,
//! 3. call [`App::tick`] at `TICK_RATE_HZ` and [`App::poll_round_end`] from
//!    its outer loop.
//!
//! # Tasks
//!
//! | Task            | Default period | Work                                   |
//! |-----------------|----------------|----------------------------------------|
//! | `SensorRefresh` | 50 ticks       | read tilt, keep last angles on failure |
//! | `BallMove`      | 20 ticks       | move ball, check collision             |
//! | `Refresh`       | 50 ticks       | flush dirty pages to the panel         |
//! | `UpperLine`     | 30 ticks       | scroll upper line, check collision     |
//! | `LowerLine`     | 40 ticks       | scroll lower line, check collision     |
//!
//! Tasks are registered in that order, which is also their dispatch order
//! when periods coincide.

use core::fmt;

use embedded_hal::delay::DelayNs;

use crate::config::{
    GAME_OVER_DELAY_MS, MAX_SCORE, SCORE_ROW, SETTLE_DELAY_MS, TENS_DIGIT_COL, TaskPeriods, UNITS_DIGIT_COL,
    WELCOME_DELAY_MS,
};
use crate::diagnostics::{DiagnosticSink, Level, emit_fmt};
use crate::game::{Game, LineId, RoundState};
use crate::panel::Panel;
use crate::scheduler::{Scheduler, SchedulerError, Task, TaskHandle};
use crate::sensor::{Presence, TiltSensor};
use crate::surface::{Banner, DisplayError, DisplaySurface};

// =============================================================================
// Errors
// =============================================================================

/// The game refuses to run with a task missing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StartupError {
    Scheduler(SchedulerError),
}

impl From<SchedulerError> for StartupError {
    fn from(err: SchedulerError) -> Self { Self::Scheduler(err) }
}

impl fmt::Display for StartupError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Scheduler(err) => write!(f, "task registration failed: {err}"),
        }
    }
}

// =============================================================================
// Tasks
// =============================================================================

/// Periodic work items of the game.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameTask {
    SensorRefresh,
    BallMove,
    Refresh,
    UpperLine,
    LowerLine,
}

impl GameTask {
    /// Every task, in registration order.
    pub const ALL: [Self; 5] = [
        Self::SensorRefresh,
        Self::BallMove,
        Self::Refresh,
        Self::UpperLine,
        Self::LowerLine,
    ];

    /// Scheduler divisor for this task.
    pub const fn period(
        self,
        periods: &TaskPeriods,
    ) -> u16 {
        match self {
            Self::SensorRefresh => periods.sensor,
            Self::BallMove => periods.ball,
            Self::Refresh => periods.refresh,
            Self::UpperLine => periods.upper_line,
            Self::LowerLine => periods.lower_line,
        }
    }
}

/// Everything the tasks operate on.
pub struct Machine<P, S, D> {
    pub game: Game,
    pub surface: DisplaySurface,
    pub panel: P,
    pub sensor: S,
    pub diag: D,
}

impl<P: Panel, S: TiltSensor, D: DiagnosticSink> Machine<P, S, D> {
    /// Read the sensor. On failure the previous angles stay in effect.
    pub fn refresh_sensor(&mut self) {
        match self.sensor.read_tilt_angles() {
            Ok(angles) => {
                self.game.set_tilt(angles);
                match self.sensor.acceleration_mg() {
                    Some([ax, ay, az]) => emit_fmt(
                        &mut self.diag,
                        Level::Trace,
                        format_args!(
                            "AX:{ax:.2} AY:{ay:.2} AZ:{az:.2} TX:{:.2} TY:{:.2}",
                            angles.theta_x, angles.theta_y
                        ),
                    ),
                    None => emit_fmt(
                        &mut self.diag,
                        Level::Trace,
                        format_args!("TX:{:.2} TY:{:.2}", angles.theta_x, angles.theta_y),
                    ),
                }
            }
            Err(err) => emit_fmt(&mut self.diag, Level::Warn, format_args!("Reading error: {err}")),
        }
    }

    pub fn move_ball(&mut self) {
        let was_running = self.game.state() == RoundState::Running;
        let result = self.game.update_ball(&mut self.surface);
        self.after_update(was_running, result.map(|_| ()));
    }

    pub fn move_line(
        &mut self,
        id: LineId,
    ) {
        let was_running = self.game.state() == RoundState::Running;
        let result = self.game.update_line(id, &mut self.surface);
        self.after_update(was_running, result);
    }

    /// Push dirty pages to the panel. Failed pages are retried on the next call.
    pub fn refresh(&mut self) {
        if self.surface.flush(&mut self.panel).is_err() {
            self.diag.emit(Level::Warn, "Display write failed");
        }
    }

    fn after_update(
        &mut self,
        was_running: bool,
        result: Result<(), DisplayError>,
    ) {
        self.report_draw(result);
        if was_running && self.game.state() == RoundState::Ending {
            self.diag.emit(Level::Info, "Ball is on line");
        }
    }
}

impl<P, S, D: DiagnosticSink> Machine<P, S, D> {
    fn report_draw(
        &mut self,
        result: Result<(), DisplayError>,
    ) {
        if let Err(err) = result {
            emit_fmt(&mut self.diag, Level::Error, format_args!("Draw failed: {err}"));
        }
    }
}

impl<P: Panel, S: TiltSensor, D: DiagnosticSink> Task<Machine<P, S, D>> for GameTask {
    fn run(
        &mut self,
        machine: &mut Machine<P, S, D>,
    ) {
        match self {
            Self::SensorRefresh => machine.refresh_sensor(),
            Self::BallMove => machine.move_ball(),
            Self::Refresh => machine.refresh(),
            Self::UpperLine => machine.move_line(LineId::Upper),
            Self::LowerLine => machine.move_line(LineId::Lower),
        }
    }
}

/// Report the outcome of the sensor presence check.
pub fn report_presence<D: DiagnosticSink + ?Sized>(
    diag: &mut D,
    presence: Presence,
) {
    match presence {
        Presence::Ready => diag.emit(Level::Info, "Sensor ready"),
        Presence::InitFailed => diag.emit(Level::Warn, "Init fails"),
        Presence::NotResponding => diag.emit(Level::Warn, "Not working"),
    }
}

/// Compose the game over screen: the board at its start positions, the banner and `score`.
pub fn render_game_over(
    surface: &mut DisplaySurface,
    game: &Game,
    score: u16,
) -> Result<(), DisplayError> {
    game.draw_scene(surface)?;
    surface.draw_banner(Banner::GameOver)?;
    render_score(surface, score)
}

/// Draw the two score digits. Scores of [`MAX_SCORE`] and above are not drawn.
pub fn render_score(
    surface: &mut DisplaySurface,
    score: u16,
) -> Result<(), DisplayError> {
    if score >= MAX_SCORE {
        return Ok(());
    }
    surface.draw_digit((score / 10 % 10) as u8, SCORE_ROW, TENS_DIGIT_COL)?;
    surface.draw_digit((score % 10) as u8, SCORE_ROW, UNITS_DIGIT_COL)
}

// =============================================================================
// App
// =============================================================================

/// The whole game: task table plus the state the tasks run on.
pub struct App<P, S, D> {
    scheduler: Scheduler<GameTask>,
    handles: [Option<TaskHandle>; GameTask::ALL.len()],
    machine: Machine<P, S, D>,
    periods: TaskPeriods,
    rounds: u32,
}

impl<P: Panel, S: TiltSensor, D: DiagnosticSink> App<P, S, D> {
    pub fn new(
        panel: P,
        sensor: S,
        diag: D,
        periods: TaskPeriods,
    ) -> Self {
        Self {
            scheduler: Scheduler::new(),
            handles: [None; GameTask::ALL.len()],
            machine: Machine {
                game: Game::new(),
                surface: DisplaySurface::new(),
                panel,
                sensor,
                diag,
            },
            periods,
            rounds: 0,
        }
    }

    /// Show the welcome banner, then register every task.
    ///
    /// Blocks for the welcome and settle delays. Fails without registering
    /// anything if a period is zero.
    pub fn start<DL: DelayNs>(
        &mut self,
        delay: &mut DL,
    ) -> Result<(), StartupError> {
        self.periods.validate()?;

        let m = &mut self.machine;
        m.surface.clear();
        let result = m.surface.draw_banner(Banner::Welcome);
        m.report_draw(result);
        m.refresh();
        delay.delay_ms(WELCOME_DELAY_MS);
        m.surface.clear();
        delay.delay_ms(SETTLE_DELAY_MS);
        m.refresh();

        for (slot, task) in self.handles.iter_mut().zip(GameTask::ALL) {
            *slot = Some(self.scheduler.register(task, task.period(&self.periods))?);
        }

        let m = &mut self.machine;
        let result = m.game.draw_ball(&mut m.surface);
        m.report_draw(result);
        m.diag.emit(Level::Info, "Game started");
        Ok(())
    }

    /// Advance the scheduler by one tick, running every due task.
    #[inline]
    pub fn tick(&mut self) { self.scheduler.advance(&mut self.machine); }

    /// Run the round-end sequence if a collision ended the round.
    ///
    /// Resets the board, shows it with the game over banner and score for
    /// `GAME_OVER_DELAY_MS`, then starts the fresh round on a clean screen.
    /// Returns `true` if a round was ended.
    pub fn poll_round_end<DL: DelayNs>(
        &mut self,
        delay: &mut DL,
    ) -> bool {
        if self.machine.game.state() != RoundState::Ending {
            return false;
        }
        let m = &mut self.machine;
        let score = m.game.final_score();

        m.surface.clear();
        m.game.reset();
        let result = render_game_over(&mut m.surface, &m.game, score);
        m.report_draw(result);
        m.refresh();
        emit_fmt(&mut m.diag, Level::Info, format_args!("Game over, score {score}"));
        delay.delay_ms(GAME_OVER_DELAY_MS);

        m.surface.clear();
        let result = m.game.draw_ball(&mut m.surface);
        m.report_draw(result);
        m.refresh();
        self.rounds = self.rounds.wrapping_add(1);
        true
    }

    #[inline]
    pub fn game(&self) -> &Game { &self.machine.game }

    #[inline]
    pub fn surface(&self) -> &DisplaySurface { &self.machine.surface }

    #[inline]
    pub fn panel(&self) -> &P { &self.machine.panel }

    #[inline]
    pub fn sensor_mut(&mut self) -> &mut S { &mut self.machine.sensor }

    #[inline]
    pub fn diag(&self) -> &D { &self.machine.diag }

    /// Shared state, for tests and tools that set up a scene directly.
    #[inline]
    pub fn machine_mut(&mut self) -> &mut Machine<P, S, D> { &mut self.machine }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler<GameTask> { &self.scheduler }

    /// How often `task` has fired, or `None` before [`start`](Self::start).
    pub fn task_runs(
        &self,
        task: GameTask,
    ) -> Option<u32> {
        let handle = self.handles[task as usize]?;
        self.scheduler.runs(handle)
    }

    /// Rounds completed since power-up.
    #[inline]
    pub const fn rounds(&self) -> u32 { self.rounds }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONTROLLER_COLS, PAGES};
    use crate::diagnostics::DiagnosticLog;
    use crate::panel::Controller;
    use crate::sensor::{Angles, SensorError};

    #[derive(Default)]
    struct CountingPanel {
        writes: usize,
    }

    impl Panel for CountingPanel {
        type Error = core::convert::Infallible;

        fn write_page(
            &mut self,
            _controller: Controller,
            _page: u8,
            _data: &[u8; CONTROLLER_COLS],
        ) -> Result<(), Self::Error> {
            self.writes += 1;
            Ok(())
        }
    }

    struct FixedSensor(Result<Angles, SensorError>);

    impl TiltSensor for FixedSensor {
        fn read_tilt_angles(&mut self) -> Result<Angles, SensorError> { self.0 }
    }

    /// Records requested delays instead of sleeping.
    #[derive(Default)]
    struct RecordingDelay {
        total_ms: u64,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(
            &mut self,
            ns: u32,
        ) {
            self.total_ms += u64::from(ns) / 1_000_000;
        }

        fn delay_ms(
            &mut self,
            ms: u32,
        ) {
            self.total_ms += u64::from(ms);
        }
    }

    type TestApp = App<CountingPanel, FixedSensor, DiagnosticLog<16>>;

    fn app(sensor: Result<Angles, SensorError>) -> TestApp {
        App::new(
            CountingPanel::default(),
            FixedSensor(sensor),
            DiagnosticLog::new(Level::Debug),
            TaskPeriods::DEFAULT,
        )
    }

    #[test]
    fn test_start_registers_all_tasks() {
        let mut app = app(Ok(Angles::LEVEL));
        let mut delay = RecordingDelay::default();
        app.start(&mut delay).unwrap();
        assert_eq!(app.scheduler().len(), GameTask::ALL.len());
        assert_eq!(delay.total_ms, u64::from(WELCOME_DELAY_MS + SETTLE_DELAY_MS));
        assert!(app.surface().is_set(5, 5));
        assert!(app.panel().writes >= PAGES * 2);
    }

    #[test]
    fn test_start_rejects_zero_period() {
        let mut app = App::new(
            CountingPanel::default(),
            FixedSensor(Ok(Angles::LEVEL)),
            DiagnosticLog::<16>::new(Level::Debug),
            TaskPeriods {
                ball: 0,
                ..TaskPeriods::DEFAULT
            },
        );
        let result = app.start(&mut RecordingDelay::default());
        assert_eq!(result, Err(StartupError::Scheduler(SchedulerError::InvalidDivisor)));
        assert!(app.scheduler().is_empty());
    }

    #[test]
    fn test_sensor_failure_keeps_last_angles() {
        let mut app = app(Ok(Angles::new(450.0, 0.0)));
        app.start(&mut RecordingDelay::default()).unwrap();
        for _ in 0..50 {
            app.tick();
        }
        assert_eq!(app.game().tilt(), Angles::new(450.0, 0.0));

        app.sensor_mut().0 = Err(SensorError::AcquisitionError);
        for _ in 0..50 {
            app.tick();
        }
        assert_eq!(app.game().tilt(), Angles::new(450.0, 0.0));
        assert!(app.diag().contains("Reading error: bus transfer failed"));
    }

    #[test]
    fn test_collision_reported_once() {
        let mut app = app(Ok(Angles::LEVEL));
        app.start(&mut RecordingDelay::default()).unwrap();
        app.machine_mut().game.line_mut(LineId::Upper).set_current_col(5);
        for _ in 0..60 {
            app.tick();
        }
        assert_eq!(app.game().state(), RoundState::Ending);
        let reports = app.diag().iter().filter(|(_, line)| *line == "Ball is on line").count();
        assert_eq!(reports, 1);
    }

    #[test]
    fn test_round_end_resets_and_holds() {
        let mut app = app(Ok(Angles::LEVEL));
        app.start(&mut RecordingDelay::default()).unwrap();
        let mut delay = RecordingDelay::default();
        assert!(!app.poll_round_end(&mut delay));
        assert_eq!(delay.total_ms, 0);

        app.machine_mut().game.line_mut(LineId::Upper).set_current_col(5);
        for _ in 0..30 {
            app.tick();
        }
        assert!(app.poll_round_end(&mut delay));
        assert_eq!(delay.total_ms, u64::from(GAME_OVER_DELAY_MS));
        assert_eq!(app.game().state(), RoundState::Running);
        assert_eq!(app.game().score(), 0);
        assert_eq!(app.rounds(), 1);
        assert!(app.surface().is_set(5, 5));
        assert!(app.diag().contains("Game over, score 0"));
    }

    #[test]
    fn test_missing_sensor_reported_as_reading_error() {
        let mut app = app(Err(SensorError::NotPresent));
        app.start(&mut RecordingDelay::default()).unwrap();
        for _ in 0..50 {
            app.tick();
        }
        assert_eq!(app.diag().last(), Some((Level::Warn, "Reading error: sensor not present")));
        assert_eq!(app.game().tilt(), Angles::LEVEL);
    }

    #[test]
    fn test_draw_failures_are_reported() {
        let mut app = app(Ok(Angles::LEVEL));
        app.machine_mut().report_draw(Ok(()));
        assert!(app.diag().is_empty());

        let result = app.machine_mut().surface.draw_text("GAME OVER", 0, 100);
        app.machine_mut().report_draw(result);
        assert_eq!(app.diag().last(), Some((Level::Error, "Draw failed: drawing outside the display")));
    }

    #[test]
    fn test_game_over_screen_shows_board_at_start() {
        let mut game = Game::new();
        game.line_mut(LineId::Upper).set_current_col(40);
        game.reset();
        let mut surface = DisplaySurface::new();
        render_game_over(&mut surface, &game, 7).unwrap();
        assert!(surface.is_set(5, 5));
        assert!(surface.is_set(0, 127));
        assert!(surface.is_set(62, 127));
        assert!(!surface.is_set(0, 40));
        // Banner and digits.
        assert!((2..22).any(|r| (19..109).any(|c| surface.is_set(r, c))));
        assert!((26..64).any(|r| (60..76).any(|c| surface.is_set(r, c))));
    }

    #[test]
    fn test_render_score_skips_large_scores() {
        let mut surface = DisplaySurface::new();
        render_score(&mut surface, MAX_SCORE).unwrap();
        assert!((0..64).all(|r| (0..128).all(|c| !surface.is_set(r, c))));

        render_score(&mut surface, 42).unwrap();
        assert!((0..64).any(|r| (30..46).any(|c| surface.is_set(r, c))));
    }

    #[test]
    fn test_report_presence() {
        let mut log: DiagnosticLog = DiagnosticLog::default();
        report_presence(&mut log, Presence::InitFailed);
        report_presence(&mut log, Presence::NotResponding);
        assert_eq!(log.iter().next(), Some((Level::Warn, "Init fails")));
        assert_eq!(log.last(), Some((Level::Warn, "Not working")));
    }
}
