use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::{DrawList, InputAction, InputSnapshot, Renderer, Scene, SceneCommand, Viewport};

const FALLBACK_FRAME_DELTA: Duration = Duration::from_millis(250);
const FALLBACK_METRICS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub logical_width: u32,
    pub logical_height: u32,
    pub target_tps: u32,
    /// Longer frames (debugger pauses, window drags) are treated as this long.
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Platformer".to_string(),
            window_width: 960,
            window_height: 720,
            logical_width: 320,
            logical_height: 240,
            target_tps: 60,
            max_frame_delta: FALLBACK_FRAME_DELTA,
            max_ticks_per_frame: 5,
            metrics_log_interval: FALLBACK_METRICS_INTERVAL,
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create game window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `scene` at a fixed tick rate until the
/// window closes, Esc is pressed or the scene asks to quit.
pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(config.window_width),
                f64::from(config.window_height),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let logical = Viewport {
        width: config.logical_width.max(1),
        height: config.logical_height.max(1),
    };
    let renderer =
        Renderer::new(Arc::clone(&window), logical).map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runtime = Runtime::new(&config, window, renderer, scene);
    info!(
        target_tps = config.target_tps.max(1),
        max_ticks_per_frame = runtime.clock.max_ticks,
        logical_width = logical.width,
        logical_height = logical.height,
        "loop_config"
    );

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == runtime.window.id() => {
                if runtime.on_window_event(event) == LoopSignal::Exit {
                    window_target.exit();
                }
            }
            Event::AboutToWait => runtime.window.request_redraw(),
            Event::LoopExiting => {
                runtime.scene.unload();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSignal {
    Continue,
    Exit,
}

struct Runtime {
    window: Arc<Window>,
    renderer: Renderer,
    scene: Box<dyn Scene>,
    keyboard: KeyboardState,
    clock: FixedStepClock,
    pacer: RenderPacer,
    metrics: MetricsAccumulator,
    frame: DrawList,
    default_title: String,
    shown_title: Option<String>,
}

impl Runtime {
    fn new(
        config: &LoopConfig,
        window: Arc<Window>,
        renderer: Renderer,
        mut scene: Box<dyn Scene>,
    ) -> Self {
        scene.load();
        let now = Instant::now();
        let metrics_interval =
            non_zero_or(config.metrics_log_interval, FALLBACK_METRICS_INTERVAL);
        Self {
            window,
            renderer,
            scene,
            keyboard: KeyboardState::default(),
            clock: FixedStepClock::new(config, now),
            pacer: RenderPacer::new(config.max_render_fps, now),
            metrics: MetricsAccumulator::new(metrics_interval, now),
            frame: DrawList::default(),
            default_title: config.window_title.clone(),
            shown_title: None,
        }
    }

    fn on_window_event(&mut self, event: WindowEvent) -> LoopSignal {
        match event {
            WindowEvent::CloseRequested => {
                info!(reason = "window_close", "shutdown_requested");
                LoopSignal::Exit
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = self.window.inner_size();
                self.resize(size.width, size.height)
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.keyboard.on_key(&event);
                if self.keyboard.quit_requested {
                    info!(reason = "escape_key", "shutdown_requested");
                    return LoopSignal::Exit;
                }
                LoopSignal::Continue
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => LoopSignal::Continue,
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> LoopSignal {
        match self.renderer.resize(width, height) {
            Ok(()) => LoopSignal::Continue,
            Err(error) => {
                warn!(error = %error, width, height, "renderer_resize_failed");
                LoopSignal::Exit
            }
        }
    }

    fn redraw(&mut self) -> LoopSignal {
        let now = Instant::now();
        let step = self.clock.advance(now);
        let mut signal = LoopSignal::Continue;
        for _ in 0..step.ticks {
            let input = self.keyboard.snapshot_for_tick();
            let command = self.scene.update(self.clock.dt_seconds, &input);
            signal = self.apply(command);
            self.metrics.record_tick();
            if signal == LoopSignal::Exit {
                break;
            }
        }
        if step.dropped_backlog > Duration::ZERO {
            self.metrics.record_dropped_backlog(step.dropped_backlog);
            debug!(
                dropped_backlog_ms = step.dropped_backlog.as_millis() as u64,
                "sim_clamp_triggered"
            );
        }

        self.pacer.wait();
        self.frame.clear();
        self.scene.render(&mut self.frame);
        if let Err(error) = self.renderer.render(&self.frame) {
            warn!(error = %error, "renderer_draw_failed");
            signal = LoopSignal::Exit;
        }
        self.pacer.presented();
        self.refresh_title();

        self.metrics.record_frame(step.frame_time);
        if let Some(snapshot) = self.metrics.maybe_snapshot(now) {
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                worst_frame_time_ms = snapshot.worst_frame_time_ms,
                dropped_backlog_ms = snapshot.dropped_backlog_ms,
                "loop_metrics"
            );
        }
        signal
    }

    fn apply(&mut self, command: SceneCommand) -> LoopSignal {
        match command {
            SceneCommand::None => LoopSignal::Continue,
            SceneCommand::HardReset => {
                self.scene.unload();
                self.scene.load();
                info!("scene_reset");
                LoopSignal::Continue
            }
            SceneCommand::Quit => {
                info!(reason = "scene_request", "shutdown_requested");
                LoopSignal::Exit
            }
        }
    }

    fn refresh_title(&mut self) {
        let title = self.scene.debug_title();
        if title != self.shown_title {
            self.window
                .set_title(title.as_deref().unwrap_or(&self.default_title));
            self.shown_title = title;
        }
    }
}

/// Turns wall-clock frames into a whole number of fixed ticks. Leftover time
/// carries into the next frame; anything past the per-frame tick cap is
/// thrown away instead of snowballing.
#[derive(Debug)]
struct FixedStepClock {
    dt: Duration,
    dt_seconds: f32,
    max_frame_delta: Duration,
    max_ticks: u32,
    accumulator: Duration,
    last_frame: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameStep {
    frame_time: Duration,
    ticks: u32,
    dropped_backlog: Duration,
}

impl FixedStepClock {
    fn new(config: &LoopConfig, now: Instant) -> Self {
        let dt = Duration::from_secs_f64(1.0 / f64::from(config.target_tps.max(1)));
        Self {
            dt,
            dt_seconds: dt.as_secs_f32(),
            max_frame_delta: non_zero_or(config.max_frame_delta, FALLBACK_FRAME_DELTA),
            max_ticks: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
            last_frame: now,
        }
    }

    fn advance(&mut self, now: Instant) -> FrameStep {
        let frame_time = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.accumulator = self
            .accumulator
            .saturating_add(frame_time.min(self.max_frame_delta));

        let mut ticks = 0;
        while self.accumulator >= self.dt && ticks < self.max_ticks {
            self.accumulator -= self.dt;
            ticks += 1;
        }
        let dropped_backlog = if self.accumulator >= self.dt {
            std::mem::take(&mut self.accumulator)
        } else {
            Duration::ZERO
        };
        FrameStep {
            frame_time,
            ticks,
            dropped_backlog,
        }
    }
}

/// Optional render FPS cap. Sleeps off whatever is left of the frame budget.
#[derive(Debug)]
struct RenderPacer {
    budget: Option<Duration>,
    last_present: Instant,
}

impl RenderPacer {
    fn new(max_fps: Option<u32>, now: Instant) -> Self {
        Self {
            budget: max_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            last_present: now,
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_present);
        match self.budget {
            Some(budget) if elapsed < budget => budget - elapsed,
            _ => Duration::ZERO,
        }
    }

    fn wait(&self) {
        let remaining = self.remaining(Instant::now());
        if remaining > Duration::ZERO {
            thread::sleep(remaining);
        }
    }

    fn presented(&mut self) {
        self.last_present = Instant::now();
    }
}

/// Keyboard state between ticks. Presses stay latched until the next tick
/// reads them so a tap shorter than a tick is never lost. An action stays
/// held while any of its keys is down.
#[derive(Debug, Default)]
struct KeyboardState {
    quit_requested: bool,
    actions: ActionStates,
    held_keys: HashSet<KeyCode>,
}

impl KeyboardState {
    fn on_key(&mut self, key_event: &KeyEvent) {
        // OS key repeat; held state already covers it.
        if key_event.repeat {
            return;
        }
        self.set_key(
            key_event.physical_key,
            key_event.state == ElementState::Pressed,
        );
    }

    fn set_key(&mut self, key: PhysicalKey, down: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(action) = action_for_key(code) else {
            return;
        };
        if down {
            self.held_keys.insert(code);
        } else {
            self.held_keys.remove(&code);
        }
        let still_held = self
            .held_keys
            .iter()
            .any(|key| action_for_key(*key) == Some(action));
        self.actions.set(action, still_held);
        if action == InputAction::Quit && down {
            self.quit_requested = true;
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(self.quit_requested, self.actions);
        self.actions.clear_pressed();
        snapshot
    }
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::Space | KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::Jump),
        KeyCode::KeyR => Some(InputAction::Restart),
        KeyCode::Escape => Some(InputAction::Quit),
        _ => None,
    }
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(max_ticks: u32, start: Instant) -> FixedStepClock {
        let config = LoopConfig {
            target_tps: 50,
            max_ticks_per_frame: max_ticks,
            ..LoopConfig::default()
        };
        FixedStepClock::new(&config, start)
    }

    #[test]
    fn clock_carries_partial_tick() {
        let start = Instant::now();
        let mut clock = clock(5, start);
        let step = clock.advance(start + Duration::from_millis(50));
        assert_eq!(step.ticks, 2);
        assert_eq!(step.dropped_backlog, Duration::ZERO);

        let step = clock.advance(start + Duration::from_millis(60));
        assert_eq!(step.ticks, 1);
    }

    #[test]
    fn clock_drops_backlog_past_tick_cap() {
        let start = Instant::now();
        let mut clock = clock(3, start);
        let step = clock.advance(start + Duration::from_millis(120));
        assert_eq!(step.ticks, 3);
        assert_eq!(step.dropped_backlog, Duration::from_millis(60));

        let step = clock.advance(start + Duration::from_millis(130));
        assert_eq!(step.ticks, 0);
    }

    #[test]
    fn clock_clamps_long_frames() {
        let start = Instant::now();
        let mut clock = clock(100, start);
        let step = clock.advance(start + Duration::from_secs(3));
        assert_eq!(step.frame_time, Duration::from_secs(3));
        assert_eq!(step.ticks, 12);
    }

    #[test]
    fn zero_durations_fall_back() {
        let config = LoopConfig {
            max_frame_delta: Duration::ZERO,
            max_ticks_per_frame: 0,
            ..LoopConfig::default()
        };
        let clock = FixedStepClock::new(&config, Instant::now());
        assert_eq!(clock.max_frame_delta, FALLBACK_FRAME_DELTA);
        assert_eq!(clock.max_ticks, 1);
    }

    #[test]
    fn pacer_only_waits_when_ahead() {
        let start = Instant::now();
        let pacer = RenderPacer::new(Some(50), start);
        assert_eq!(
            pacer.remaining(start + Duration::from_millis(5)),
            Duration::from_millis(15)
        );
        assert_eq!(
            pacer.remaining(start + Duration::from_millis(30)),
            Duration::ZERO
        );
        assert_eq!(
            RenderPacer::new(Some(0), start).remaining(start),
            Duration::ZERO
        );
    }

    #[test]
    fn jump_press_lasts_one_tick() {
        let mut keyboard = KeyboardState::default();
        keyboard.set_key(PhysicalKey::Code(KeyCode::Space), true);
        let first = keyboard.snapshot_for_tick();
        let second = keyboard.snapshot_for_tick();
        assert!(first.is_pressed(InputAction::Jump));
        assert!(!second.is_pressed(InputAction::Jump));
        assert!(second.is_held(InputAction::Jump));
    }

    #[test]
    fn second_key_for_held_action_is_not_a_new_press() {
        let mut keyboard = KeyboardState::default();
        keyboard.set_key(PhysicalKey::Code(KeyCode::KeyD), true);
        let _ = keyboard.snapshot_for_tick();
        keyboard.set_key(PhysicalKey::Code(KeyCode::KeyD), true);
        assert!(!keyboard.snapshot_for_tick().is_pressed(InputAction::MoveRight));

        keyboard.set_key(PhysicalKey::Code(KeyCode::KeyD), false);
        keyboard.set_key(PhysicalKey::Code(KeyCode::ArrowRight), true);
        assert!(keyboard.snapshot_for_tick().is_pressed(InputAction::MoveRight));
    }

    #[test]
    fn action_held_until_last_of_its_keys_is_released() {
        let mut keyboard = KeyboardState::default();
        keyboard.set_key(PhysicalKey::Code(KeyCode::Space), true);
        let _ = keyboard.snapshot_for_tick();

        keyboard.set_key(PhysicalKey::Code(KeyCode::ArrowUp), true);
        let both = keyboard.snapshot_for_tick();
        assert!(both.is_held(InputAction::Jump));
        assert!(!both.is_pressed(InputAction::Jump));

        keyboard.set_key(PhysicalKey::Code(KeyCode::Space), false);
        assert!(keyboard.snapshot_for_tick().is_held(InputAction::Jump));

        keyboard.set_key(PhysicalKey::Code(KeyCode::ArrowUp), false);
        assert!(!keyboard.snapshot_for_tick().is_held(InputAction::Jump));
    }

    #[test]
    fn escape_requests_quit_and_restart_maps_to_r() {
        let mut keyboard = KeyboardState::default();
        keyboard.set_key(PhysicalKey::Code(KeyCode::KeyR), true);
        assert!(keyboard.snapshot_for_tick().is_pressed(InputAction::Restart));

        keyboard.set_key(PhysicalKey::Code(KeyCode::Escape), true);
        assert!(keyboard.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut keyboard = KeyboardState::default();
        keyboard.set_key(PhysicalKey::Code(KeyCode::KeyQ), true);
        let snapshot = keyboard.snapshot_for_tick();
        assert!(!snapshot.is_held(InputAction::Jump));
        assert!(!snapshot.quit_requested());
    }
}
