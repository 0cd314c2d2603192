use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::graphics::{Color, DrawSurface};
use crate::math::Vec2;
use crate::scene::DrawStats;

use super::input::{ActionStates, PointerState};
use super::metrics::MetricsAccumulator;
use super::presenter::Presenter;
use super::{InputAction, InputSnapshot, MetricsHandle};

pub const SLOW_FRAME_ENV_VAR: &str = "TD_SLOW_FRAME_MS";

const DEFAULT_CLEAR_COLOR: Color = [16, 18, 24, 255];

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Logical drawing resolution, scaled to the window.
    pub framebuffer_width: u32,
    pub framebuffer_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Bastion".to_string(),
            window_width: 1280,
            window_height: 720,
            framebuffer_width: 640,
            framebuffer_height: 360,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand {
    Continue,
    Quit,
}

/// What the loop drives. All ticks of a frame run before its single draw.
pub trait Game {
    /// One fixed tick; `sync` is the tick length in seconds.
    fn update(&mut self, sync: f32, input: &InputSnapshot) -> LoopCommand;

    fn draw(&mut self, surface: &mut dyn DrawSurface) -> DrawStats;

    fn clear_color(&self) -> Color {
        DEFAULT_CLEAR_COLOR
    }

    /// Window title override; `None` keeps the configured title.
    fn title(&self) -> Option<String> {
        None
    }

    fn shutdown(&mut self) {}
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, game: impl Game) -> Result<(), AppError> {
    run_app_with_metrics(config, game, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    mut game: impl Game,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let framebuffer_width = config.framebuffer_width.max(1);
    let framebuffer_height = config.framebuffer_height.max(1);
    let mut presenter = Presenter::new(Arc::clone(&window), framebuffer_width, framebuffer_height)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = config.max_render_fps.filter(|fps| *fps > 0);
    let render_frame_target = effective_render_cap.map(|fps| Duration::from_secs_f64(1.0 / fps as f64));

    info!(
        target_tps,
        framebuffer_width,
        framebuffer_height,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %effective_render_cap.map_or_else(|| "off".to_string(), |fps| fps.to_string()),
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = presenter.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let mapped = presenter.window_to_frame(position.x as f32, position.y as f32);
                    input_collector.set_pointer_position(mapped);
                }
                WindowEvent::CursorLeft { .. } => input_collector.set_pointer_position(None),
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => input_collector.handle_pointer_button(state),
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    if slow_frame_delay > Duration::ZERO {
                        // Debug perturbation only, not the FPS cap.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    accumulator = accumulator.saturating_add(raw_frame_dt.min(max_frame_delta));

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input = input_collector.snapshot_for_tick();
                        let command = game.update(fixed_dt_seconds, &input);
                        metrics_accumulator.record_tick();
                        if command == LoopCommand::Quit || input.quit_requested() {
                            info!(reason = "game_command", "shutdown_requested");
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let cap_sleep = compute_cap_sleep(
                        Instant::now().saturating_duration_since(last_present_instant),
                        render_frame_target,
                    );
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let clear = game.clear_color();
                    let stats = match presenter.present(clear, |surface| game.draw(surface)) {
                        Ok(stats) => stats,
                        Err(error) => {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                            DrawStats::default()
                        }
                    };
                    last_present_instant = Instant::now();

                    let next_title = game.title();
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(&config.window_title));
                        last_applied_title = next_title;
                    }

                    metrics_accumulator.record_frame(raw_frame_dt, stats);
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            nodes_drawn = snapshot.nodes_drawn,
                            nodes_skipped = snapshot.nodes_skipped,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                game.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Accumulates window events between ticks. Press edges are handed to the
/// next tick only.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    actions: ActionStates,
    pointer_position: Option<Vec2>,
    pointer_down: bool,
    pointer_pressed_edge: bool,
    pointer_released_edge: bool,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.handle_physical_key(key_event.physical_key, is_pressed);
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let action = match key {
            PhysicalKey::Code(KeyCode::Space) | PhysicalKey::Code(KeyCode::KeyP) => {
                InputAction::Pause
            }
            PhysicalKey::Code(KeyCode::KeyR) => InputAction::Restart,
            PhysicalKey::Code(KeyCode::F3) => InputAction::ToggleMetrics,
            PhysicalKey::Code(KeyCode::Escape) => {
                if is_pressed {
                    info!(reason = "escape_key", "shutdown_requested");
                    self.mark_quit_requested();
                }
                InputAction::Quit
            }
            _ => return,
        };
        self.actions.set(action, is_pressed);
    }

    fn set_pointer_position(&mut self, position: Option<Vec2>) {
        self.pointer_position = position;
    }

    fn handle_pointer_button(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.pointer_down {
                    self.pointer_pressed_edge = true;
                }
                self.pointer_down = true;
            }
            ElementState::Released => {
                if self.pointer_down {
                    self.pointer_released_edge = true;
                }
                self.pointer_down = false;
            }
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let pointer = PointerState {
            position: self.pointer_position,
            // A press and release between two ticks still reads as down once.
            down: self.pointer_down || self.pointer_pressed_edge,
            pressed: self.pointer_pressed_edge,
            released: self.pointer_released_edge,
        };
        let snapshot = InputSnapshot::new(self.quit_requested, self.actions, pointer);
        self.actions.clear_edges();
        self.pointer_pressed_edge = false;
        self.pointer_released_edge = false;
        snapshot
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    let fallback = Duration::from_millis(config_slow_frame_ms);
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                fallback
            }
        },
        Err(env::VarError::NotPresent) => fallback,
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(40), fixed_dt, 5);
        assert_eq!(result.ticks_to_run, 2);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(8));
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);
        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn cap_sleep_only_when_ahead_of_target() {
        let target = Some(Duration::from_millis(16));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(10), target),
            Duration::from_millis(6)
        );
        assert_eq!(compute_cap_sleep(Duration::from_millis(20), target), Duration::ZERO);
        assert_eq!(compute_cap_sleep(Duration::ZERO, None), Duration::ZERO);
    }

    #[test]
    fn pointer_press_edge_reaches_exactly_one_tick() {
        let mut input = InputCollector::default();
        input.set_pointer_position(Some(Vec2::new(3.0, 4.0)));
        input.handle_pointer_button(ElementState::Pressed);
        input.handle_pointer_button(ElementState::Pressed);

        let first = input.snapshot_for_tick().pointer();
        let second = input.snapshot_for_tick().pointer();
        assert!(first.pressed && first.down);
        assert!(!second.pressed && second.down);
        assert_eq!(second.position, Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn quick_click_between_ticks_reads_as_press_and_release() {
        let mut input = InputCollector::default();
        input.handle_pointer_button(ElementState::Pressed);
        input.handle_pointer_button(ElementState::Released);

        let tick = input.snapshot_for_tick().pointer();
        assert!(tick.pressed && tick.released && tick.down);
        let next = input.snapshot_for_tick().pointer();
        assert!(!next.down && !next.released);
    }

    #[test]
    fn escape_requests_quit_and_keys_map_to_actions() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyP), true);
        let tick = input.snapshot_for_tick();
        assert!(tick.pressed(InputAction::Pause));
        assert!(!tick.quit_requested());

        input.handle_physical_key(PhysicalKey::Code(KeyCode::Escape), true);
        assert!(input.snapshot_for_tick().quit_requested());
    }
}
