use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::assets::FileAssets;
use crate::overworld::{Overworld, OverworldConfig, OverworldError};
use crate::{resolve_app_paths, StartupError};

use super::input::InputCollector;
use super::metrics::{window_title, MetricsAccumulator};
use super::rendering::{RenderError, Renderer};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Overworld".to_string(),
            window_width: 800,
            window_height: 600,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Overworld(#[from] OverworldError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] RenderError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and runs `start_map` until the player quits. A failed
/// map transition ends the loop and is returned as the error.
pub fn run_overworld(
    config: LoopConfig,
    overworld_config: OverworldConfig,
    start_map: &str,
) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        data_dir = %app_paths.data_dir.display(),
        start_map,
        "startup"
    );
    let assets = FileAssets::new(app_paths.data_dir.clone());
    let buffer = overworld_config.viewport;
    let mut overworld = Overworld::new(overworld_config, assets.clone(), start_map)?;

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
    let mut renderer =
        Renderer::new(Arc::clone(&window), buffer, assets).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, Instant::now());
    let mut last_applied_title: Option<String> = None;
    let mut fatal_error: Option<OverworldError> = None;
    let fatal_slot = &mut fatal_error;

    let run_result = event_loop.run(move |event, window_target| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => {
                input_collector.mark_quit_requested();
                info!(reason = "window_close", "shutdown_requested");
                window_target.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                    warn!(error = %error, "renderer_resize_failed");
                    window_target.exit();
                }
            }
            WindowEvent::Focused(false) => input_collector.release_all(),
            WindowEvent::KeyboardInput { event, .. } => {
                input_collector.handle_keyboard_input(&event);
                if input_collector.quit_requested() {
                    info!(reason = "escape_key", "shutdown_requested");
                    window_target.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                last_frame_instant = now;
                accumulator =
                    accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

                let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                for _ in 0..step_plan.ticks_to_run {
                    let input = input_collector.snapshot_for_tick();
                    overworld.handle_movement(input.movement());
                    if input.interact_pressed() {
                        overworld.interact();
                    }
                    if let Err(error) = overworld.update(fixed_dt_seconds) {
                        error!(map = overworld.map_id(), error = %error, "map_transition_failed");
                        *fatal_slot = Some(error);
                        window_target.exit();
                        return;
                    }
                    metrics_accumulator.record_tick();
                }
                accumulator = step_plan.remaining_accumulator;
                if step_plan.dropped_backlog > Duration::ZERO {
                    warn!(
                        dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                        max_ticks_per_frame, "sim_clamp_triggered"
                    );
                }

                let elapsed_since_last_present =
                    Instant::now().saturating_duration_since(last_present_instant);
                let cap_sleep = compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                if cap_sleep > Duration::ZERO {
                    thread::sleep(cap_sleep);
                }

                let draw_list = overworld.draw();
                if let Err(error) = renderer.render(overworld.map(), &draw_list) {
                    warn!(error = %error, "renderer_draw_failed");
                    window_target.exit();
                }
                last_present_instant = Instant::now();
                metrics_accumulator.record_frame(raw_frame_dt);

                if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                    info!(
                        fps = snapshot.fps,
                        tps = snapshot.tps,
                        frame_time_ms = snapshot.frame_time_ms,
                        map = overworld.map_id(),
                        npcs = overworld.npcs().len(),
                        "loop_metrics"
                    );
                }
                let next_title = window_title(
                    &config.window_title,
                    overworld.map_id(),
                    metrics_accumulator.latest(),
                );
                if last_applied_title.as_deref() != Some(next_title.as_str()) {
                    window.set_title(&next_title);
                    last_applied_title = Some(next_title);
                }
            }
            _ => {}
        },
        Event::AboutToWait => window.request_redraw(),
        Event::LoopExiting => info!("shutdown"),
        _ => {}
    });

    run_result.map_err(AppError::EventLoopRun)?;
    match fatal_error {
        Some(error) => Err(AppError::Overworld(error)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

/// Whole fixed steps that fit in `accumulator`, at most `max_ticks_per_frame`.
/// Backlog beyond the cap is dropped rather than carried.
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

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    cap.map_or_else(|| "off".to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_matches_overworld_viewport() {
        let config = LoopConfig::default();
        let viewport = OverworldConfig::default().viewport;
        assert_eq!(
            (config.window_width, config.window_height),
            (viewport.width, viewport.height)
        );
        assert_eq!(config.target_tps, 60);
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(16), max_frame_delta),
            Duration::from_millis(16)
        );
    }

    #[test]
    fn plan_sim_steps_keeps_partial_step() {
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
    fn zero_durations_fall_back() {
        let fallback = Duration::from_secs(1);
        assert_eq!(normalize_non_zero_duration(Duration::ZERO, fallback), fallback);
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), fallback),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn render_cap_zero_means_off() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(target_frame_duration(None), None);
        assert_eq!(format_render_cap(None), "off");
        assert_eq!(format_render_cap(Some(30)), "30");
    }

    #[test]
    fn cap_sleep_covers_remaining_budget_only() {
        let target = target_frame_duration(Some(1));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(250), target),
            Duration::from_millis(750)
        );
        assert_eq!(
            compute_cap_sleep(Duration::from_secs(2), target),
            Duration::ZERO
        );
    }
}
