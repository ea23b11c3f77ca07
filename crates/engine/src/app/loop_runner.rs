use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowBuilder;

use crate::StartupError;

use super::metrics::MetricsAccumulator;
use super::{AudioService, InputAction, InputSampler, Renderer, Scene, SceneCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub logical_width: u32,
    pub logical_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Quizfield".to_string(),
            logical_width: 900,
            logical_height: 700,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    mut scene: Box<dyn Scene>,
    mut audio: Box<dyn AudioService>,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.logical_width as f64,
                config.logical_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(
        Arc::clone(&window),
        config.logical_width,
        config.logical_height,
    )
    .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);

    info!(
        target_tps,
        logical_width = config.logical_width,
        logical_height = config.logical_height,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        "loop_config"
    );

    let mut sampler = InputSampler::new();
    scene.load(audio.as_mut());
    info!("scene_loaded");

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => sampler.release_all(),
                WindowEvent::KeyboardInput { event, .. } => {
                    apply_physical_key(
                        &mut sampler,
                        event.physical_key,
                        event.state == ElementState::Pressed,
                    );
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if button == MouseButton::Left {
                        sampler.set_raw(
                            InputAction::PointerPrimary,
                            state == ElementState::Pressed,
                        );
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
                        let input = sampler.sample();
                        let command = scene.update(&input, audio.as_mut());
                        metrics.record_tick();
                        if command == SceneCommand::Quit {
                            info!(reason = "scene_quit", "shutdown_requested");
                            window_target.exit();
                            return;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        metrics.record_dropped(step_plan.dropped_backlog, fixed_dt);
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame,
                            "sim_clamp_triggered"
                        );
                    }

                    if let Err(error) = renderer.render_scene(scene.as_mut()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    metrics.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            dropped_ticks = snapshot.dropped_ticks,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                scene.unload(audio.as_mut());
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn apply_physical_key(sampler: &mut InputSampler, key: PhysicalKey, is_pressed: bool) {
    let PhysicalKey::Code(code) = key else {
        return;
    };
    sampler.set_key(code, is_pressed);
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
