//! Game controller adapter
//!
//! A polling task reads events from a [`ControllerSource`], keeps the last
//! vertical-axis deflection in [`ControllerState`] and turns a held
//! deflection into `up`/`down` steps, rate limited so a held stick does not
//! flood the vehicle. Buttons map to takeoff, land and the emergency stop.

use crate::command::handlers::report_flight_result;
use crate::command::DispatcherHandle;
use crate::safety::EmergencyStop;
use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tello_shared::{limits, Command};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Raw value range reported by the device for the vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self {
            min: i16::MIN as i32,
            max: i16::MAX as i32,
        }
    }
}

impl AxisRange {
    /// Map a raw reading onto -100..=100 percent around the range center
    pub fn normalize(&self, raw: i32) -> f32 {
        let span = (self.max as f32 - self.min as f32) / 2.0;
        if span <= 0.0 {
            return 0.0;
        }
        let center = (self.max as f32 + self.min as f32) / 2.0;
        ((raw as f32 - center) / span * 100.0).clamp(-100.0, 100.0)
    }
}

/// Buttons with a bound action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Bottom face button
    South,
    /// Right face button
    East,
    Start,
    Other(u16),
}

/// Decoded controller input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Vertical axis moved to this raw value
    Axis(i32),
    ButtonPressed(Button),
}

/// A device producing controller events
#[async_trait]
pub trait ControllerSource: Send {
    /// Next pending event, `None` when nothing changed since the last poll
    async fn poll(&mut self) -> io::Result<Option<ControllerEvent>>;

    /// Give the device handle back before the polling task exits
    async fn release(&mut self);
}

/// Controller adapter tuning
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub range: AxisRange,
    /// Deflection (percent) treated as centered
    pub deadzone_percent: f32,
    /// Distance per movement command
    pub step_cm: u32,
    /// Minimum gap between movement commands
    pub rate_limit: Duration,
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            range: AxisRange::default(),
            deadzone_percent: limits::AXIS_DEADZONE_PERCENT,
            step_cm: limits::AXIS_STEP_CM,
            rate_limit: Duration::from_millis(limits::CONTROLLER_RATE_LIMIT_MS),
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Last axis deflection and when a movement command last went out
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub axis_percent: f32,
    pub last_dispatch: Option<Instant>,
}

impl ControllerState {
    /// Decide whether the held deflection produces a command at `now`
    pub fn tick(&mut self, now: Instant, config: &ControllerConfig) -> Option<Command> {
        if self.axis_percent.abs() <= config.deadzone_percent {
            return None;
        }
        if let Some(last) = self.last_dispatch {
            if now.saturating_duration_since(last) < config.rate_limit {
                return None;
            }
        }

        let command = if self.axis_percent > 0.0 {
            Command::up(config.step_cm)
        } else {
            Command::down(config.step_cm)
        };
        match command {
            Ok(command) => {
                self.last_dispatch = Some(now);
                Some(command)
            }
            Err(e) => {
                warn!("[CONTROLLER] {}", e);
                None
            }
        }
    }
}

/// Starts the controller polling task
pub struct ControllerAdapter;

impl ControllerAdapter {
    pub fn spawn(
        source: Box<dyn ControllerSource>,
        dispatcher: DispatcherHandle,
        emergency: EmergencyStop,
        config: ControllerConfig,
    ) -> ControllerHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(poll_loop(source, dispatcher, emergency, config, stop.clone()));
        ControllerHandle { stop, task }
    }
}

/// Stops and joins the polling task
pub struct ControllerHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Ask the task to finish and wait until it has released the device
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Release);
        if let Err(e) = self.task.await {
            error!("[CONTROLLER] Polling task ended abnormally: {}", e);
        }
    }
}

async fn poll_loop(
    mut source: Box<dyn ControllerSource>,
    dispatcher: DispatcherHandle,
    emergency: EmergencyStop,
    config: ControllerConfig,
    stop: Arc<AtomicBool>,
) {
    info!("[CONTROLLER] Controller connected");
    let mut state = ControllerState::default();
    // At most one movement queued or on the wire
    let mut movement: Option<JoinHandle<()>> = None;
    let mut ticker = interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !stop.load(Ordering::Acquire) {
        ticker.tick().await;

        match source.poll().await {
            Ok(Some(ControllerEvent::Axis(raw))) => {
                state.axis_percent = config.range.normalize(raw);
            }
            Ok(Some(ControllerEvent::ButtonPressed(button))) => match button {
                Button::Start => {
                    emergency.trigger();
                }
                Button::South => {
                    submit(&dispatcher, Command::Takeoff);
                }
                Button::East => {
                    submit(&dispatcher, Command::Land);
                }
                Button::Other(code) => debug!("[CONTROLLER] Unbound button {}", code),
            },
            Ok(None) => {}
            Err(e) => {
                warn!("[CONTROLLER] Controller error: {}", e);
                break;
            }
        }

        let moving = movement.as_ref().is_some_and(|task| !task.is_finished());
        if !moving {
            if let Some(command) = state.tick(Instant::now(), &config) {
                movement = submit(&dispatcher, command);
            }
        }
    }

    source.release().await;
    info!("[CONTROLLER] Controller released");
}

/// Queue in polling order without waiting for admission
///
/// Returns the task awaiting the reply, or `None` when the command was
/// dropped because the queue is full or closed.
fn submit(dispatcher: &DispatcherHandle, command: Command) -> Option<JoinHandle<()>> {
    let label = command.redacted();
    match dispatcher.try_enqueue(command, None) {
        Ok(pending) => Some(tokio::spawn(async move {
            report_flight_result(&pending.wait().await);
        })),
        Err(e) => {
            warn!("[CONTROLLER] Dropped '{}': {}", label, e);
            None
        }
    }
}
