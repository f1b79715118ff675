//! Video stream control
//!
//! Frames are decoded by an external player; this side only switches the
//! vehicle's stream on and off and tracks which of the two it is doing.

use crate::command::DispatcherHandle;
use tello_shared::{limits, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Stream state as last confirmed by the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoState {
    Stopped,
    /// `streamon` sent, answer pending
    Starting,
    Streaming,
}

#[derive(Debug, Clone)]
pub struct VideoConfig {
    /// Where the vehicle's stream can be picked up
    pub stream_addr: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            stream_addr: limits::VIDEO_STREAM_ADDR.into(),
        }
    }
}

/// Owns the stream on/off transitions
pub struct VideoController {
    dispatcher: DispatcherHandle,
    config: VideoConfig,
    state: Mutex<VideoState>,
}

impl VideoController {
    pub fn new(dispatcher: DispatcherHandle, config: VideoConfig) -> Self {
        Self {
            dispatcher,
            config,
            state: Mutex::new(VideoState::Stopped),
        }
    }

    pub async fn state(&self) -> VideoState {
        *self.state.lock().await
    }

    /// Start when stopped, stop when streaming, wait out a pending start
    pub async fn toggle(&self) -> VideoState {
        match self.state().await {
            VideoState::Stopped => self.start().await,
            VideoState::Streaming => self.stop().await,
            VideoState::Starting => {
                info!("[VIDEO] Video stream is already starting");
                VideoState::Starting
            }
        }
    }

    pub async fn start(&self) -> VideoState {
        {
            let mut state = self.state.lock().await;
            if *state != VideoState::Stopped {
                info!("[VIDEO] Video stream already started");
                return *state;
            }
            *state = VideoState::Starting;
        }

        let result = self.dispatcher.submit(Command::StreamOn).await;
        let next = if result.success {
            info!("[VIDEO] Video streaming started!");
            info!("[VIDEO] Stream available at udp://{}", self.config.stream_addr);
            VideoState::Streaming
        } else {
            warn!(
                "[VIDEO] Failed to start video stream. Response: {}",
                result.response_or("No response")
            );
            VideoState::Stopped
        };

        *self.state.lock().await = next;
        next
    }

    /// Stop the stream; a refused `streamoff` leaves it marked as streaming
    pub async fn stop(&self) -> VideoState {
        let current = self.state().await;
        if current != VideoState::Streaming {
            return current;
        }

        let result = self.dispatcher.submit(Command::StreamOff).await;
        let mut state = self.state.lock().await;
        if result.success {
            info!("[VIDEO] Video stream stopped");
            *state = VideoState::Stopped;
        } else {
            warn!(
                "[VIDEO] Failed to stop video stream. Response: {}",
                result.response_or("No response")
            );
        }
        *state
    }
}
