use anyhow::{Context, Result};
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tello_remote::command::handlers::{
    handle_flight_command, handle_status_request, handle_wifi_update,
};
use tello_remote::command::{CommandDispatcher, DispatcherHandle, DEFAULT_QUEUE_DEPTH};
use tello_remote::connection::{shutdown, EstablishConfig, Establisher, TeardownConfig};
use tello_remote::input::{Intent, Interrupt, KeyboardInput, KEY_LEGEND};
use tello_remote::transport::{SendOptions, SessionConfig};
use tello_remote::video::{VideoConfig, VideoController};
use tello_shared::{limits, Command, SessionLifecycle};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Keyboard remote control for a Tello quadcopter
#[derive(Parser, Debug)]
#[command(name = "tello-remote", version, about)]
struct Args {
    /// Vehicle command address
    #[arg(long, default_value = limits::VEHICLE_COMMAND_ADDR)]
    vehicle: SocketAddr,

    /// Local UDP port the vehicle answers to
    #[arg(long, default_value_t = limits::LOCAL_COMMAND_PORT)]
    local_port: u16,

    /// Address an external player should read the video stream from
    #[arg(long, default_value = limits::VIDEO_STREAM_ADDR)]
    video: String,

    /// Per-attempt response timeout
    #[arg(long, default_value_t = limits::COMMAND_TIMEOUT_MS / 1000)]
    timeout_secs: u64,

    /// Send attempts per command
    #[arg(long, default_value_t = limits::COMMAND_MAX_RETRIES)]
    retries: u32,

    /// Handshake attempts before giving up
    #[arg(long, default_value_t = limits::ESTABLISH_MAX_ATTEMPTS)]
    attempts: u32,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Tello remote control starting");
    info!("  Vehicle: {}", args.vehicle);
    info!("  Local port: {}", args.local_port);

    let mut interrupt = Interrupt::ctrl_c();
    let mut keyboard = KeyboardInput::stdin();
    let gate = interrupt
        .guard(keyboard.prompt("Connect to the Tello WiFi network and press Enter to continue"))
        .await;
    if gate.flatten().is_none() {
        return Ok(());
    }

    let session_config = SessionConfig {
        local_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.local_port)),
        vehicle_addr: args.vehicle,
        send: SendOptions {
            timeout: Duration::from_secs(args.timeout_secs),
            max_retries: args.retries,
            verbose: true,
        },
        ..Default::default()
    };
    let establisher = Establisher::new(
        session_config,
        EstablishConfig {
            max_attempts: args.attempts,
            ..Default::default()
        },
    );

    let mut lifecycle = SessionLifecycle::new();
    let Some(connected) = interrupt.guard(establisher.connect(&mut lifecycle)).await else {
        return Ok(());
    };
    let session = connected.context("Failed to establish connection")?;

    let emergency = session.emergency_stop();
    let (dispatcher, dispatcher_task) =
        CommandDispatcher::spawn(Arc::new(session), DEFAULT_QUEUE_DEPTH);

    // An interrupt here falls through; the key loop sees the latch and exits
    if let Some(Err(e)) = interrupt.guard(establisher.verify(&dispatcher)).await {
        dispatcher_task.abort();
        return Err(e).context("Connection verification failed");
    }

    if !interrupt.is_set() {
        info!("Control has been successfully established!");
        for line in KEY_LEGEND {
            info!("  {}", line);
        }
    }

    let video = Arc::new(VideoController::new(
        dispatcher.clone(),
        VideoConfig {
            stream_addr: args.video,
        },
    ));

    loop {
        let Some(intent) = interrupt.guard(keyboard.next_intent()).await.flatten() else {
            break;
        };

        match intent {
            Intent::Emergency => {
                emergency.trigger();
            }
            Intent::ToggleVideo => {
                let video = video.clone();
                tokio::spawn(async move {
                    video.toggle().await;
                });
            }
            Intent::Takeoff => spawn_flight(&dispatcher, Command::Takeoff),
            Intent::Land => spawn_flight(&dispatcher, Command::Land),
            Intent::Status => {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    handle_status_request(&dispatcher).await;
                });
            }
            Intent::ConfigureWifi => {
                info!("Configure WiFi Settings");
                let prompt = interrupt.guard(keyboard.prompt("Enter new wifi SSID:"));
                let Some(ssid) = prompt.await.flatten() else {
                    break;
                };
                let prompt = interrupt.guard(keyboard.prompt("Enter new wifi password:"));
                let Some(password) = prompt.await.flatten() else {
                    break;
                };
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_wifi_update(&dispatcher, &ssid, &password).await {
                        warn!("[WIFI] {}", e);
                    }
                });
            }
            Intent::Exit => break,
        }
    }

    // A further Ctrl-C here is handled by the watcher and exits outright
    shutdown(
        &dispatcher,
        dispatcher_task,
        emergency,
        &mut lifecycle,
        TeardownConfig::default(),
    )
    .await;

    if !lifecycle.is_terminal() {
        error!("Session ended in state {:?}", lifecycle.state());
    }

    Ok(())
}

/// Fire off a flight command without holding up the key loop
fn spawn_flight(dispatcher: &DispatcherHandle, command: Command) {
    let dispatcher = dispatcher.clone();
    tokio::spawn(async move {
        handle_flight_command(&dispatcher, command).await;
    });
}
