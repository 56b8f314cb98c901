//! Demo binary: the mascot as a floating desktop character.
//!
//! Runs a ~60 fps event loop with the character window and takes commands on
//! stdin, one per line:
//!
//!   spawn | despawn | toggle    -- mascot lifecycle
//!   status                      -- print a JSON status line to stdout
//!   grab                        -- mouse-grab prank toward the cursor
//!   freeze <ms>                 -- stand still for a while
//!   quit                        -- exit

use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, TryRecvError};
use tao::event::{ElementState, Event, MouseButton, StartCause, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoopBuilder};
use tracing::{info, warn};

use scamper::character::CharacterHost;
use scamper::config;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Spawn,
    Despawn,
    Toggle,
    Status,
    Grab,
    Freeze(f64),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "spawn" => Some(Command::Spawn),
        "despawn" => Some(Command::Despawn),
        "toggle" => Some(Command::Toggle),
        "status" => Some(Command::Status),
        "grab" => Some(Command::Grab),
        "freeze" => parts.next().and_then(|ms| ms.parse().ok()).map(Command::Freeze),
        "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

fn main() {
    // Init tracing to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("scamper starting");

    let cfg = config::load();

    // Command thread: stdin lines -> channel, drained by the event loop.
    let (cmd_tx, cmd_rx) = unbounded::<Command>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_command(trimmed) {
                Some(command) => {
                    if cmd_tx.send(command).is_err() {
                        break;
                    }
                }
                None => warn!(line = %trimmed, "unknown command"),
            }
        }
    });

    let event_loop = EventLoopBuilder::new().build();
    let mut host: Option<CharacterHost> = None;

    event_loop.run(move |event, event_loop_target, control_flow| {
        // ~60 fps wakeups for the physics/animation tick
        *control_flow =
            ControlFlow::WaitUntil(Instant::now() + Duration::from_millis(16));

        match event {
            Event::NewEvents(cause) => {
                match cause {
                    StartCause::Init => {
                        match CharacterHost::new(event_loop_target, cfg.clone()) {
                            Ok(h) => {
                                host = Some(h);
                                info!("character window created");
                            }
                            Err(e) => {
                                warn!(error = %e, "failed to create character window");
                                *control_flow = ControlFlow::Exit;
                                return;
                            }
                        }
                    }
                    StartCause::ResumeTimeReached { .. } => {
                        if let Some(ref mut h) = host {
                            h.tick();
                            h.render();
                        }
                    }
                    _ => {}
                }

                // Drain pending commands
                loop {
                    match cmd_rx.try_recv() {
                        Ok(command) => {
                            let Some(ref mut h) = host else { continue };
                            match command {
                                Command::Spawn => h.spawn(),
                                Command::Despawn => h.despawn(),
                                Command::Toggle => h.toggle(),
                                Command::Status => println!("{}", h.status_json()),
                                Command::Grab => h.trigger_grab(),
                                Command::Freeze(ms) => h.stand_still_for(ms),
                                Command::Quit => {
                                    info!("quit requested");
                                    *control_flow = ControlFlow::Exit;
                                }
                            }
                        }
                        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                    }
                }
            }

            Event::WindowEvent {
                window_id,
                ref event,
                ..
            } => {
                if let Some(ref mut h) = host {
                    if window_id == h.window_id() {
                        match event {
                            WindowEvent::CursorMoved { position, .. } => {
                                h.on_cursor_moved(*position);
                            }
                            WindowEvent::MouseInput {
                                state: ElementState::Pressed,
                                button: MouseButton::Left,
                                ..
                            } => {
                                h.on_mouse_down();
                            }
                            WindowEvent::MouseInput {
                                state: ElementState::Released,
                                button: MouseButton::Left,
                                ..
                            } => {
                                h.on_mouse_up();
                            }
                            _ => {}
                        }
                    }
                }
            }

            _ => {}
        }
    });
}
