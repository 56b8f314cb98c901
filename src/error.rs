//! Host-side errors for the desktop character. The simulation core itself
//! never fails; only window, surface, and sprite-sheet setup can.

use std::fmt;

#[derive(Debug)]
pub enum HostError {
    Window(String),
    Surface(String),
    Sprite(String),
    Io(std::io::Error),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(msg) => write!(f, "Window error: {msg}"),
            Self::Surface(msg) => write!(f, "Surface error: {msg}"),
            Self::Sprite(msg) => write!(f, "Sprite error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
