//! Errors that stop a listener, with operator hints.

use std::io;

use thiserror::Error;

use crate::server::Transport;

pub type ServerResult<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Flags or environment rejected before any socket was opened.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Accepting or serving failed after the socket was bound.
    #[error("Runtime error: {0}")]
    Runtime(#[source] io::Error),

    #[error("The {0} listener panicked: {1}")]
    ListenerPanicked(Transport, String),

    /// The supervisor lost every listener before one reported back.
    #[error("No listener reported a result")]
    NoListeners,
}

impl ServerError {
    /// Keeps the whole `anyhow` chain, so the rejected flag stays visible.
    pub fn invalid_config(err: &anyhow::Error) -> Self {
        Self::InvalidConfig(format!("{err:#}"))
    }

    pub fn bind_error(address: impl ToString, source: io::Error) -> Self {
        Self::BindError {
            address: address.to_string(),
            source,
        }
    }

    /// Stable code printed with every failure, for grepping logs.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "E001",
            Self::BindError { .. } => "E002",
            Self::Runtime(_) => "E003",
            Self::ListenerPanicked(..) => "E004",
            Self::NoListeners => "E005",
        }
    }

    /// Whether restarting the streamer could succeed without code or
    /// configuration changes, e.g. once a busy port is released.
    pub fn is_recoverable(&self) -> bool {
        let kind = match self {
            Self::BindError { source, .. } => source.kind(),
            Self::Runtime(err) => err.kind(),
            Self::InvalidConfig(_) | Self::ListenerPanicked(..) | Self::NoListeners => {
                return false;
            }
        };

        matches!(
            kind,
            io::ErrorKind::AddrInUse
                | io::ErrorKind::AddrNotAvailable
                | io::ErrorKind::Interrupted
                | io::ErrorKind::TimedOut
        )
    }

    /// What the operator should look at first.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig(_) => Some(
                "Check HOST, HTTP_SERVER_PORT, CONNECT_RPC_SERVER_PORT and the timeout settings",
            ),
            Self::BindError { source, .. } => Some(match source.kind() {
                io::ErrorKind::AddrInUse => {
                    "Another process holds the port; stop it or pick another port"
                }
                io::ErrorKind::PermissionDenied => {
                    "Binding was refused; use a port above 1024 or adjust privileges"
                }
                io::ErrorKind::AddrNotAvailable => "HOST is not an address of this machine",
                _ => "Check the host and port of the listener",
            }),
            Self::Runtime(err) if err.kind() == io::ErrorKind::TimedOut => {
                Some("A connection stalled; consider raising IDLE_TIMEOUT")
            }
            Self::Runtime(_) | Self::NoListeners => None,
            Self::ListenerPanicked(..) => Some("This is a bug, please report it with the logs"),
        }
    }

    /// Structured fields for the failure log line.
    pub fn context(&self) -> Vec<(&'static str, String)> {
        let mut context = vec![
            ("error_code", self.error_code().to_owned()),
            ("recoverable", self.is_recoverable().to_string()),
        ];

        match self {
            Self::BindError { address, source } => {
                context.push(("address", address.clone()));
                context.push(("io_error_kind", format!("{:?}", source.kind())));
            }
            Self::Runtime(err) => context.push(("io_error_kind", format!("{:?}", err.kind()))),
            Self::ListenerPanicked(transport, _) => {
                context.push(("transport", transport.to_string()));
            }
            Self::InvalidConfig(_) | Self::NoListeners => {}
        }

        context
    }
}
