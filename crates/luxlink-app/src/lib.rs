//! Pure state machines for the luxlink console.
//!
//! Everything in this crate is I/O-free and synchronous: buffers, connection
//! and backoff state, the controllers' state structs, the toolbar, command
//! parsing, and table layout. The terminal runtime owns the event loop and
//! network tasks and drives these types with plain method calls, which keeps
//! every behavior here testable without a bridge or a terminal.

#![forbid(unsafe_code)]

pub mod buffer;
pub mod command;
pub mod events;
pub mod format;
pub mod mode;
pub mod shell;
pub mod stream;
pub mod table;
pub mod tail;
pub mod toolbar;
pub mod view;
pub mod watch;

pub use buffer::OutputBuffer;
pub use command::{Command, CommandError};
pub use events::{EventKindFilter, EventsState};
pub use format::LogLevel;
pub use mode::ShellMode;
pub use shell::{KeyInput, ModeAction, ShellState};
pub use stream::{BATCH_INTERVAL, Backoff, ConnectionState, MAX_STREAM_BUFFER_CHARS, PendingLines};
pub use tail::LogTailState;
pub use toolbar::ToolbarStatus;
pub use view::{FetchData, FetchQuery, LogViewState};
pub use watch::{WatchState, WatchTarget};
