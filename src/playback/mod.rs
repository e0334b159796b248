//! Playback control: the live/replay state machine and everything that
//! keeps asynchronous replay callbacks honest.
//!
//! - `state`: `PlaybackState` and the transition table
//! - `epoch`: generation counter that invalidates stale callbacks
//! - `scheduler`: epoch-tagged timer queue
//! - `replay`: the active replay and its end-of-session signals

mod epoch;
mod replay;
mod scheduler;
mod state;

pub use epoch::{Epoch, EpochCounter};
pub use replay::{ActiveReplay, EndSignal, ReplayEvent, ReplayEventKind, ReplayPhase};
pub use scheduler::{Timer, TimerId, TimerKind, TimerQueue};
pub use state::{next_state, Action, PlaybackState};
