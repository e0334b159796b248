//! Flashback - continuous capture with instant replay
//!
//! The library is an in-process engine that keeps the most recent N seconds
//! of a live media stream as small opaque fragments, groups them into
//! recording sessions, and lets a user jump back through that window (or to
//! bookmarked instants) while new fragments keep arriving.
//!
//! # Architecture
//!
//! - `buffer`: fragment queue, duration accounting and the global pre-roll partition
//! - `session`: session aggregation, bounds, cumulative offsets and replay assembly
//! - `window`: the visible absolute-time window
//! - `navigation`: time resolution, step sizing and markers
//! - `playback`: state machine, epochs, timers and end-of-session detection
//! - `engine`: the `FlashbackEngine` facade driven by capture/replay collaborators
//! - `player`: interactive terminal front-end with simulated collaborators
//!
//! # Usage
//!
//! ```no_run
//! use flashback::engine::{FlashbackEngine, NullCapture, NullReplay};
//! use flashback::buffer::FragmentInput;
//! use flashback::clock::SystemClock;
//! use flashback::Config;
//!
//! let mut engine = FlashbackEngine::new(
//!     Config::default(),
//!     Box::new(SystemClock::new()),
//!     Box::new(NullCapture::default()),
//!     Box::new(NullReplay),
//! );
//! engine.start()?;
//! engine.ingest(FragmentInput::new(vec![0u8; 512], 1.0));
//! println!("window: {:?}", engine.visible_window());
//! # Ok::<(), flashback::FlashbackError>(())
//! ```

pub mod buffer;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod playback;
pub mod player;
pub mod session;
pub mod theme;
pub mod window;

pub use config::Config;
pub use engine::FlashbackEngine;
pub use error::FlashbackError;
pub use playback::PlaybackState;
pub use window::VisibleWindow;
