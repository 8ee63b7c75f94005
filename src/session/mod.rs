//! Session layer - time, pauses and the opponent around a [`GameSession`]
//!
//! # Architecture Overview
//!
//! ```text
//!  CLI / presentation
//!        │  SessionHandle (mpsc + oneshot)        watch<SessionView>
//!        ▼                                              ▲
//!  ┌──────────────── session actor (tokio task) ────────┴──┐
//!  │  SessionController                                    │
//!  │    ├── GameSession (battler_engine)                   │
//!  │    ├── PreparationCountdown                           │
//!  │    ├── PauseCounter                                   │
//!  │    └── opponent delay + generation stamp              │
//!  │  interval ticks ──► advance()                         │
//!  │  SuggestionRequested ──► spawned advisor call ──┐     │
//!  │  apply_suggestion() ◄── results channel ◄───────┘     │
//!  └───────────────────────────────────────────────────────┘
//! ```
//!
//! - [`controller`] - synchronous, clock-free rules for timers and opponent turns
//! - [`runtime`] - the tokio actor that owns a controller
//! - [`countdown`] / [`pause`] - the two timer building blocks
//!
//! [`GameSession`]: battler_engine::GameSession

pub mod controller;
pub mod countdown;
pub mod pause;
pub mod runtime;

pub use controller::{
    SessionConfig, SessionController, SessionEvent, SessionView, SuggestionOutcome,
    SuggestionRequest,
};
pub use countdown::{CountdownStep, PreparationCountdown};
pub use pause::PauseCounter;
pub use runtime::{SessionCommand, SessionHandle};
