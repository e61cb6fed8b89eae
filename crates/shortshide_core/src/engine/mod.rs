//! Event-driven control: observation loop plus preference sync.
//!
//! # Responsibility
//! - Own the single `SyncState` and gate sweeps on its decision.
//! - Consume host stimuli as explicit `EngineEvent` values.
//!
//! # Invariants
//! - Single-threaded; handlers run to completion one at a time.
//! - Handlers only sweep, restore, or update the document flag.

pub mod event;
pub mod observer;
pub mod sync;

pub use event::{EngineEvent, NavigationSignal, RuntimeMessage};
pub use observer::{ContentEngine, DispatchReport, EventLoop, LoopPhase, DOCUMENT_FLAG_OFF};
pub use sync::{SyncState, Transition};
