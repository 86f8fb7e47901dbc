//! # parlor-core
//!
//! Presence lifecycle and message visibility engine for the Parlor chat
//! backend.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **Presence** - Participant registration, heartbeats, and listing
//! - **Router** - Message creation, sender checks, and visibility filtering
//! - **Sweeper** - Periodic eviction of inactive participants
//! - **Clock** - Injectable time source
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │  Presence   │────▶│   Router    │
//! └─────────────┘     └─────────────┘
//!        │                   ▲    │
//!        │            ┌──────┘    │
//!        │     ┌─────────────┐    │
//!        │     │   Sweeper   │    │
//!        │     └─────────────┘    │
//!        ▼            │           ▼
//! ┌─────────────────────────────────────┐
//! │                Store                │
//! └─────────────────────────────────────┘
//! ```
//!
//! Components hold no state of their own between calls; everything lives in
//! the injected `Store`.

pub mod clock;
pub mod error;
pub mod presence;
pub mod router;
pub mod service;
pub mod sweeper;

pub use clock::{format_time, Clock, ManualClock, SystemClock};
pub use error::ChatError;
pub use presence::PresenceManager;
pub use router::{parse_limit, MessageRouter};
pub use service::ChatService;
pub use sweeper::{ExpirationSweeper, SweepReport, SweeperConfig};
