//! # Blotter Engine
//!
//! The live market engine for Blotter.
//!
//! This crate provides:
//! - [`MarketEngine`]: owns the drift process and publishes portfolio snapshots
//! - [`MarketState`]: the shared, atomically replaced current snapshot
//! - [`UpdateScheduler`]: periodic ticking with cooperative cancellation
//! - [`SubscriberRegistry`]: fan-out of each snapshot to streaming subscribers
//! - [`pnl`]: DV01-based P&L attribution
//!
//! ## Architecture
//!
//! ```text
//! UpdateScheduler ─> MarketEngine::tick ─┬─> DriftProcess (propose)
//!                                        ├─> Curve model ─> deltas
//!                                        ├─> P&L engine ─> snapshot
//!                                        └─> MarketState::publish ─> SubscriberRegistry::notify
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let engine = Arc::new(
//!     MarketEngineBuilder::new()
//!         .with_config(config)
//!         .with_positions(positions)
//!         .build()?,
//! );
//!
//! let scheduler = UpdateScheduler::new(engine.clone());
//! scheduler.start();
//!
//! let mut updates = engine.subscribe();
//! while let Some(snapshot) = updates.recv().await {
//!     println!("{} {:.2}", snapshot.sequence, snapshot.total_pnl);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod health;
pub mod pnl;
pub mod scheduler;
pub mod state;

// Re-exports
pub use builder::MarketEngineBuilder;
pub use config::EngineConfig;
pub use engine::{MarketEngine, MarketSummary};
pub use error::EngineError;
pub use fanout::{
    DeliveryError, NotifyReport, SnapshotSink, SubscriberId, SubscriberRegistry, Subscription,
};
pub use health::EngineHealth;
pub use pnl::{aggregate_pnl, compute_pnl, position_pnl, summarize};
pub use scheduler::{run_tick, SchedulerState, UpdateScheduler};
pub use state::MarketState;
