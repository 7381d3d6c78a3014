//! # Recetario Scheduler
//!
//! Bulk reminder dispatch. The trigger itself is external (a cron job hitting
//! the gateway, or `recetario remind` from a crontab); this crate only does
//! the work once triggered.
//!
//! ```text
//! trigger → select_recipients(label) → SequentialRunner
//!                                        ├── send #1 → pause
//!                                        ├── send #2 → pause
//!                                        └── send #n
//!                                      → DispatchSummary { total, sent, errors }
//! ```

pub mod dispatch;
pub mod runner;

pub use dispatch::{DispatchSummary, dispatch_reminders, select_recipients};
pub use runner::{RunSummary, SequentialRunner};
