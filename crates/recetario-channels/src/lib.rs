//! # Recetario Channels
//! Outbound email: provider transports and the reminder message they carry.

pub mod email;
pub mod reminder;

pub use email::{ResendSender, SmtpSender, build_sender};
pub use reminder::{Cadence, ReminderMailer, render_reminder};
