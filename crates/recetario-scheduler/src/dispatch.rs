//! Bulk reminder dispatch: select subscribers by cadence label, then send to
//! each of them through the sequential runner.

use recetario_channels::ReminderMailer;
use recetario_core::error::{RecetarioError, Result};
use recetario_core::traits::ReminderStore;
use recetario_core::types::Reminder;
use serde::Serialize;

use crate::runner::SequentialRunner;

/// Aggregate result of a bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub sent: usize,
    pub errors: usize,
}

/// Subscriptions whose frequency equals `label`, ignoring case only.
/// An unrecognised label simply matches nothing.
pub fn select_recipients(reminders: Vec<Reminder>, label: &str) -> Vec<Reminder> {
    let wanted = label.to_lowercase();
    reminders
        .into_iter()
        .filter(|r| r.frequency.to_lowercase() == wanted)
        .collect()
}

/// Send the `label` reminder to every matching subscriber.
///
/// Storage failures and a missing email credential abort the run before any
/// send. Individual send failures are counted and do not stop the loop.
pub async fn dispatch_reminders(
    store: &dyn ReminderStore,
    mailer: &ReminderMailer,
    runner: &SequentialRunner,
    label: &str,
) -> Result<DispatchSummary> {
    if !mailer.is_configured() {
        return Err(RecetarioError::Config("Email service not configured".into()));
    }

    let all = store.list_reminders()?;
    let recipients = select_recipients(all, label);
    let total = recipients.len();
    tracing::info!("📬 Bulk reminders '{label}': {total} recipient(s)");

    let run = runner
        .run(recipients, |r| async move {
            mailer
                .send_reminder(&r.email, &r.name, label)
                .await
                .map_err(|e| format!("{}: {e}", r.email))
        })
        .await;

    let summary = DispatchSummary {
        total,
        sent: run.succeeded,
        errors: run.failed,
    };
    tracing::info!(
        "✅ Bulk reminders '{label}' done: sent={}, errors={}, total={}",
        summary.sent,
        summary.errors,
        summary.total
    );
    Ok(summary)
}
