//! Reminder emails: per-cadence copy and HTML rendering, plus the mailer
//! that sends one reminder to one recipient.

use recetario_core::config::{EmailConfig, RemindersConfig};
use recetario_core::error::{RecetarioError, Result};
use recetario_core::traits::EmailSender;
use recetario_core::types::OutgoingEmail;
use std::sync::Arc;

/// Reminder cadence, resolved from a free-text frequency label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Bimonthly,
    /// Any label not in the table.
    Generic,
}

impl Cadence {
    /// Resolve a label (English or Spanish, any case). Unknown labels map to
    /// `Generic`, never to an error.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "daily" | "diario" | "diaria" => Cadence::Daily,
            "weekly" | "semanal" => Cadence::Weekly,
            "biweekly" | "quincenal" => Cadence::Biweekly,
            "monthly" | "mensual" => Cadence::Monthly,
            "bimonthly" | "bimestral" => Cadence::Bimonthly,
            _ => Cadence::Generic,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Cadence::Daily => "¿Qué cocinaste hoy? 🍳",
            Cadence::Weekly => "Tu recordatorio semanal de recetas 📅",
            Cadence::Biweekly => "¡Pasaron dos semanas! ¿Alguna receta nueva? 🥘",
            Cadence::Monthly => "Tu recordatorio mensual de cocina 📖",
            Cadence::Bimonthly => "¿Qué cocinaste en estos dos meses? 🍲",
            Cadence::Generic => "¿Comiste algo delicioso hoy? 🍽️",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Cadence::Daily => "🍳",
            Cadence::Weekly => "📅",
            Cadence::Biweekly => "🥘",
            Cadence::Monthly => "📖",
            Cadence::Bimonthly => "🍲",
            Cadence::Generic => "👋",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Cadence::Daily => "¿Comiste algo distinto hoy?",
            Cadence::Weekly => "¿Qué platos nuevos probaste esta semana?",
            Cadence::Biweekly => "¿Qué cocinaste en las últimas dos semanas?",
            Cadence::Monthly => "¿Qué recetas descubriste este mes?",
            Cadence::Bimonthly => "¿Qué recetas nuevas sumaste estos dos meses?",
            Cadence::Generic => "¿Comiste algo distinto hoy?",
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the reminder for one recipient.
pub fn render_reminder(to: &str, name: &str, frequency: &str, app_url: &str) -> OutgoingEmail {
    let cadence = Cadence::from_label(frequency);
    let link = format!("{}/nueva-receta", app_url.trim_end_matches('/'));
    let name = escape_html(name.trim());
    let greeting = if name.is_empty() {
        format!("¡Hola! {}", cadence.emoji())
    } else {
        format!("¡Hola {name}! {}", cadence.emoji())
    };

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="color: #ea580c; text-align: center;">{greeting}</h2>
  <div style="background-color: #fff7ed; padding: 20px; border-radius: 10px; margin: 20px 0;">
    <h3 style="color: #9a3412; margin-top: 0;">{headline}</h3>
    <p style="color: #7c2d12; font-size: 16px; line-height: 1.6;">
      Registra tus comidas para armar tu recetario personal y nunca olvides esas recetas especiales que tanto te gustan.
    </p>
  </div>
  <div style="text-align: center; margin: 30px 0;">
    <a href="{link}" style="background-color: #ea580c; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; font-weight: bold;">Agregar Nueva Receta</a>
  </div>
  <p style="color: #78716c; font-size: 14px; text-align: center;">¡Cada receta cuenta una historia! 📖✨</p>
</div>"#,
        headline = cadence.headline(),
    );

    OutgoingEmail {
        to: to.trim().to_string(),
        subject: cadence.subject().to_string(),
        html,
    }
}

/// Sends single reminders through the configured transport.
///
/// The transport is resolved once at construction. A missing credential is
/// kept as a configuration error and returned by every send.
pub struct ReminderMailer {
    sender: std::result::Result<Arc<dyn EmailSender>, String>,
    app_url: String,
}

impl ReminderMailer {
    pub fn new(sender: Arc<dyn EmailSender>, app_url: impl Into<String>) -> Self {
        Self {
            sender: Ok(sender),
            app_url: app_url.into(),
        }
    }

    /// A mailer that fails every send with a configuration error.
    pub fn unconfigured(reason: impl Into<String>, app_url: impl Into<String>) -> Self {
        Self {
            sender: Err(reason.into()),
            app_url: app_url.into(),
        }
    }

    pub fn from_config(email: &EmailConfig, reminders: &RemindersConfig) -> Self {
        match crate::email::build_sender(email) {
            Ok(sender) => {
                tracing::info!("📧 Email transport ready ({})", sender.name());
                Self::new(sender, reminders.app_url.clone())
            }
            Err(e) => {
                tracing::warn!("⚠️ Email transport not available: {e}");
                let reason = match e {
                    RecetarioError::Config(msg) => msg,
                    other => other.to_string(),
                };
                Self::unconfigured(reason, reminders.app_url.clone())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.sender.is_ok()
    }

    /// Render and send one reminder. No retries.
    pub async fn send_reminder(&self, email: &str, name: &str, frequency: &str) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .map_err(|reason| RecetarioError::Config(reason.clone()))?;
        let message = render_reminder(email, name, frequency, &self.app_url);
        sender.send(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, email: &OutgoingEmail) -> Result<()> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[test]
    fn test_cadence_labels() {
        assert_eq!(Cadence::from_label("weekly"), Cadence::Weekly);
        assert_eq!(Cadence::from_label("Semanal"), Cadence::Weekly);
        assert_eq!(Cadence::from_label(" MENSUAL "), Cadence::Monthly);
        assert_eq!(Cadence::from_label("bimestral"), Cadence::Bimonthly);
        assert_eq!(Cadence::from_label("cada tanto"), Cadence::Generic);
        assert_eq!(Cadence::from_label(""), Cadence::Generic);
    }

    #[test]
    fn test_render_embeds_name_copy_and_link() {
        let email = render_reminder("ana@example.com", "Ana", "semanal", "https://recetas.dev/");
        assert_eq!(email.to, "ana@example.com");
        assert_eq!(email.subject, Cadence::Weekly.subject());
        assert!(email.html.contains("¡Hola Ana! 📅"));
        assert!(email.html.contains(Cadence::Weekly.headline()));
        assert!(email.html.contains(r#"href="https://recetas.dev/nueva-receta""#));
    }

    #[test]
    fn test_render_unknown_label_uses_generic_copy() {
        let email = render_reminder("a@b.c", "Ana", "whenever", "http://localhost:3000");
        assert_eq!(email.subject, "¿Comiste algo delicioso hoy? 🍽️");
        assert!(email.html.contains("http://localhost:3000/nueva-receta"));
    }

    #[test]
    fn test_render_escapes_name() {
        let email = render_reminder("a@b.c", "<b>Eve</b>", "daily", "http://localhost:3000");
        assert!(email.html.contains("&lt;b&gt;Eve&lt;/b&gt;"));
        assert!(!email.html.contains("<b>Eve</b>"));
    }

    #[tokio::test]
    async fn test_mailer_sends_rendered_message() {
        let sender = Arc::new(RecordingSender::default());
        let mailer = ReminderMailer::new(sender.clone(), "http://localhost:3000");
        mailer.send_reminder("ana@example.com", "Ana", "daily").await.unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, Cadence::Daily.subject());
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_reports_config_error() {
        let mailer = ReminderMailer::from_config(
            &EmailConfig::default(),
            &RemindersConfig::default(),
        );
        assert!(!mailer.is_configured());
        let err = mailer.send_reminder("a@b.c", "Ana", "weekly").await.unwrap_err();
        assert!(matches!(
            err,
            RecetarioError::Config(msg) if msg == "Email service not configured"
        ));
    }
}
