use sedekah_qr_common::{Notification, NotificationKind, Notifier};

/// Prints notifications as CLI status lines
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let line = render(&notification);
        match notification.kind {
            NotificationKind::Error | NotificationKind::Warning => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

fn render(n: &Notification) -> String {
    let icon = match n.kind {
        NotificationKind::Success => "✔",
        NotificationKind::Info => "ℹ",
        NotificationKind::Warning => "⚠",
        NotificationKind::Error => "✖",
    };
    let mut line = format!("{} {}", icon, n.message);
    if let Some(description) = &n.description {
        line.push_str(&format!("\n  {}", description));
    }
    if let Some(action) = &n.action {
        line.push_str(&format!("\n  → {}", action));
    }
    line
}
