pub mod traits;

pub mod dispatcher;
pub mod email;
pub mod telegram;

pub use dispatcher::{AlertDispatcher, DeliveryReport};
pub use traits::{NotifyResult, Notifier};

/// Escapes the characters Telegram's HTML mode and `<pre>` blocks reserve.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
