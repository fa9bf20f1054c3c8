//! Twilio WhatsApp sandbox: the reply travels back as TwiML.

use serde::Deserialize;

use crate::message::InboundMessage;

/// Content type for TwiML responses.
pub const TWIML_CONTENT_TYPE: &str = "application/xml";

/// Form fields Twilio posts for an inbound WhatsApp message.
#[derive(Debug, Default, Deserialize)]
pub struct TwilioWebhookForm {
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "From", default)]
    pub from: String,
}

impl TwilioWebhookForm {
    pub fn into_message(self) -> InboundMessage {
        InboundMessage::text(self.from, &self.body)
    }
}

/// Render a messaging response with a single message element.
pub fn render_twiml(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message><Body>{}</Body></Message></Response>",
        html_escape::encode_text(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twiml_wraps_single_message() {
        assert_eq!(
            render_twiml("Hello"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message><Body>Hello</Body></Message></Response>"
        );
    }

    #[test]
    fn twiml_escapes_markup() {
        let xml = render_twiml("Rs. <600,000> & up");
        assert!(xml.contains("<Body>Rs. &lt;600,000&gt; &amp; up</Body>"));
    }

    #[test]
    fn twiml_keeps_unicode() {
        let xml = render_twiml("خوش آمدید 🇵🇰");
        assert!(xml.contains("خوش آمدید 🇵🇰"));
    }

    #[test]
    fn form_becomes_trimmed_message() {
        let form = TwilioWebhookForm {
            body: "  hi  ".into(),
            from: "whatsapp:+923001234567".into(),
        };
        let msg = form.into_message();
        assert_eq!(msg.sender, "whatsapp:+923001234567");
        assert_eq!(msg.as_text(), Some("hi"));
    }
}
