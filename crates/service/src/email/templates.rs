use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};

use configs::{MailConfig, TemplateConfig};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailTemplate {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    /// Placeholder names in order of first appearance across subject then body.
    pub variables: Vec<String>,
}

impl EmailTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        let subject = subject.into();
        let body = body.into();
        let mut variables: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&subject).chain(PLACEHOLDER.captures_iter(&body)) {
            let name = &caps[1];
            if !variables.iter().any(|v| v == name) {
                variables.push(name.to_string());
            }
        }
        Self { id: id.into(), name: name.into(), subject, body, variables }
    }
}

impl From<&TemplateConfig> for EmailTemplate {
    fn from(t: &TemplateConfig) -> Self { Self::new(&t.id, &t.name, &t.subject, &t.body) }
}

/// Replace `{{key}}` with `data[key]`. Missing keys and `null` leave the placeholder as is.
pub fn render_template(pattern: &str, data: &Map<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(pattern, |caps: &Captures| match data.get(&caps[1]) {
            None | Some(Value::Null) => caps[0].to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        })
        .into_owned()
}

/// Read-only template set, built once at startup.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<EmailTemplate>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<EmailTemplate>) -> Self { Self { templates } }

    pub fn builtin() -> Self {
        Self::new(vec![
            EmailTemplate::new(
                "greeting",
                "Welcome",
                "Welcome to SaleManager, {{customerName}}!",
                "Hello {{customerName}},\n\n\
                 Thank you for choosing SaleManager.\n\n\
                 We look forward to helping your team manage its sales more effectively.\n\
                 If you need anything at all, just reply to this email.\n\n\
                 Best regards,\nThe SaleManager team",
            ),
            EmailTemplate::new(
                "promotion",
                "Promotion",
                "Special offer on {{productName}}",
                "Hello {{customerName}},\n\n\
                 We have a special promotion on {{productName}} for you.\n\n\
                 Offer details:\n{{promotionDetails}}\n\n\
                 Don't miss out!\n\n\
                 Best regards,\nThe SaleManager team",
            ),
            EmailTemplate::new(
                "follow_up",
                "Follow-up",
                "Following up: {{subject}}",
                "Hello {{customerName}},\n\n\
                 We are following up on your recent enquiry.\n\n\
                 {{message}}\n\n\
                 Please get in touch if you have any questions.\n\n\
                 Best regards,\n{{senderName}}",
            ),
            EmailTemplate::new(
                "newsletter",
                "Newsletter",
                "SaleManager newsletter - {{month}} edition",
                "Hello {{customerName}},\n\n\
                 Here is the SaleManager newsletter for {{month}}.\n\n\
                 {{content}}\n\n\
                 Best regards,\nThe SaleManager team",
            ),
        ])
    }

    /// Configured templates when any are given, the built-in set otherwise.
    pub fn from_config(cfg: &MailConfig) -> Self {
        if cfg.templates.is_empty() {
            Self::builtin()
        } else {
            Self::new(cfg.templates.iter().map(EmailTemplate::from).collect())
        }
    }

    pub fn all(&self) -> &[EmailTemplate] { &self.templates }

    pub fn get(&self, id: &str) -> Option<&EmailTemplate> { self.templates.iter().find(|t| t.id == id) }
}
