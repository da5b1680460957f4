//! Templated email dispatch with a per-message delivery log.
//!
//! Every attempt writes an `email_log` row in `sending` state first and
//! moves it to `sent` or `failed` afterwards. Delivery failures are reported
//! in the returned [`DeliveryReport`]. Store errors before the attempt
//! propagate; once the transport has answered, its outcome is what gets
//! reported and a failed log update is only logged.

pub mod templates;
pub mod transport;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use common::metrics::{EMAILS_FAILED_TOTAL, EMAILS_SENT_TOTAL};
use configs::MailConfig;
use models::email_log::{self, EmailStatus};
use models::{customer, fields};

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Paginated, Pagination};
use crate::related;

pub use templates::{render_template, EmailTemplate, TemplateCatalog};
pub use transport::{HttpRelayTransport, MailTransport, OutgoingMail, TransportError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmail {
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub template: Option<String>,
    pub template_data: Option<Map<String, Value>>,
}

/// Message shared by every recipient of a bulk send.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEmail {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub template: Option<String>,
    pub template_data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub log_id: Uuid,
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientResult {
    pub customer_id: Uuid,
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub results: Vec<RecipientResult>,
    /// Customers found with an email address.
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailLogRow {
    #[serde(flatten)]
    pub log: email_log::Model,
    pub customer: Option<CustomerContact>,
}

fn clean_addresses(raw: &[String]) -> Vec<String> {
    raw.iter().filter_map(|a| fields::optional_text(Some(a.as_str()))).collect()
}

#[derive(Clone)]
pub struct EmailService {
    catalog: Arc<TemplateCatalog>,
    transport: Option<Arc<dyn MailTransport>>,
    from: String,
}

impl EmailService {
    /// Without a transport every delivery is simulated.
    pub fn new(catalog: Arc<TemplateCatalog>, transport: Option<Arc<dyn MailTransport>>, from: impl Into<String>) -> Self {
        Self { catalog, transport, from: from.into() }
    }

    pub fn from_config(cfg: &MailConfig) -> Result<Self, TransportError> {
        let transport = HttpRelayTransport::from_config(cfg)?.map(|t| Arc::new(t) as Arc<dyn MailTransport>);
        if transport.is_none() {
            warn!("no mail relay configured; email delivery is simulated");
        }
        Ok(Self::new(Arc::new(TemplateCatalog::from_config(cfg)), transport, cfg.from.clone()))
    }

    pub fn templates(&self) -> &[EmailTemplate] { self.catalog.all() }

    pub fn template(&self, id: &str) -> Option<&EmailTemplate> { self.catalog.get(id) }

    /// Subject and body, rendered from the template when it resolves.
    fn compose(
        &self,
        subject: Option<&str>,
        body: Option<&str>,
        template: Option<&str>,
        data: &Map<String, Value>,
    ) -> Result<(String, String), ServiceError> {
        if let Some(t) = template.and_then(|id| self.catalog.get(id.trim())) {
            return Ok((render_template(&t.subject, data), render_template(&t.body, data)));
        }
        let subject = fields::optional_text(subject).ok_or_else(|| ServiceError::validation("subject is required"))?;
        Ok((subject, body.unwrap_or_default().to_string()))
    }

    pub async fn send_email(&self, db: &DatabaseConnection, req: SendEmail) -> Result<DeliveryReport, ServiceError> {
        let to = clean_addresses(&req.to);
        if to.is_empty() {
            return Err(ServiceError::validation("to must contain at least one address"));
        }
        let cc = clean_addresses(&req.cc);
        let data = req.template_data.unwrap_or_default();
        let (subject, body) = self.compose(req.subject.as_deref(), req.body.as_deref(), req.template.as_deref(), &data)?;
        self.deliver(db, &to, &cc, &subject, &body, None).await
    }

    async fn deliver(
        &self,
        db: &DatabaseConnection,
        to: &[String],
        cc: &[String],
        subject: &str,
        body: &str,
        customer_id: Option<Uuid>,
    ) -> Result<DeliveryReport, ServiceError> {
        let log = email_log::sending(to, cc, subject, body, customer_id).insert(db).await?;
        let log_id = log.id;

        let outcome = match &self.transport {
            Some(t) => t.send(&OutgoingMail::new(&self.from, to, cc, subject, body)).await.map_err(|e| e.to_string()),
            None => {
                info!(to = %to.join(", "), subject = %subject, body_len = body.len(), "simulated email delivery");
                Ok(format!("simulated-{}", Utc::now().timestamp_millis()))
            }
        };

        let mut am: email_log::ActiveModel = log.into();
        am.updated_at = Set(fields::now());
        let report = match outcome {
            Ok(message_id) => {
                am.status = Set(EmailStatus::Sent);
                am.message_id = Set(Some(message_id.clone()));
                EMAILS_SENT_TOTAL.inc();
                info!(log_id = %log_id, message_id = %message_id, "email sent");
                DeliveryReport { log_id, success: true, message_id: Some(message_id), error: None }
            }
            Err(error) => {
                am.status = Set(EmailStatus::Failed);
                am.error = Set(Some(error.clone()));
                EMAILS_FAILED_TOTAL.inc();
                warn!(log_id = %log_id, error = %error, "email delivery failed");
                DeliveryReport { log_id, success: false, message_id: None, error: Some(error) }
            }
        };
        if let Err(e) = am.update(db).await {
            error!(
                log_id = %log_id,
                delivered = report.success,
                message_id = ?report.message_id,
                error = %e,
                "email log update failed after delivery attempt"
            );
        }
        Ok(report)
    }

    /// One send per customer with an email address; `customerName` is set per recipient.
    /// A failing recipient is recorded in its result and the loop carries on.
    pub async fn send_to_many(
        &self,
        db: &DatabaseConnection,
        customers: &[customer::Model],
        req: &BulkEmail,
    ) -> Result<Vec<RecipientResult>, ServiceError> {
        let base = req.template_data.clone().unwrap_or_default();
        // Surface a missing subject once instead of once per recipient.
        self.compose(req.subject.as_deref(), req.body.as_deref(), req.template.as_deref(), &base)?;

        let mut results = Vec::new();
        for c in customers {
            let Some(email) = fields::optional_text(c.email.as_deref()) else { continue };
            let mut data = base.clone();
            data.insert("customerName".to_string(), Value::String(c.name.clone()));
            let sent = match self.compose(req.subject.as_deref(), req.body.as_deref(), req.template.as_deref(), &data) {
                Ok((subject, body)) => self.deliver(db, &[email.clone()], &[], &subject, &body, Some(c.id)).await,
                Err(e) => Err(e),
            };
            let result = match sent {
                Ok(r) => RecipientResult {
                    customer_id: c.id,
                    email,
                    success: r.success,
                    message_id: r.message_id,
                    error: r.error,
                },
                Err(e) => {
                    warn!(customer_id = %c.id, error = %e, "bulk email recipient failed");
                    RecipientResult { customer_id: c.id, email, success: false, message_id: None, error: Some(e.to_string()) }
                }
            };
            results.push(result);
        }
        Ok(results)
    }

    /// Resolve customer ids, keep those with an email, and send to each.
    pub async fn send_to_customers(
        &self,
        db: &DatabaseConnection,
        customer_ids: &[Uuid],
        req: &BulkEmail,
    ) -> Result<BulkOutcome, ServiceError> {
        if customer_ids.is_empty() {
            return Err(ServiceError::validation("customerIds must contain at least one id"));
        }
        let customers: Vec<customer::Model> = customer::Entity::find()
            .filter(customer::Column::Id.is_in(customer_ids.iter().copied()))
            .filter(customer::Column::Email.is_not_null())
            .order_by_asc(customer::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .filter(|c| fields::optional_text(c.email.as_deref()).is_some())
            .collect();
        if customers.is_empty() {
            return Err(ServiceError::validation("no customer with an email address found"));
        }

        let results = self.send_to_many(db, &customers, req).await?;
        let sent = results.iter().filter(|r| r.success).count();
        info!(recipients = customers.len(), sent, "bulk email finished");
        Ok(BulkOutcome { total: customers.len(), sent, failed: results.len() - sent, results })
    }
}

/// Send log, newest first, with the linked customer's name and email.
pub async fn list_email_logs(db: &DatabaseConnection, page: Pagination) -> Result<Paginated<EmailLogRow>, ServiceError> {
    let select = email_log::Entity::find()
        .order_by_desc(email_log::Column::CreatedAt)
        .order_by_desc(email_log::Column::Id);
    let page = fetch_page(db, select, page).await?;
    let customers = related::customers_by_id(db, page.data.iter().map(|l| l.customer_id)).await?;
    Ok(page.map(|log| EmailLogRow {
        customer: log
            .customer_id
            .and_then(|id| customers.get(&id))
            .map(|c| CustomerContact { name: c.name.clone(), email: c.email.clone() }),
        log,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer_service::create_customer;
    use crate::test_support::get_db;
    use models::customer::NewCustomer;
    use serde_json::json;
    use transport::MockMailTransport;

    fn simulated() -> EmailService {
        EmailService::new(Arc::new(TemplateCatalog::builtin()), None, "crm@example.com")
    }

    fn with_transport(t: MockMailTransport) -> EmailService {
        EmailService::new(Arc::new(TemplateCatalog::builtin()), Some(Arc::new(t)), "crm@example.com")
    }

    async fn customer(db: &DatabaseConnection, name: &str, email: Option<&str>) -> Result<customer::Model, anyhow::Error> {
        Ok(create_customer(db, NewCustomer { name: name.into(), email: email.map(Into::into), ..Default::default() })
            .await?)
    }

    #[tokio::test]
    async fn simulated_send_is_logged_as_sent() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let svc = simulated();
        let report = svc
            .send_email(
                &db,
                SendEmail {
                    to: vec!["sam@example.com".into()],
                    subject: Some("ignored".into()),
                    template: Some("greeting".into()),
                    template_data: json!({"customerName": "Sam"}).as_object().cloned(),
                    ..Default::default()
                },
            )
            .await?;
        assert!(report.success);
        assert!(report.message_id.as_deref().is_some_and(|id| id.starts_with("simulated-")));

        let log = email_log::Entity::find_by_id(report.log_id).one(&db).await?.expect("log row");
        assert_eq!(log.status, EmailStatus::Sent);
        assert_eq!(log.subject, "Welcome to SaleManager, Sam!");
        assert_eq!(log.to, "sam@example.com");
        assert_eq!(log.message_id, report.message_id);
        Ok(())
    }

    #[tokio::test]
    async fn send_requires_recipient_and_subject() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let svc = simulated();
        let no_to = SendEmail { to: vec!["  ".into()], subject: Some("s".into()), ..Default::default() };
        assert!(matches!(svc.send_email(&db, no_to).await, Err(ServiceError::Validation(_))));
        let no_subject = SendEmail { to: vec!["a@example.com".into()], ..Default::default() };
        assert!(matches!(svc.send_email(&db, no_subject).await, Err(ServiceError::Validation(_))));
        assert!(email_log::Entity::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_is_reported_and_logged() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let mut mock = MockMailTransport::new();
        mock.expect_send()
            .times(1)
            .returning(|_| Err(TransportError::Rejected { status: 503, body: "down".into() }));
        let svc = with_transport(mock);

        let report = svc
            .send_email(
                &db,
                SendEmail {
                    to: vec!["a@example.com".into()],
                    cc: vec!["b@example.com".into()],
                    subject: Some("Hello".into()),
                    body: Some("Body".into()),
                    ..Default::default()
                },
            )
            .await?;
        assert!(!report.success);
        assert!(report.error.as_deref().is_some_and(|e| e.contains("503")));

        let log = email_log::Entity::find_by_id(report.log_id).one(&db).await?.expect("log row");
        assert_eq!(log.status, EmailStatus::Failed);
        assert_eq!(log.cc.as_deref(), Some("b@example.com"));
        assert!(log.error.is_some());
        assert!(log.message_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn send_to_many_skips_customers_without_email() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let with = customer(&db, "Ann", Some("ann@example.com")).await?;
        let without = customer(&db, "Ben", None).await?;

        let results = simulated()
            .send_to_many(
                &db,
                &[with.clone(), without],
                &BulkEmail { template: Some("greeting".into()), ..Default::default() },
            )
            .await?;
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(results[0].customer_id, with.id);

        let logs = email_log::Entity::find().all(&db).await?;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].customer_id, Some(with.id));
        assert_eq!(logs[0].subject, "Welcome to SaleManager, Ann!");
        Ok(())
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_stop_the_batch() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let a = customer(&db, "Ann", Some("ann@example.com")).await?;
        let b = customer(&db, "Bob", Some("bob@example.com")).await?;

        let mut mock = MockMailTransport::new();
        mock.expect_send().times(2).returning(|mail| {
            if mail.to[0].starts_with("ann") {
                Err(TransportError::MissingMessageId)
            } else {
                Ok("relay-1".to_string())
            }
        });
        let outcome = with_transport(mock)
            .send_to_customers(
                &db,
                &[a.id, b.id],
                &BulkEmail {
                    subject: Some("Hi".into()),
                    template_data: json!({"customerName": "overridden"}).as_object().cloned(),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.sent, 1);
        assert_eq!(outcome.failed, 1);
        let ann = outcome.results.iter().find(|r| r.customer_id == a.id).expect("ann");
        assert!(!ann.success);
        let bob = outcome.results.iter().find(|r| r.customer_id == b.id).expect("bob");
        assert_eq!(bob.message_id.as_deref(), Some("relay-1"));
        Ok(())
    }

    #[tokio::test]
    async fn bulk_send_needs_a_reachable_customer() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let ben = customer(&db, "Ben", None).await?;
        let svc = simulated();
        let res = svc.send_to_customers(&db, &[ben.id], &BulkEmail { subject: Some("s".into()), ..Default::default() }).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn logs_embed_customer_contact() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let ann = customer(&db, "Ann", Some("ann@example.com")).await?;
        let svc = simulated();
        svc.send_to_many(&db, &[ann], &BulkEmail { subject: Some("One".into()), ..Default::default() }).await?;
        svc.send_email(
            &db,
            SendEmail { to: vec!["x@example.com".into()], subject: Some("Two".into()), ..Default::default() },
        )
        .await?;

        let page = list_email_logs(&db, Pagination::default()).await?;
        assert_eq!(page.pagination.total, 2);
        let linked = page.data.iter().find(|r| r.log.subject == "One").expect("linked log");
        assert_eq!(linked.customer.as_ref().map(|c| c.name.as_str()), Some("Ann"));
        let unlinked = page.data.iter().find(|r| r.log.subject == "Two").expect("unlinked log");
        assert!(unlinked.customer.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delivered_mail_stays_successful_when_log_update_fails() -> Result<(), anyhow::Error> {
        use sea_orm::ConnectionTrait;

        let db = get_db().await?;
        let ann = customer(&db, "Ann", Some("ann@example.com")).await?;
        db.execute_unprepared(
            "CREATE TRIGGER email_log_frozen BEFORE UPDATE ON email_log \
             BEGIN SELECT RAISE(ABORT, 'email_log is read-only'); END;",
        )
        .await?;

        let results = simulated()
            .send_to_many(&db, &[ann], &BulkEmail { subject: Some("Hi".into()), ..Default::default() })
            .await?;
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert!(results[0].message_id.as_deref().is_some_and(|id| id.starts_with("simulated-")));
        assert!(results[0].error.is_none());

        // the row could not leave its initial state
        let log = email_log::Entity::find().one(&db).await?.expect("log row");
        assert_eq!(log.status, EmailStatus::Sending);
        Ok(())
    }
}
