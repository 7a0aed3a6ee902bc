use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_sdk_sesv2::{
    config::Region,
    types::{Body, Content, Destination, EmailContent, Message},
    Client,
};
use tracing::info;

use crate::config::{MailConfig, MailDriver};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation_mail(&self, to: &str, link: &str) -> anyhow::Result<()>;
}

pub const ACTIVATION_SUBJECT: &str = "Activate your account";

pub fn activation_html(link: &str) -> String {
    format!(
        "<div>\
           <h1>Confirm your email</h1>\
           <p>Follow the link below to activate your account:</p>\
           <a href=\"{link}\">{link}</a>\
         </div>"
    )
}

/// Writes the link to the log instead of sending anything.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_activation_mail(&self, to: &str, link: &str) -> anyhow::Result<()> {
        info!(to = %to, link = %link, "activation mail (log driver)");
        Ok(())
    }
}

#[derive(Clone)]
pub struct SesMailer {
    client: Client,
    from: String,
}

impl SesMailer {
    pub async fn new(region: &str, from: &str) -> Self {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: Client::new(&shared),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send_activation_mail(&self, to: &str, link: &str) -> anyhow::Result<()> {
        let subject = Content::builder()
            .data(ACTIVATION_SUBJECT)
            .charset("UTF-8")
            .build()
            .context("build mail subject")?;
        let html = Content::builder()
            .data(activation_html(link))
            .charset("UTF-8")
            .build()
            .context("build mail body")?;
        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().html(html).build())
            .build();

        self.client
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .context("ses send_email")?;

        info!(to = %to, "activation mail sent");
        Ok(())
    }
}

pub async fn from_config(cfg: &MailConfig) -> Arc<dyn Mailer> {
    match cfg.driver {
        MailDriver::Log => Arc::new(LogMailer),
        MailDriver::Ses => Arc::new(SesMailer::new(&cfg.region, &cfg.from).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_html_links_twice() {
        let html = activation_html("http://api.local/api/activate/abc");
        assert_eq!(html.matches("http://api.local/api/activate/abc").count(), 2);
    }

    #[tokio::test]
    async fn log_mailer_never_fails() {
        LogMailer
            .send_activation_mail("a@b.io", "http://x/api/activate/1")
            .await
            .unwrap();
    }
}
