#![allow(async_fn_in_trait)]

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use super::db_types::Role;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail relay unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("mail relay refused the message with status {0}")]
    Rejected(u16),
}

/// Delivers password reset links. Auth hands over the pieces, the mailer owns the wording.
pub trait Mailer {
    async fn send_password_reset(
        &self,
        destination: &str,
        role: Role,
        reset_key: &str,
    ) -> Result<(), MailError>;
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailNewProps {
    pub request_id: i64,
    pub destination: String,
    pub topic: String,
    pub title: String,
    pub content: String,
}

// a relay that never answers must not stall the request
pub const MAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the HTTP mail relay.
#[derive(Clone)]
pub struct MailService {
    client: Client,
    mail_service_url: String,
    site_external_url: String,
}

impl MailService {
    pub fn new(mail_service_url: &str, site_external_url: &str) -> Result<Self, reqwest::Error> {
        Self::with_timeout(mail_service_url, site_external_url, MAIL_TIMEOUT)
    }

    pub fn with_timeout(
        mail_service_url: &str,
        site_external_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(MailService {
            client: Client::builder().timeout(timeout).build()?,
            mail_service_url: mail_service_url.trim_end_matches('/').to_owned(),
            site_external_url: site_external_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn reset_link(&self, role: Role, reset_key: &str) -> String {
        format!(
            "{}/{}/reset-password/{}",
            self.site_external_url, role, reset_key
        )
    }

    pub async fn mail_new(&self, props: MailNewProps) -> Result<(), MailError> {
        let resp = self
            .client
            .post(format!("{}/mail/new", self.mail_service_url))
            .json(&props)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(MailError::Rejected(resp.status().as_u16()));
        }

        Ok(())
    }
}

impl Mailer for MailService {
    async fn send_password_reset(
        &self,
        destination: &str,
        role: Role,
        reset_key: &str,
    ) -> Result<(), MailError> {
        self.mail_new(MailNewProps {
            request_id: 0,
            destination: destination.to_owned(),
            topic: "password_reset".to_owned(),
            title: format!("{}: Password Reset", &self.site_external_url),
            content: [
                "<p>Requested password reset service: </p>",
                "<p>If you did not make this request, then feel free to ignore.</p>",
                "<p>This link is valid for up to 10 minutes.</p>",
                "<p>Do not share this link with others.</p>",
                &format!(
                    "<p>Password change link: {}</p>",
                    self.reset_link(role, reset_key)
                ),
            ]
            .join(""),
        })
        .await
    }
}

#[cfg(test)]
pub use recording::RecordingMailer;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_points_at_role_page() {
        let ms = MailService::new("http://mail.local/", "https://college.example/").unwrap();
        assert_eq!(
            ms.reset_link(Role::Faculty, "abc"),
            "https://college.example/faculty/reset-password/abc"
        );
    }

    #[tokio::test]
    async fn silent_relay_times_out() {
        // accepts connections through the backlog but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let ms = MailService::with_timeout(&url, "https://college.example", Duration::from_millis(200))
            .unwrap();

        let result = ms
            .send_password_reset("a@b.com", Role::Student, "abc")
            .await;

        match result {
            Err(MailError::Network(e)) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {:?}", other),
        }
        drop(listener);
    }
}
