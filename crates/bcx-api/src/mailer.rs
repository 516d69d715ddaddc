use anyhow::{Context, Result, bail};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// SMTP connection settings, collected by the server's `Config`.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Outbound mail. Built once at startup; when SMTP is not configured the
/// mailer exists but every send fails, which surfaces to callers as a
/// server error.
pub struct Mailer {
    inner: Option<SmtpMailer>,
}

struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    pub fn from_config(config: Option<&SmtpConfig>) -> Result<Self> {
        let Some(config) = config else {
            return Ok(Self { inner: None });
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        info!("SMTP mailer ready ({}:{})", config.host, config.port);
        Ok(Self {
            inner: Some(SmtpMailer {
                transport,
                from: config.from.clone(),
            }),
        })
    }

    pub async fn send_otp(&self, to: &str, code: &str) -> Result<()> {
        let Some(mailer) = &self.inner else {
            bail!("SMTP is not configured");
        };

        let html = format!(
            "<div style=\"font-family:Arial,sans-serif\">\
               <h2>Password reset code</h2>\
               <p>Your verification code is: <b style=\"font-size:20px\">{code}</b></p>\
               <p>The code is valid for 10 minutes.</p>\
             </div>"
        );

        let message = Message::builder()
            .from(mailer.from.parse().context("invalid From address")?)
            .to(to.parse().context("invalid recipient address")?)
            .subject("Password reset code")
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        mailer.transport.send(message).await?;
        Ok(())
    }
}
