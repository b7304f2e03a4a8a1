//! Call-request reporter.
//!
//! Drains the ticket queue and POSTs each ticket as a form body to the
//! ward's web service:
//!
//! ```text
//! POST http://<server>/<url>/web/webservices/llamadores_ws.php
//! auth_user=<user>&auth_pwd=<pass>&operation=<op>[&button=<btn>]
//! ```
//!
//! Delivery is best effort.  Failures are logged and the ticket is gone;
//! the arbiter never hears about it.

use core::fmt;
use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use heapless::String;
use log::{error, info, warn};

use super::utils::is_form_safe;
use crate::config::StationConfig;
use crate::events::{Ticket, TicketQueue};

pub const REPORT_TIMEOUT_MS: u32 = 20_000;
/// Idle wait between queue polls.
pub const TICKET_WAIT_MS: u32 = 100;

const SERVICE_SUFFIX: &str = "/web/webservices/llamadores_ws.php";

pub type ReportPath = String<80>;
pub type FormBody = String<128>;

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError {
    /// Connection, write or response failure; native code where known.
    Transport(i32),
    /// Server answered with a non-2xx status.
    Status(u16),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(code) => write!(f, "transport error ({})", code),
            Self::Status(s) => write!(f, "HTTP status {}", s),
        }
    }
}

// ── Target ────────────────────────────────────────────────────

/// Where and as whom to report.  Built once from the station config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTarget {
    pub host: String<32>,
    pub path: ReportPath,
    user: String<16>,
    pass: String<16>,
}

impl ReportTarget {
    /// `None` when no server is configured or a field would break the
    /// form encoding.
    pub fn from_config(cfg: &StationConfig) -> Option<Self> {
        if cfg.server.is_empty() {
            warn!("reporter: no server configured");
            return None;
        }
        for (field, value) in [
            ("url", cfg.url.as_str()),
            ("user", cfg.user.as_str()),
            ("pass", cfg.pass.as_str()),
        ] {
            if !is_form_safe(value) {
                error!("reporter: '{}' contains reserved characters", field);
                return None;
            }
        }
        Some(Self {
            host: cfg.server.clone(),
            path: report_path(&cfg.url)?,
            user: cfg.user.clone(),
            pass: cfg.pass.clone(),
        })
    }

    pub fn body(&self, ticket: Ticket) -> Option<FormBody> {
        form_body(ticket, &self.user, &self.pass)
    }
}

pub fn report_path(url: &str) -> Option<ReportPath> {
    let mut p = ReportPath::new();
    write!(p, "/{}{}", url, SERVICE_SUFFIX).ok()?;
    Some(p)
}

pub fn form_body(ticket: Ticket, user: &str, pass: &str) -> Option<FormBody> {
    let mut b = FormBody::new();
    write!(
        b,
        "auth_user={}&auth_pwd={}&operation={}",
        user,
        pass,
        ticket.operation()
    )
    .ok()?;
    if let Some(button) = ticket.button() {
        write!(b, "&button={}", button).ok()?;
    }
    Some(b)
}

// ── Transport seam ────────────────────────────────────────────

/// One form POST.  Returns the HTTP status on success.
pub trait FormPoster {
    fn post(&mut self, host: &str, path: &str, body: &str) -> Result<u16, ReportError>;
}

/// ESP-IDF HTTP client, one connection per report.
#[cfg(target_os = "espidf")]
pub struct EspHttpPoster;

#[cfg(target_os = "espidf")]
impl FormPoster for EspHttpPoster {
    fn post(&mut self, host: &str, path: &str, body: &str) -> Result<u16, ReportError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use esp_idf_svc::io::Write;

        let transport = |e: esp_idf_svc::sys::EspError| ReportError::Transport(e.code());

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(core::time::Duration::from_millis(u64::from(REPORT_TIMEOUT_MS))),
            ..Default::default()
        })
        .map_err(transport)?;

        let url = format!("http://{}{}", host, path);
        let len = body.len().to_string();
        let headers = [
            ("Content-Type", "application/x-www-form-urlencoded"),
            ("Content-Length", len.as_str()),
        ];
        conn.initiate_request(Method::Post, &url, &headers)
            .map_err(transport)?;
        conn.write_all(body.as_bytes()).map_err(transport)?;
        conn.initiate_response().map_err(transport)?;
        Ok(conn.status())
    }
}

/// Simulation transport: logs the request and answers 200.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct SimPoster {
    pub sent: Vec<(std::string::String, std::string::String)>,
}

#[cfg(not(target_os = "espidf"))]
impl FormPoster for SimPoster {
    fn post(&mut self, host: &str, path: &str, body: &str) -> Result<u16, ReportError> {
        info!("reporter(sim): POST http://{}{} [{}]", host, path, body);
        self.sent.push((format!("{}{}", host, path), body.into()));
        Ok(200)
    }
}

// ── Reporter ──────────────────────────────────────────────────

pub struct Reporter<T> {
    target: ReportTarget,
    transport: T,
    delivered: u32,
    failed: u32,
}

impl<T: FormPoster> Reporter<T> {
    pub fn new(target: ReportTarget, transport: T) -> Self {
        Self {
            target,
            transport,
            delivered: 0,
            failed: 0,
        }
    }

    /// Send one ticket.  Never retries.
    pub fn report(&mut self, ticket: Ticket) -> Result<u16, ReportError> {
        let Some(body) = self.target.body(ticket) else {
            self.failed += 1;
            error!("reporter: {:?} body does not fit", ticket);
            return Err(ReportError::Transport(-1));
        };
        let result = self
            .transport
            .post(&self.target.host, &self.target.path, &body)
            .and_then(|status| {
                if (200..300).contains(&status) {
                    Ok(status)
                } else {
                    Err(ReportError::Status(status))
                }
            });
        match result {
            Ok(status) => {
                self.delivered += 1;
                info!("reporter: {:?} -> HTTP {}", ticket, status);
            }
            Err(e) => {
                self.failed += 1;
                error!("reporter: {:?} failed, {}", ticket, e);
            }
        }
        result
    }

    /// Handle everything currently queued, waiting up to
    /// [`TICKET_WAIT_MS`] for the first ticket.
    pub fn step(&mut self, tickets: &TicketQueue, delay: &mut impl DelayNs) -> usize {
        let mut handled = 0;
        let mut next = tickets.take_within(TICKET_WAIT_MS, delay);
        while let Some(ticket) = next {
            let _ = self.report(ticket);
            handled += 1;
            next = tickets.try_take();
        }
        handled
    }

    pub fn run(mut self, tickets: &TicketQueue, mut delay: impl DelayNs) -> ! {
        info!(
            "reporter: posting to http://{}{}",
            self.target.host, self.target.path
        );
        loop {
            self.step(tickets, &mut delay);
        }
    }

    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
