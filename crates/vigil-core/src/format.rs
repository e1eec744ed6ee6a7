//! Alert message rendering.
//!
//! Pure mapping from [`ChangeEvent`] to a Telegram-HTML message body, one
//! template per variant. Detection never builds message strings and this
//! module never decides what changed.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;
use std::net::Ipv4Addr;

use crate::types::{CertificateInfo, ChangeEvent};

/// Render one event into the message body sent to the alert channel.
#[must_use]
pub fn render_event(domain: &str, event: &ChangeEvent, at: DateTime<Utc>) -> String {
    let time = iso(at);
    match event {
        ChangeEvent::AuthorityLost => format!(
            "⚠️ <b>DNS Authority Unreachable</b>\n\n\
             Domain: <code>{domain}</code>\n\
             Time: {time}\n\n\
             No authoritative nameserver could be reached (DNS status 3). \
             Baseline IPs and serial are cleared until authority returns."
        ),

        ChangeEvent::IpChanged {
            previous,
            current,
            serial,
            dns_status,
        } => format!(
            "⚠️ <b>DNS IP Change Detected</b>\n\n\
             Domain: <code>{domain}</code>\n\
             Previous IPs: <code>{}</code>\n\
             New IPs: <code>{}</code>\n\
             Time: {time}\n\n\
             <b>Technical Details:</b>\n\
             - DNS Status: <code>{dns_status}</code>\n\
             - Record Type: <code>A</code>\n\
             - Number of Records: <code>{}</code>\n\
             - SOA Serial: <code>{}</code>",
            join_ips(previous),
            join_ips(current),
            current.len(),
            serial.as_deref().unwrap_or("unknown"),
        ),

        ChangeEvent::CertificateChanged { previous, current } => {
            let mut message = format!(
                "🚨 <b>Unexpected Certificate Change</b>\n\n\
                 Domain: <code>{domain}</code>\n\
                 Time: {time}\n\n\
                 <b>Current Certificate:</b>\n\
                 - Issuer: <code>{}</code>\n\
                 - Subject: <code>{}</code>\n\
                 - Valid From: <code>{}</code>\n\
                 - Valid To: <code>{}</code>\n\
                 - Fingerprint: <code>{}</code>\n",
                current.issuer,
                current.subject,
                iso(current.valid_from),
                iso(current.valid_to),
                current.fingerprint,
            );
            push_previous_cert(&mut message, previous.as_ref());
            message
        }

        ChangeEvent::SoaUpdated {
            previous_serial,
            soa,
            dns_status,
        } => format!(
            "📝 <b>DNS Zone Updated</b>\n\n\
             Domain: <code>{domain}</code>\n\
             Previous Serial: <code>{}</code>\n\
             New Serial: <code>{}</code>\n\
             Time: {time}\n\n\
             <b>Technical Details:</b>\n\
             - DNS Status: <code>{dns_status}</code>\n\
             - Record Type: <code>SOA</code>\n\
             - Primary NS: <code>{}</code>\n\
             - Admin Email: <code>{}</code>\n\
             - Refresh: <code>{}</code>\n\
             - Retry: <code>{}</code>\n\
             - Expire: <code>{}</code>\n\
             - Min TTL: <code>{}</code>",
            previous_serial.as_deref().unwrap_or("unknown"),
            soa.serial,
            soa.primary_ns,
            soa.admin_email,
            soa.refresh,
            soa.retry,
            soa.expire,
            soa.minimum_ttl,
        ),

        ChangeEvent::CriticalConcurrentChange {
            previous_ips,
            current_ips,
            previous_cert,
            current_cert,
            window_minutes,
            last_ip_change,
            last_cert_change,
        } => {
            let mut message = format!(
                "🚨🚨 <b>CRITICAL: Concurrent IP and Certificate Changes</b>\n\n\
                 Domain: <code>{domain}</code>\n\
                 Time: {time}\n\n\
                 <b>IP Change:</b>\n\
                 - Previous IPs: <code>{}</code>\n\
                 - New IPs: <code>{}</code>\n\n\
                 <b>Certificate Change:</b>\n\
                 - Current Issuer: <code>{}</code>\n\
                 - Current Subject: <code>{}</code>\n\
                 - Current Fingerprint: <code>{}</code>\n",
                join_ips(previous_ips),
                join_ips(current_ips),
                current_cert.as_ref().map_or("unknown", |c| c.issuer.as_str()),
                current_cert.as_ref().map_or("unknown", |c| c.subject.as_str()),
                current_cert
                    .as_ref()
                    .map_or("unknown", |c| c.fingerprint.as_str()),
            );
            push_previous_cert(&mut message, previous_cert.as_ref());
            let _ = write!(
                message,
                "\n<b>Technical Details:</b>\n\
                 - Time Window: <code>{window_minutes} minutes</code>\n\
                 - Last IP Change: <code>{}</code>\n\
                 - Last Cert Change: <code>{}</code>",
                iso(*last_ip_change),
                iso(*last_cert_change),
            );
            message
        }

        ChangeEvent::CertificateValidationError { reason } => format!(
            "🚨 <b>CRITICAL: Certificate Validation Error</b>\n\n\
             Domain: <code>{domain}</code>\n\
             Time: {time}\n\
             Error: <code>{reason}</code>\n"
        ),
    }
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn join_ips(ips: &[Ipv4Addr]) -> String {
    if ips.is_empty() {
        return String::from("none");
    }
    ips.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_previous_cert(message: &mut String, previous: Option<&CertificateInfo>) {
    match previous {
        Some(cert) => {
            let _ = write!(
                message,
                "\n<b>Previous Certificate:</b>\n\
                 - Issuer: <code>{}</code>\n\
                 - Subject: <code>{}</code>\n\
                 - Fingerprint: <code>{}</code>\n",
                cert.issuer, cert.subject, cert.fingerprint,
            );
        }
        None => message.push_str("\n<b>Previous Certificate:</b> None recorded\n"),
    }
}
