//! Interpretation of server login-status output.
//!
//! A `login -s` style command answers with one or more result lines. The
//! interesting ones either state that a fresh login is unnecessary or carry
//! the remaining ticket lifetime, which this module converts into an
//! absolute expiry time.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::error::SessionError;

/// Phrase the server reports when a valid ticket makes login redundant.
const LOGIN_NOT_NECESSARY: &str = "not necessary";

/// Phrase preceding the remaining ticket lifetime.
const TICKET_EXPIRES: &str = "ticket expires in";

static EXPIRY_RE: OnceLock<Regex> = OnceLock::new();

fn expiry_re() -> &'static Regex {
    EXPIRY_RE.get_or_init(|| {
        Regex::new(r"^.* expires in (\d+) hours (\d+) minutes\.$").expect("valid expiry pattern")
    })
}

/// What one login-status line tells us about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// The server holds a ticket that needs no refresh this process.
    NotNecessary,
    /// The ticket expires at the given absolute time.
    ExpiresAt(DateTime<Utc>),
    /// Empty message body, typically an intermediary swallowed it.
    Blank,
    /// Anything else; not evidence of an authenticated session.
    Other,
}

/// Classifies a single login-status line.
///
/// An expiry phrase that fails to parse is an error rather than `Other`:
/// it means the server response format changed and silently treating the
/// session as unauthenticated would mask that.
pub fn classify_line(line: &str) -> Result<StatusLine, SessionError> {
    if line.contains(LOGIN_NOT_NECESSARY) {
        return Ok(StatusLine::NotNecessary);
    }
    if line.contains(TICKET_EXPIRES) {
        return Ok(StatusLine::ExpiresAt(parse_expiry(line)?));
    }
    if line.trim().is_empty() {
        return Ok(StatusLine::Blank);
    }
    Ok(StatusLine::Other)
}

/// Converts a `... expires in <hours> hours <minutes> minutes.` status line
/// into the absolute expiry time.
pub fn parse_expiry(status: &str) -> Result<DateTime<Utc>, SessionError> {
    let parse_failure = || SessionError::ExpiryParse {
        status: status.to_string(),
    };

    let caps = expiry_re().captures(status).ok_or_else(parse_failure)?;
    let hours: i64 = caps[1].parse().map_err(|_| parse_failure())?;
    let minutes: i64 = caps[2].parse().map_err(|_| parse_failure())?;

    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .and_then(Duration::try_minutes)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(parse_failure)
}
