//! Session cookie file validation
//!
//! The catalog authorizes requests with cookies exported from a logged-in
//! browser session in the Netscape `cookies.txt` format:
//!
//! ```text
//! # Netscape HTTP Cookie File
//! .music.apple.com	TRUE	/	TRUE	1767225600	media-user-token	AbC...
//! ```
//!
//! Seven tab-separated fields: domain, include-subdomains flag, path, secure
//! flag, expiry (unix seconds, 0 for session cookies), name and value. Lines
//! starting with `#` are comments except for the `#HttpOnly_` prefix, which
//! marks an HTTP-only cookie.
//!
//! The file is checked locally only; whether the session is still accepted by
//! the service is discovered when the downloader uses it.

use crate::error::CredentialError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";
const FIELD_COUNT: usize = 7;

/// A cookie file that passed local validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieFile {
    /// Location of the file
    pub path: PathBuf,
    /// Number of cookie entries in the file
    pub cookie_count: usize,
    /// Number of entries that apply to the catalog host
    pub catalog_cookie_count: usize,
    /// Latest expiry among the catalog cookies (None when all are session cookies)
    pub expires_at: Option<DateTime<Utc>>,
}

/// One parsed `cookies.txt` entry
#[derive(Debug, Clone, PartialEq, Eq)]
struct CookieEntry {
    domain: String,
    expires: i64,
    name: String,
}

impl CookieEntry {
    fn applies_to(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{}", domain))
    }
}

/// Locate and validate the exported cookie file
///
/// # Errors
///
/// - [`CredentialError::NotFound`] if there is no file at `path`
/// - [`CredentialError::Empty`] if it has no content
/// - [`CredentialError::MalformedFormat`] if a line is not a cookie entry, the
///   file has no entries at all, or none of them is for the catalog host
/// - [`CredentialError::Expired`] if every catalog cookie carries an expiry in the past
pub fn locate_cookies(path: &Path, catalog_host: &str) -> Result<CookieFile, CredentialError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CredentialError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(CredentialError::MalformedFormat {
                path: path.to_path_buf(),
                reason: format!("unreadable: {}", e),
            });
        }
    };

    validate_contents(path, &contents, catalog_host, Utc::now())
}

fn validate_contents(
    path: &Path,
    contents: &str,
    catalog_host: &str,
    now: DateTime<Utc>,
) -> Result<CookieFile, CredentialError> {
    if contents.trim().is_empty() {
        return Err(CredentialError::Empty {
            path: path.to_path_buf(),
        });
    }

    let entries = parse_entries(contents).map_err(|reason| CredentialError::MalformedFormat {
        path: path.to_path_buf(),
        reason,
    })?;

    if entries.is_empty() {
        return Err(CredentialError::MalformedFormat {
            path: path.to_path_buf(),
            reason: "no cookie entries (is this a Netscape cookies.txt export?)".to_string(),
        });
    }

    let catalog: Vec<&CookieEntry> = entries
        .iter()
        .filter(|e| e.applies_to(catalog_host))
        .collect();

    if catalog.is_empty() {
        warn!(
            ?path,
            catalog_host, "cookie file has no cookies for the catalog host"
        );
        return Err(CredentialError::MalformedFormat {
            path: path.to_path_buf(),
            reason: format!(
                "no cookies for {} (export them while logged in on {})",
                catalog_host, catalog_host
            ),
        });
    }

    // Session cookies (expiry 0) never count as expired
    let persistent: Vec<i64> = catalog
        .iter()
        .map(|e| e.expires)
        .filter(|&t| t > 0)
        .collect();
    let has_session_cookie = catalog.iter().any(|e| e.expires == 0);
    let latest = persistent.iter().copied().max();
    let expires_at = latest.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0));

    if let Some(expires_at) = expires_at
        && !has_session_cookie
        && expires_at <= now
    {
        return Err(CredentialError::Expired {
            path: path.to_path_buf(),
            expired_at: expires_at.to_rfc3339(),
        });
    }

    debug!(
        ?path,
        cookies = entries.len(),
        catalog_cookies = catalog.len(),
        names = ?catalog.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
        "cookie file validated"
    );

    Ok(CookieFile {
        path: path.to_path_buf(),
        cookie_count: entries.len(),
        catalog_cookie_count: catalog.len(),
        expires_at,
    })
}

fn parse_entries(contents: &str) -> Result<Vec<CookieEntry>, String> {
    let mut entries = Vec::new();

    for (i, raw) in contents.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim_end_matches('\r');

        let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => rest,
            None if line.trim().is_empty() || line.starts_with('#') => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != FIELD_COUNT {
            return Err(format!(
                "line {}: expected {} tab-separated fields, found {}",
                line_no,
                FIELD_COUNT,
                fields.len()
            ));
        }

        for (index, flag) in [(1, fields[1]), (3, fields[3])] {
            if !flag.eq_ignore_ascii_case("TRUE") && !flag.eq_ignore_ascii_case("FALSE") {
                return Err(format!(
                    "line {}: field {} must be TRUE or FALSE, found {:?}",
                    line_no,
                    index + 1,
                    flag
                ));
            }
        }

        let expires = fields[4].trim().parse::<i64>().map_err(|_| {
            format!(
                "line {}: expiry {:?} is not a unix timestamp",
                line_no, fields[4]
            )
        })?;

        if fields[0].is_empty() || fields[5].is_empty() {
            return Err(format!("line {}: missing domain or cookie name", line_no));
        }

        entries.push(CookieEntry {
            domain: fields[0].to_string(),
            expires,
            name: fields[5].to_string(),
        });
    }

    Ok(entries)
}
