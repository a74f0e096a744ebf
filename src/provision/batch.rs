//! Parsing of the `BATCH_USER_CREATION` value
//!
//! The format is `user1[:pass1];user2[:pass2];...`. Whitespace is not allowed
//! inside names or passwords, so all of it is removed before splitting.

use thiserror::Error;

/// One `username[:password]` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSpec {
    pub username: String,
    pub password: Option<String>,
}

impl AccountSpec {
    /// The password to set: the given one, or the username when none was given
    pub fn effective_password(&self) -> &str {
        match self.password.as_deref() {
            Some(password) if !password.is_empty() => password,
            _ => &self.username,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("username undefined")]
    UsernameUndefined { position: usize },
}

/// A parsed entry together with its 1-based position in the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub position: usize,
    pub spec: Result<AccountSpec, EntryError>,
}

/// Split a raw batch value into entries, in input order.
///
/// Empty segments inside the list (`;alice`, `a;;b`) are reported as entries
/// without a username. A single trailing `;` is tolerated and yields nothing.
pub fn parse_batch(raw: &str) -> Vec<BatchEntry> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Vec::new();
    }

    let mut segments: Vec<&str> = compact.split(';').collect();
    if segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| {
            let position = index + 1;
            BatchEntry {
                position,
                spec: parse_entry(segment, position),
            }
        })
        .collect()
}

fn parse_entry(segment: &str, position: usize) -> Result<AccountSpec, EntryError> {
    let (username, password) = match segment.split_once(':') {
        Some((username, password)) => (username, Some(password)),
        None => (segment, None),
    };

    if username.is_empty() {
        return Err(EntryError::UsernameUndefined { position });
    }

    Ok(AccountSpec {
        username: username.to_string(),
        password: password.filter(|p| !p.is_empty()).map(str::to_string),
    })
}
