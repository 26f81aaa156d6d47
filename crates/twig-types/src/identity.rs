use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::temporal::Timestamp;

/// Who made a change: a display name plus a contact string (usually email).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Stamp this identity with a point in time.
    pub fn sign(&self, when: Timestamp) -> Signature {
        Signature {
            identity: self.clone(),
            when,
        }
    }

    /// Stamp this identity with the current wall-clock time.
    pub fn sign_now(&self) -> Signature {
        self.sign(Timestamp::now())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Parses the `Name <contact>` form used in configuration files.
impl FromStr for Identity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = s
            .split_once('<')
            .ok_or_else(|| TypeError::InvalidIdentity(format!("missing '<' in {s:?}")))?;
        let email = rest
            .strip_suffix('>')
            .ok_or_else(|| TypeError::InvalidIdentity(format!("missing trailing '>' in {s:?}")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(TypeError::InvalidIdentity("name must not be empty".into()));
        }
        if email.contains(['<', '>']) {
            return Err(TypeError::InvalidIdentity(format!(
                "contact must not contain angle brackets: {email:?}"
            )));
        }
        Ok(Self::new(name, email.trim()))
    }
}

/// An identity bound to the moment it acted, as recorded in commits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub identity: Identity,
    pub when: Timestamp,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.identity, self.when)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_and_contact() {
        let ident: Identity = "Ident <ident@example.com>".parse().unwrap();
        assert_eq!(ident, Identity::new("Ident", "ident@example.com"));
        assert_eq!(ident.to_string(), "Ident <ident@example.com>");
    }

    #[test]
    fn parse_rejects_missing_brackets() {
        assert!("Ident ident@example.com".parse::<Identity>().is_err());
        assert!("Ident <ident@example.com".parse::<Identity>().is_err());
    }

    #[test]
    fn parse_rejects_empty_name() {
        let err = " <a@b>".parse::<Identity>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidIdentity(_)));
    }

    #[test]
    fn sign_keeps_identity_and_time() {
        let ident = Identity::new("a", "a@example.com");
        let sig = ident.sign(Timestamp::from_millis(42));
        assert_eq!(sig.identity, ident);
        assert_eq!(sig.when.unix_ms, 42);
    }
}
