use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, TriageError};

#[derive(Debug, Deserialize)]
struct DomainsFile {
    domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UsersFile {
    users: Vec<String>,
}

/// Verified domain regexes and verified user addresses, loaded once at
/// stage start and swapped in as a unit on reload. Never mutated in
/// place: a reload replaces the whole `TrustList`.
#[derive(Debug, Default, Clone)]
pub struct TrustList {
    domain_regexes: Vec<Regex>,
    verified_users: HashSet<String>,
}

impl TrustList {
    pub fn load(domains_path: &Path, users_path: &Path) -> Result<Self> {
        let domains_raw = std::fs::read_to_string(domains_path)?;
        let users_raw = std::fs::read_to_string(users_path)?;

        let domains: DomainsFile = serde_yaml::from_str(&domains_raw)?;
        let users: UsersFile = serde_yaml::from_str(&users_raw)?;

        let mut domain_regexes = Vec::with_capacity(domains.domains.len());
        for pattern in domains.domains {
            domain_regexes.push(Regex::new(&pattern).map_err(TriageError::from)?);
        }

        Ok(Self {
            domain_regexes,
            verified_users: users.users.into_iter().collect(),
        })
    }

    /// `trusted(email) = (some domain regex matches) OR (exact user match)`.
    pub fn is_trusted(&self, email: &str) -> bool {
        self.verified_users.contains(email) || self.domain_regexes.iter().any(|re| re.is_match(email))
    }

    pub fn domain_verified(&self, email: &str) -> bool {
        self.domain_regexes.iter().any(|re| re.is_match(email))
    }

    pub fn user_verified(&self, email: &str) -> bool {
        self.verified_users.contains(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str, contents: &str) -> Self {
            let mut path = std::env::temp_dir();
            path.push(format!("triage-core-test-{}-{}", std::process::id(), name));
            std::fs::write(&path, contents).unwrap();
            TempFile(path)
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn domain_regex_matches_trust_the_email() {
        let domains = TempFile::new("domains1.yaml", "domains:\n  - 'b$'\n");
        let users = TempFile::new("users1.yaml", "users: []\n");
        let trust = TrustList::load(&domains.0, &users.0).unwrap();
        assert!(trust.is_trusted("a@b"));
        assert!(!trust.is_trusted("a@c"));
    }

    #[test]
    fn exact_user_match_trusts_the_email() {
        let domains = TempFile::new("domains2.yaml", "domains: []\n");
        let users = TempFile::new("users2.yaml", "users:\n  - 'alice@example.com'\n");
        let trust = TrustList::load(&domains.0, &users.0).unwrap();
        assert!(trust.is_trusted("alice@example.com"));
        assert!(!trust.is_trusted("bob@example.com"));
    }
}
