//! Notification recipient assembly

use std::collections::HashSet;

/// Ordered, duplicate-free set of recipient emails
///
/// Entries keep the position of their first insertion, so feeding friends,
/// then subscribers, then mentions yields that precedence.
#[derive(Debug, Clone, Default)]
pub struct RecipientSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl RecipientSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one email; returns false if it was already present
    pub fn insert(&mut self, email: impl Into<String>) -> bool {
        let email = email.into();
        if self.members.contains(&email) {
            return false;
        }
        self.members.insert(email.clone());
        self.order.push(email);
        true
    }

    pub fn extend<I, T>(&mut self, emails: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for email in emails {
            self.insert(email);
        }
    }

    /// Drop every member found in `excluded`
    pub fn exclude<'a, I>(&mut self, excluded: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let excluded: HashSet<&str> = excluded.into_iter().collect();
        if excluded.is_empty() {
            return;
        }

        let before = self.order.len();
        self.order.retain(|email| !excluded.contains(email.as_str()));
        self.members.retain(|email| !excluded.contains(email.as_str()));
        tracing::debug!("Excluded {} blocking recipients", before - self.order.len());
    }

    pub fn contains(&self, email: &str) -> bool {
        self.members.contains(email)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}
