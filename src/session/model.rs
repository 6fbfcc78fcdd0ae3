//! Session data model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::model::{AgeGroup, BusinessStage, District, Gender, RegistrationRequest};
use crate::menu::state::MenuState;

/// Registration source tag sent to the user service.
pub const REGISTRATION_SOURCE: &str = "USSD";

/// Lifecycle of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Expecting more input.
    #[default]
    Active,
    /// Last response closed the dialog.
    Ended,
    /// Registration submission failed; the draft is kept but the dialog closed.
    Abandoned,
}

/// Registration fields collected across wizard turns.
///
/// A field is only set once its wizard step has been passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<District>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_stage: Option<BusinessStage>,
}

impl RegistrationDraft {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Assemble the submission. Returns `None` while any step is missing.
    ///
    /// The first whitespace-separated token is the first name; the rest is
    /// the last name.
    pub fn to_request(&self, phone_number: &str) -> Option<RegistrationRequest> {
        let full_name = self.full_name.as_deref()?;
        let mut tokens = full_name.split_whitespace();
        let first_name = tokens.next()?.to_string();
        let last_name = tokens.collect::<Vec<_>>().join(" ");
        if last_name.is_empty() {
            return None;
        }

        Some(RegistrationRequest {
            phone_number: phone_number.to_string(),
            first_name,
            last_name,
            gender: self.gender?,
            age_group: self.age_group?,
            district: self.district?,
            business_stage: self.business_stage?,
            source: REGISTRATION_SOURCE.to_string(),
        })
    }
}

/// One in-progress USSD dialog, keyed by the aggregator's session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    /// Canonical phone number.
    pub phone_number: String,
    pub current_menu: MenuState,
    pub draft: RegistrationDraft,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session positioned at `entry`.
    pub fn new(session_id: &str, phone_number: &str, entry: MenuState) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            phone_number: phone_number.to_string(),
            current_menu: entry,
            draft: RegistrationDraft::default(),
            status: SessionStatus::Active,
            created_at: now,
            last_updated: now,
        }
    }

    /// Whether the session has been idle longer than `timeout` at `now`.
    pub fn is_expired_at(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        // Negative idle time (clock skew) counts as fresh.
        now.signed_duration_since(self.last_updated)
            .to_std()
            .map(|idle| idle > timeout)
            .unwrap_or(false)
    }

    /// Whether the session has been idle longer than `timeout`.
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.is_expired_at(timeout, Utc::now())
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> RegistrationDraft {
        RegistrationDraft {
            full_name: Some("Jane Nakato Akello".into()),
            gender: Some(Gender::Female),
            age_group: Some(AgeGroup::From18To24),
            district: Some(District::Kampala),
            business_stage: Some(BusinessStage::Idea),
        }
    }

    #[test]
    fn draft_assembles_request() {
        let request = complete_draft().to_request("256701234567").unwrap();
        assert_eq!(request.first_name, "Jane");
        assert_eq!(request.last_name, "Nakato Akello");
        assert_eq!(request.phone_number, "256701234567");
        assert_eq!(request.source, "USSD");
    }

    #[test]
    fn incomplete_draft_yields_nothing() {
        let mut draft = complete_draft();
        draft.district = None;
        assert!(draft.to_request("256701234567").is_none());

        let mut single_name = complete_draft();
        single_name.full_name = Some("Jane".into());
        assert!(single_name.to_request("256701234567").is_none());
    }

    #[test]
    fn empty_draft() {
        assert!(RegistrationDraft::default().is_empty());
        assert!(!complete_draft().is_empty());
    }

    #[test]
    fn expiry_compares_last_updated() {
        let mut session = Session::new("s1", "256701234567", MenuState::Welcome);
        let timeout = Duration::from_secs(300);
        let now = Utc::now();

        session.last_updated = now - chrono::Duration::seconds(299);
        assert!(!session.is_expired_at(timeout, now));

        session.last_updated = now - chrono::Duration::seconds(301);
        assert!(session.is_expired_at(timeout, now));
    }

    #[test]
    fn session_serde_roundtrip() {
        let mut session = Session::new("s1", "256701234567", MenuState::AgeEntry);
        session.draft.full_name = Some("John Okello".into());
        session.draft.gender = Some(Gender::Male);

        let json = serde_json::to_string(&session).unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
        assert!(!json.contains("district"));
    }
}
