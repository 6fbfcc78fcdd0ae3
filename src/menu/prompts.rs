//! User-visible menu text. Bodies only; the `CON`/`END` prefix is added by
//! [`UssdReply`](crate::reply::UssdReply).

use crate::gateway::model::{OpportunityDigest, OpportunityKind};

/// Maximum opportunities listed in one response.
pub const OPPORTUNITY_DISPLAY_CAP: usize = 5;

/// Titles longer than this are cut and suffixed with `...`.
pub const TITLE_MAX_CHARS: usize = 30;

// ── Unregistered regime ─────────────────────────────────────────────────

pub const WELCOME_MENU: &str = "Welcome to YouthConnect Uganda\n1. Register\n2. Learn More";

pub const ABOUT: &str = "YouthConnect links young entrepreneurs to grants, training and jobs. \
Dial again and choose 1 to register.";

pub const INVALID_OPTION: &str = "Invalid option. Please dial again.";

pub const NAME_PROMPT: &str = "Enter your full name (first and last name):";

pub const NAME_LENGTH_ERROR: &str =
    "Name must be 2 to 50 characters.\nEnter your full name (first and last name):";

pub const NAME_MISSING_LAST_ERROR: &str =
    "Please enter both your first and last name:";

pub const NAME_CHARACTERS_ERROR: &str =
    "Name can only contain letters, spaces, hyphens and apostrophes.\nEnter your full name:";

pub const GENDER_MENU: &str = "Select your gender:\n1. Male\n2. Female\n3. Other";

pub const AGE_MENU: &str = "Select your age group:\n1. 18-24\n2. 25-30\n3. 31-35";

pub const DISTRICT_MENU: &str =
    "Select your district:\n1. Kampala\n2. Wakiso\n3. Mukono\n4. Other";

pub const BUSINESS_STAGE_MENU: &str = "Select your business stage:\n1. Idea Stage\n2. Early Stage\n3. Growth Stage\n4. Established\n5. Scaling Up";

pub const REGISTRATION_FAILED: &str =
    "Registration failed. Please try again later.";

pub fn registration_success(first_name: &str) -> String {
    format!(
        "Registration successful! Welcome to YouthConnect, {first_name}.\nDial again to explore opportunities."
    )
}

// ── Registered regime ───────────────────────────────────────────────────

pub const MAIN_MENU: &str = "YouthConnect Main Menu\n1. View Opportunities\n2. Find a Mentor\n3. My Applications\n4. My Profile\n5. Help";

pub const MENTORSHIP_COMING_SOON: &str = "Mentorship matching is coming soon. Stay tuned!";

pub const APPLICATIONS_COMING_SOON: &str =
    "Application tracking is coming soon. Stay tuned!";

pub const HELP: &str = "YouthConnect Help\nCall 0800 100 200 (toll free) or visit youthconnect.ug";

pub const OPPORTUNITIES_MENU: &str =
    "Select opportunity type:\n1. Grants\n2. Training\n3. Jobs\n4. Back";

pub const OPPORTUNITIES_UNAVAILABLE: &str =
    "Unable to load opportunities right now. Please try again later.";

pub const PROFILE_MENU: &str = "My Profile\n1. View Profile\n2. Update Profile\n3. Back";

pub const PROFILE_VIEW: &str =
    "To view your full profile, log in at youthconnect.ug or use the YouthConnect app.";

pub const PROFILE_UPDATE: &str =
    "To update your profile, log in at youthconnect.ug or use the YouthConnect app.";

// ── Handler-level ───────────────────────────────────────────────────────

pub const INVALID_REQUEST: &str = "Invalid request. Please check your number and try again.";

pub const SERVICE_UNAVAILABLE: &str =
    "Service temporarily unavailable. Please try again later.";

/// Cut a title to [`TITLE_MAX_CHARS`], appending `...` when shortened.
pub fn truncate_title(title: &str) -> String {
    let title = title.trim();
    if title.chars().count() <= TITLE_MAX_CHARS {
        return title.to_string();
    }
    let cut: String = title.chars().take(TITLE_MAX_CHARS).collect();
    format!("{}...", cut.trim_end())
}

pub fn no_opportunities(kind: OpportunityKind) -> String {
    format!(
        "No {} available at the moment. Please check again later.",
        kind.label().to_lowercase()
    )
}

/// Render up to [`OPPORTUNITY_DISPLAY_CAP`] opportunities, a count of the
/// hidden remainder, and the back option.
pub fn opportunity_listing(kind: OpportunityKind, items: &[OpportunityDigest]) -> String {
    let mut lines = vec![format!("Available {}:", kind.label())];

    lines.extend(
        items
            .iter()
            .take(OPPORTUNITY_DISPLAY_CAP)
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, truncate_title(&item.title))),
    );

    let hidden = items.len().saturating_sub(OPPORTUNITY_DISPLAY_CAP);
    if hidden > 0 {
        lines.push(format!("({hidden} more available)"));
    }

    lines.push("4. Back".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(title: &str) -> OpportunityDigest {
        OpportunityDigest {
            title: title.to_string(),
            kind: OpportunityKind::Grant,
        }
    }

    #[test]
    fn short_titles_untouched() {
        assert_eq!(truncate_title("Seed Fund"), "Seed Fund");
        let exactly = "a".repeat(TITLE_MAX_CHARS);
        assert_eq!(truncate_title(&exactly), exactly);
    }

    #[test]
    fn long_titles_truncated_with_ellipsis() {
        let title = "Women in Agribusiness Innovation Challenge 2025";
        let cut = truncate_title(title);
        assert_eq!(cut, "Women in Agribusiness Innovati...");
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn truncation_is_char_safe() {
        let title = "é".repeat(40);
        assert_eq!(truncate_title(&title).chars().count(), TITLE_MAX_CHARS + 3);
    }

    #[test]
    fn listing_caps_and_counts_hidden() {
        let items: Vec<_> = (1..=7).map(|i| digest(&format!("Grant {i}"))).collect();
        let text = opportunity_listing(OpportunityKind::Grant, &items);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Available Grants:");
        assert_eq!(lines[1], "1. Grant 1");
        assert_eq!(lines[5], "5. Grant 5");
        assert_eq!(lines[6], "(2 more available)");
        assert_eq!(lines[7], "4. Back");
        assert!(!text.contains("Grant 6"));
    }

    #[test]
    fn listing_without_overflow_has_no_count() {
        let items = vec![digest("Only One")];
        let text = opportunity_listing(OpportunityKind::Grant, &items);
        assert_eq!(text, "Available Grants:\n1. Only One\n4. Back");
    }

    #[test]
    fn empty_listing_message() {
        assert_eq!(
            no_opportunities(OpportunityKind::Job),
            "No jobs available at the moment. Please check again later."
        );
    }
}
