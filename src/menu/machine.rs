//! Menu state machine: pure transitions from (state, input, regime) to the
//! next state and the response.
//!
//! Nothing here performs I/O. Steps that need a collaborator return a
//! [`Step`] describing the call; the handler performs it and feeds the
//! result back through [`complete_registration`] or [`show_opportunities`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::prompts;
use super::state::{MenuState, Regime};
use crate::gateway::model::{
    AgeGroup, BusinessStage, District, Gender, OpportunityDigest, OpportunityKind,
    RegistrationRequest,
};
use crate::reply::UssdReply;
use crate::session::{RegistrationDraft, Session, SessionStatus};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;

static NAME_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid regex"));

/// The state a session moves to, plus the response for this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next_menu: MenuState,
    pub draft: RegistrationDraft,
    pub status: SessionStatus,
    pub reply: UssdReply,
}

impl Transition {
    /// Stay in the dialog at `next_menu`.
    fn proceed(next_menu: MenuState, draft: RegistrationDraft, text: impl Into<String>) -> Self {
        Self {
            next_menu,
            draft,
            status: SessionStatus::Active,
            reply: UssdReply::con(text),
        }
    }

    /// Close the dialog, leaving the session at `menu`.
    fn close(menu: MenuState, draft: RegistrationDraft, text: impl Into<String>) -> Self {
        Self {
            next_menu: menu,
            draft,
            status: SessionStatus::Ended,
            reply: UssdReply::end(text),
        }
    }

    /// Produce the updated session. The input session is left untouched.
    pub fn apply_to(&self, session: &Session) -> Session {
        let mut next = session.clone();
        next.current_menu = self.next_menu;
        next.draft = self.draft.clone();
        next.status = self.status;
        next.touch();
        next
    }
}

/// Outcome of evaluating one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The turn is fully decided.
    Reply(Transition),
    /// The wizard is complete; submit `request`, then call
    /// [`complete_registration`] with `draft` and the result.
    SubmitRegistration {
        draft: RegistrationDraft,
        request: RegistrationRequest,
    },
    /// Fetch opportunities of `kind`, then call [`show_opportunities`].
    FetchOpportunities(OpportunityKind),
}

/// Why a submitted name was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    /// Blank, shorter than 2 or longer than 50 characters.
    Length,
    /// Only one token given.
    MissingLastName,
    /// Anything outside letters, whitespace, `'` and `-`.
    InvalidCharacters,
}

impl NameError {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Length => prompts::NAME_LENGTH_ERROR,
            Self::MissingLastName => prompts::NAME_MISSING_LAST_ERROR,
            Self::InvalidCharacters => prompts::NAME_CHARACTERS_ERROR,
        }
    }
}

/// Validate a full name, returning it with whitespace collapsed.
pub fn validate_full_name(input: &str) -> Result<String, NameError> {
    let trimmed = input.trim();
    let length = trimmed.chars().count();
    if trimmed.is_empty() || !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
        return Err(NameError::Length);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(NameError::MissingLastName);
    }

    if !NAME_CHARACTERS.is_match(trimmed) {
        return Err(NameError::InvalidCharacters);
    }

    Ok(tokens.join(" "))
}

/// The entry menu for a regime, as an open dialog.
fn entry(regime: Regime) -> Transition {
    let state = regime.entry_state();
    Transition::proceed(state, RegistrationDraft::default(), menu_text(state))
}

/// The menu body shown when a state is (re)entered.
pub fn menu_text(state: MenuState) -> &'static str {
    match state {
        MenuState::Welcome => prompts::WELCOME_MENU,
        MenuState::NameEntry => prompts::NAME_PROMPT,
        MenuState::GenderEntry => prompts::GENDER_MENU,
        MenuState::AgeEntry => prompts::AGE_MENU,
        MenuState::DistrictEntry => prompts::DISTRICT_MENU,
        MenuState::BusinessStageEntry => prompts::BUSINESS_STAGE_MENU,
        MenuState::Main => prompts::MAIN_MENU,
        MenuState::Opportunities => prompts::OPPORTUNITIES_MENU,
        MenuState::Profile => prompts::PROFILE_MENU,
    }
}

/// Evaluate one turn.
///
/// `input` is the latest keystroke submission, or `None` on the opening
/// turn of a dialog. A session parked in the other regime's states is sent
/// back to this regime's entry menu.
pub fn step(session: &Session, input: Option<&str>, regime: Regime) -> Step {
    let Some(input) = input else {
        return Step::Reply(entry(regime));
    };

    if session.current_menu.regime() != regime {
        debug!(
            session_id = %session.session_id,
            menu = %session.current_menu,
            "Session menu belongs to other regime, restarting at entry"
        );
        return Step::Reply(entry(regime));
    }

    let draft = session.draft.clone();
    let input = input.trim();

    match session.current_menu {
        MenuState::Welcome => Step::Reply(match input {
            "1" => Transition::proceed(MenuState::NameEntry, draft, prompts::NAME_PROMPT),
            "2" => Transition::close(MenuState::Welcome, draft, prompts::ABOUT),
            _ => Transition::close(MenuState::Welcome, draft, prompts::INVALID_OPTION),
        }),

        MenuState::NameEntry => Step::Reply(match validate_full_name(input) {
            Ok(name) => {
                let draft = RegistrationDraft {
                    full_name: Some(name),
                    ..draft
                };
                Transition::proceed(MenuState::GenderEntry, draft, prompts::GENDER_MENU)
            }
            Err(e) => Transition::proceed(MenuState::NameEntry, draft, e.prompt()),
        }),

        MenuState::GenderEntry => Step::Reply(match Gender::from_choice(input) {
            Some(gender) => {
                let draft = RegistrationDraft {
                    gender: Some(gender),
                    ..draft
                };
                Transition::proceed(MenuState::AgeEntry, draft, prompts::AGE_MENU)
            }
            None => Transition::proceed(MenuState::GenderEntry, draft, prompts::GENDER_MENU),
        }),

        MenuState::AgeEntry => Step::Reply(match AgeGroup::from_choice(input) {
            Some(age_group) => {
                let draft = RegistrationDraft {
                    age_group: Some(age_group),
                    ..draft
                };
                Transition::proceed(MenuState::DistrictEntry, draft, prompts::DISTRICT_MENU)
            }
            None => Transition::proceed(MenuState::AgeEntry, draft, prompts::AGE_MENU),
        }),

        MenuState::DistrictEntry => Step::Reply(match District::from_choice(input) {
            Some(district) => {
                let draft = RegistrationDraft {
                    district: Some(district),
                    ..draft
                };
                Transition::proceed(
                    MenuState::BusinessStageEntry,
                    draft,
                    prompts::BUSINESS_STAGE_MENU,
                )
            }
            None => Transition::proceed(MenuState::DistrictEntry, draft, prompts::DISTRICT_MENU),
        }),

        MenuState::BusinessStageEntry => match BusinessStage::from_choice(input) {
            Some(stage) => {
                let draft = RegistrationDraft {
                    business_stage: Some(stage),
                    ..draft
                };
                match draft.to_request(&session.phone_number) {
                    Some(request) => Step::SubmitRegistration { draft, request },
                    None => {
                        warn!(
                            session_id = %session.session_id,
                            "Registration draft incomplete at final step, restarting wizard"
                        );
                        Step::Reply(Transition::close(
                            MenuState::Welcome,
                            RegistrationDraft::default(),
                            prompts::REGISTRATION_FAILED,
                        ))
                    }
                }
            }
            None => Step::Reply(Transition::proceed(
                MenuState::BusinessStageEntry,
                draft,
                prompts::BUSINESS_STAGE_MENU,
            )),
        },

        MenuState::Main => Step::Reply(match input {
            "1" => Transition::proceed(MenuState::Opportunities, draft, prompts::OPPORTUNITIES_MENU),
            "2" => Transition::close(MenuState::Main, draft, prompts::MENTORSHIP_COMING_SOON),
            "3" => Transition::close(MenuState::Main, draft, prompts::APPLICATIONS_COMING_SOON),
            "4" => Transition::proceed(MenuState::Profile, draft, prompts::PROFILE_MENU),
            "5" => Transition::close(MenuState::Main, draft, prompts::HELP),
            _ => Transition::close(MenuState::Main, draft, prompts::INVALID_OPTION),
        }),

        MenuState::Opportunities => match OpportunityKind::from_choice(input) {
            Some(kind) => Step::FetchOpportunities(kind),
            None if input == "4" => Step::Reply(Transition::proceed(
                MenuState::Main,
                draft,
                prompts::MAIN_MENU,
            )),
            None => Step::Reply(Transition::close(
                MenuState::Opportunities,
                draft,
                prompts::INVALID_OPTION,
            )),
        },

        MenuState::Profile => Step::Reply(match input {
            "1" => Transition::close(MenuState::Profile, draft, prompts::PROFILE_VIEW),
            "2" => Transition::close(MenuState::Profile, draft, prompts::PROFILE_UPDATE),
            "3" => Transition::proceed(MenuState::Main, draft, prompts::MAIN_MENU),
            _ => Transition::proceed(MenuState::Profile, draft, prompts::PROFILE_MENU),
        }),
    }
}

/// Finish the wizard once the user service has answered.
///
/// On success the draft is cleared and the session parked at `Main`. On
/// failure the draft is kept and the session marked abandoned.
pub fn complete_registration(
    draft: RegistrationDraft,
    request: &RegistrationRequest,
    registered: bool,
) -> Transition {
    if registered {
        Transition::close(
            MenuState::Main,
            RegistrationDraft::default(),
            prompts::registration_success(&request.first_name),
        )
    } else {
        Transition {
            next_menu: MenuState::BusinessStageEntry,
            draft,
            status: SessionStatus::Abandoned,
            reply: UssdReply::end(prompts::REGISTRATION_FAILED),
        }
    }
}

/// Render an opportunity lookup. `None` means the lookup failed.
pub fn show_opportunities(
    session: &Session,
    kind: OpportunityKind,
    items: Option<&[OpportunityDigest]>,
) -> Transition {
    let draft = session.draft.clone();
    let text = match items {
        None => prompts::OPPORTUNITIES_UNAVAILABLE.to_string(),
        Some([]) => prompts::no_opportunities(kind),
        Some(items) => prompts::opportunity_listing(kind, items),
    };
    Transition::close(MenuState::Opportunities, draft, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: &str = "256701234567";

    fn session_at(menu: MenuState) -> Session {
        Session::new("s1", PHONE, menu)
    }

    fn reply(step: Step) -> Transition {
        match step {
            Step::Reply(t) => t,
            other => panic!("expected Reply, got {other:?}"),
        }
    }

    fn full_draft_without_stage() -> RegistrationDraft {
        RegistrationDraft {
            full_name: Some("John Okello".into()),
            gender: Some(Gender::Male),
            age_group: Some(AgeGroup::From25To30),
            district: Some(District::Mukono),
            business_stage: None,
        }
    }

    // ── Name validation ─────────────────────────────────────────────

    #[test]
    fn name_validation_reasons() {
        assert_eq!(validate_full_name(""), Err(NameError::Length));
        assert_eq!(validate_full_name("   "), Err(NameError::Length));
        assert_eq!(validate_full_name("J"), Err(NameError::Length));
        assert_eq!(
            validate_full_name(&format!("{} {}", "a".repeat(30), "b".repeat(30))),
            Err(NameError::Length)
        );
        assert_eq!(validate_full_name("John"), Err(NameError::MissingLastName));
        assert_eq!(
            validate_full_name("J0hn Doe"),
            Err(NameError::InvalidCharacters)
        );
        assert_eq!(
            validate_full_name("John Doe!"),
            Err(NameError::InvalidCharacters)
        );
    }

    #[test]
    fn name_validation_accepts_and_collapses() {
        assert_eq!(validate_full_name("  John   Doe "), Ok("John Doe".into()));
        assert_eq!(
            validate_full_name("Mary-Jane O'Neil"),
            Ok("Mary-Jane O'Neil".into())
        );
    }

    #[test]
    fn name_errors_have_distinct_prompts() {
        let prompts = [
            NameError::Length.prompt(),
            NameError::MissingLastName.prompt(),
            NameError::InvalidCharacters.prompt(),
        ];
        assert_ne!(prompts[0], prompts[1]);
        assert_ne!(prompts[1], prompts[2]);
        assert_ne!(prompts[0], prompts[2]);
    }

    // ── Opening turn / regime ───────────────────────────────────────

    #[test]
    fn opening_turn_shows_entry_menu() {
        let t = reply(step(&session_at(MenuState::Welcome), None, Regime::Unregistered));
        assert_eq!(t.next_menu, MenuState::Welcome);
        assert_eq!(t.reply, UssdReply::con(prompts::WELCOME_MENU));

        let t = reply(step(&session_at(MenuState::Main), None, Regime::Registered));
        assert_eq!(t.reply, UssdReply::con(prompts::MAIN_MENU));
    }

    #[test]
    fn regime_mismatch_restarts_at_entry() {
        let mut session = session_at(MenuState::AgeEntry);
        session.draft.full_name = Some("John Okello".into());
        let t = reply(step(&session, Some("1"), Regime::Registered));
        assert_eq!(t.next_menu, MenuState::Main);
        assert!(t.draft.is_empty());
        assert!(t.reply.continues);
    }

    // ── Unregistered regime ─────────────────────────────────────────

    #[test]
    fn welcome_choices() {
        let s = session_at(MenuState::Welcome);

        let t = reply(step(&s, Some("1"), Regime::Unregistered));
        assert_eq!(t.next_menu, MenuState::NameEntry);
        assert!(t.reply.continues);

        let t = reply(step(&s, Some("2"), Regime::Unregistered));
        assert!(!t.reply.continues);
        assert_eq!(t.reply.text, prompts::ABOUT);

        for bad in ["3", "abc", "", "11"] {
            let t = reply(step(&s, Some(bad), Regime::Unregistered));
            assert_eq!(t.reply, UssdReply::end(prompts::INVALID_OPTION), "input {bad:?}");
            assert_eq!(t.status, SessionStatus::Ended);
        }
    }

    #[test]
    fn single_name_reprompts_for_last_name() {
        let s = session_at(MenuState::NameEntry);
        let t = reply(step(&s, Some("John"), Regime::Unregistered));
        assert_eq!(t.next_menu, MenuState::NameEntry);
        assert_eq!(t.reply, UssdReply::con(prompts::NAME_MISSING_LAST_ERROR));
        assert!(t.draft.full_name.is_none());
    }

    #[test]
    fn valid_name_advances_and_is_stored() {
        let s = session_at(MenuState::NameEntry);
        let t = reply(step(&s, Some("John Okello"), Regime::Unregistered));
        assert_eq!(t.next_menu, MenuState::GenderEntry);
        assert_eq!(t.draft.full_name.as_deref(), Some("John Okello"));
        assert_eq!(t.reply, UssdReply::con(prompts::GENDER_MENU));
    }

    #[test]
    fn choice_steps_reprompt_on_invalid_input() {
        let cases = [
            (MenuState::GenderEntry, "4", prompts::GENDER_MENU),
            (MenuState::AgeEntry, "0", prompts::AGE_MENU),
            (MenuState::DistrictEntry, "5", prompts::DISTRICT_MENU),
            (MenuState::BusinessStageEntry, "6", prompts::BUSINESS_STAGE_MENU),
            (MenuState::GenderEntry, "male", prompts::GENDER_MENU),
            (MenuState::AgeEntry, "", prompts::AGE_MENU),
        ];
        for (state, input, menu) in cases {
            let t = reply(step(&session_at(state), Some(input), Regime::Unregistered));
            assert_eq!(t.next_menu, state, "{state} with {input:?}");
            assert_eq!(t.reply, UssdReply::con(menu));
        }
    }

    #[test]
    fn wizard_accumulates_fields() {
        let mut session = session_at(MenuState::Welcome);
        for input in ["1", "Grace Atim", "2", "1", "3"] {
            let t = reply(step(&session, Some(input), Regime::Unregistered));
            session = t.apply_to(&session);
        }
        assert_eq!(session.current_menu, MenuState::BusinessStageEntry);
        assert_eq!(session.draft.gender, Some(Gender::Female));
        assert_eq!(session.draft.age_group, Some(AgeGroup::From18To24));
        assert_eq!(session.draft.district, Some(District::Mukono));
        assert!(session.draft.business_stage.is_none());
    }

    #[test]
    fn final_step_requests_submission() {
        let mut session = session_at(MenuState::BusinessStageEntry);
        session.draft = full_draft_without_stage();

        match step(&session, Some("3"), Regime::Unregistered) {
            Step::SubmitRegistration { draft, request } => {
                assert_eq!(draft.business_stage, Some(BusinessStage::Growth));
                assert_eq!(request.business_stage, BusinessStage::Growth);
                assert_eq!(request.first_name, "John");
                assert_eq!(request.last_name, "Okello");
                assert_eq!(request.phone_number, PHONE);
            }
            other => panic!("expected SubmitRegistration, got {other:?}"),
        }
    }

    #[test]
    fn incomplete_draft_at_final_step_is_terminal() {
        let session = session_at(MenuState::BusinessStageEntry);
        let t = reply(step(&session, Some("1"), Regime::Unregistered));
        assert!(!t.reply.continues);
        assert_eq!(t.next_menu, MenuState::Welcome);
    }

    #[test]
    fn registration_success_clears_draft() {
        let mut draft = full_draft_without_stage();
        draft.business_stage = Some(BusinessStage::Growth);
        let request = draft.to_request(PHONE).unwrap();

        let t = complete_registration(draft, &request, true);
        assert!(t.draft.is_empty());
        assert_eq!(t.next_menu, MenuState::Main);
        assert!(!t.reply.continues);
        assert!(t.reply.text.contains("John"));
    }

    #[test]
    fn registration_failure_keeps_draft_and_abandons() {
        let mut draft = full_draft_without_stage();
        draft.business_stage = Some(BusinessStage::Idea);
        let request = draft.to_request(PHONE).unwrap();

        let t = complete_registration(draft.clone(), &request, false);
        assert_eq!(t.draft, draft);
        assert_eq!(t.status, SessionStatus::Abandoned);
        assert_eq!(t.reply, UssdReply::end(prompts::REGISTRATION_FAILED));
    }

    // ── Registered regime ───────────────────────────────────────────

    #[test]
    fn main_menu_choices() {
        let s = session_at(MenuState::Main);
        let go = |input| reply(step(&s, Some(input), Regime::Registered));

        assert_eq!(go("1").next_menu, MenuState::Opportunities);
        assert!(go("1").reply.continues);
        assert_eq!(go("2").reply, UssdReply::end(prompts::MENTORSHIP_COMING_SOON));
        assert_eq!(go("3").reply, UssdReply::end(prompts::APPLICATIONS_COMING_SOON));
        assert_eq!(go("4").next_menu, MenuState::Profile);
        assert_eq!(go("5").reply, UssdReply::end(prompts::HELP));
        assert_eq!(go("9").reply, UssdReply::end(prompts::INVALID_OPTION));
        assert_eq!(go("x").reply, UssdReply::end(prompts::INVALID_OPTION));
    }

    #[test]
    fn opportunities_menu_choices() {
        let s = session_at(MenuState::Opportunities);
        assert_eq!(
            step(&s, Some("2"), Regime::Registered),
            Step::FetchOpportunities(OpportunityKind::Training)
        );

        let back = reply(step(&s, Some("4"), Regime::Registered));
        assert_eq!(back.next_menu, MenuState::Main);
        assert_eq!(back.reply, UssdReply::con(prompts::MAIN_MENU));

        let bad = reply(step(&s, Some("7"), Regime::Registered));
        assert_eq!(bad.reply, UssdReply::end(prompts::INVALID_OPTION));
    }

    #[test]
    fn opportunities_menu_zero_is_invalid() {
        let s = session_at(MenuState::Opportunities);
        let t = reply(step(&s, Some("0"), Regime::Registered));
        assert_eq!(t.reply, UssdReply::end(prompts::INVALID_OPTION));
        assert_eq!(t.next_menu, MenuState::Opportunities);
        assert_eq!(t.status, SessionStatus::Ended);
    }

    #[test]
    fn profile_menu_choices() {
        let s = session_at(MenuState::Profile);
        let go = |input| reply(step(&s, Some(input), Regime::Registered));

        assert_eq!(go("1").reply, UssdReply::end(prompts::PROFILE_VIEW));
        assert_eq!(go("2").reply, UssdReply::end(prompts::PROFILE_UPDATE));
        assert_eq!(go("3").next_menu, MenuState::Main);
        let again = go("8");
        assert_eq!(again.next_menu, MenuState::Profile);
        assert_eq!(again.reply, UssdReply::con(prompts::PROFILE_MENU));
    }

    #[test]
    fn opportunity_rendering() {
        let s = session_at(MenuState::Opportunities);

        let failed = show_opportunities(&s, OpportunityKind::Grant, None);
        assert_eq!(failed.reply, UssdReply::end(prompts::OPPORTUNITIES_UNAVAILABLE));

        let empty = show_opportunities(&s, OpportunityKind::Job, Some(&[][..]));
        assert_eq!(empty.reply, UssdReply::end(prompts::no_opportunities(OpportunityKind::Job)));

        let items = vec![OpportunityDigest {
            title: "Youth Venture Fund".into(),
            kind: OpportunityKind::Grant,
        }];
        let listed = show_opportunities(&s, OpportunityKind::Grant, Some(&items));
        assert!(!listed.reply.continues);
        assert!(listed.reply.text.contains("1. Youth Venture Fund"));
    }

    #[test]
    fn every_state_answers_every_input_class() {
        let states = [
            MenuState::Welcome,
            MenuState::NameEntry,
            MenuState::GenderEntry,
            MenuState::AgeEntry,
            MenuState::DistrictEntry,
            MenuState::BusinessStageEntry,
            MenuState::Main,
            MenuState::Opportunities,
            MenuState::Profile,
        ];
        let inputs = ["1", "99", "-1", "abc", "", "   "];

        for state in states {
            let regime = state.regime();
            let mut session = session_at(state);
            session.draft = full_draft_without_stage();
            for input in inputs {
                match step(&session, Some(input), regime) {
                    Step::Reply(t) => {
                        assert!(!t.reply.text.is_empty(), "{state} / {input:?}");
                        assert_eq!(t.next_menu.regime(), regime, "{state} / {input:?}");
                    }
                    Step::SubmitRegistration { .. } | Step::FetchOpportunities(_) => {}
                }
            }
        }
    }
}
