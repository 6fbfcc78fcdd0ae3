//! Request handler: runs one aggregator callback through validation,
//! session lookup, the menu engine and persistence.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::gateway::GatewayFacade;
use crate::input;
use crate::menu::machine::{self, Step};
use crate::menu::prompts;
use crate::menu::state::Regime;
use crate::reply::UssdReply;
use crate::session::{Session, SessionStore};

/// One inbound callback, as sent by the aggregator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub service_code: Option<String>,
    /// Keystroke history joined by `*`; empty or absent on the opening turn.
    #[serde(default)]
    pub text: Option<String>,
}

impl UssdRequest {
    pub fn new(session_id: &str, phone_number: &str, text: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            phone_number: phone_number.to_string(),
            service_code: None,
            text: Some(text.to_string()),
        }
    }
}

/// Orchestrates a callback. Holds no per-session state of its own.
pub struct UssdHandler {
    store: Arc<dyn SessionStore>,
    gateway: Arc<GatewayFacade>,
}

impl UssdHandler {
    pub fn new(store: Arc<dyn SessionStore>, gateway: Arc<GatewayFacade>) -> Self {
        Self { store, gateway }
    }

    /// Handle a callback. Always produces a reply; internal failures become
    /// a terminal "service unavailable" message.
    pub async fn handle(&self, request: &UssdRequest) -> UssdReply {
        match self.process(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    session_id = %request.session_id,
                    service_code = ?request.service_code,
                    error = %e,
                    "USSD callback failed"
                );
                UssdReply::end(prompts::SERVICE_UNAVAILABLE)
            }
        }
    }

    /// Number of sessions held by the store.
    pub async fn session_count(&self) -> usize {
        self.store.len().await
    }

    async fn process(&self, request: &UssdRequest) -> Result<UssdReply, StoreError> {
        let session_id = request.session_id.as_str();
        let text = request.text.as_deref().unwrap_or("");

        let phone = match input::validate_callback(session_id, &request.phone_number, text) {
            Ok(phone) => phone,
            Err(e) => {
                warn!(
                    session_id = %session_id.chars().take(input::MAX_SESSION_ID_LENGTH).collect::<String>(),
                    text_len = text.len(),
                    error = %e,
                    "Rejected USSD callback"
                );
                return Ok(UssdReply::end(prompts::INVALID_REQUEST));
            }
        };

        let stored = self.store.load(session_id).await?;

        let registered = self.gateway.is_registered(phone.as_str(), session_id).await;
        let regime = Regime::from_registered(registered);

        let session = match stored {
            Some(session) if session.phone_number == phone.as_str() => session,
            Some(_) => {
                warn!(
                    session_id,
                    phone = %phone.masked(),
                    "Session id reused with a different phone, starting fresh"
                );
                Session::new(session_id, phone.as_str(), regime.entry_state())
            }
            None => {
                info!(
                    session_id,
                    phone = %phone.masked(),
                    registered,
                    "New USSD session"
                );
                Session::new(session_id, phone.as_str(), regime.entry_state())
            }
        };

        let latest = input::latest_input(text);
        let transition = match machine::step(&session, latest, regime) {
            Step::Reply(transition) => transition,
            Step::SubmitRegistration { draft, request } => {
                let ok = self.gateway.register_user(&request, session_id).await;
                info!(session_id, phone = %phone.masked(), success = ok, "Registration completed");
                machine::complete_registration(draft, &request, ok)
            }
            Step::FetchOpportunities(kind) => {
                let items = self.gateway.fetch_opportunities(kind, session_id).await;
                machine::show_opportunities(&session, kind, items.as_deref())
            }
        };

        debug!(
            session_id,
            from = %session.current_menu,
            to = %transition.next_menu,
            continues = transition.reply.continues,
            "Menu transition"
        );

        let next = transition.apply_to(&session);
        self.store.save(&next).await?;

        Ok(transition.reply)
    }
}
