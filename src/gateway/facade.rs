//! Degrading facade over [`PlatformGateway`] with a registration-status cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{info, warn};

use super::PlatformGateway;
use super::model::{OpportunityDigest, OpportunityKind, RegistrationRequest};

/// What the menu engine sees of the collaborators.
///
/// Registration outcomes and lookups degrade to `false`; opportunity
/// lookups degrade to `None` so "unavailable" stays distinct from "empty".
/// Only positive registration lookups are cached.
pub struct GatewayFacade {
    gateway: Arc<dyn PlatformGateway>,
    registered: RwLock<HashMap<String, Instant>>,
    cache_ttl: Duration,
}

impl GatewayFacade {
    pub fn new(gateway: Arc<dyn PlatformGateway>, cache_ttl: Duration) -> Self {
        Self {
            gateway,
            registered: RwLock::new(HashMap::new()),
            cache_ttl,
        }
    }

    async fn cached_registered(&self, phone: &str) -> bool {
        let cache = self.registered.read().await;
        cache
            .get(phone)
            .is_some_and(|at| at.elapsed() < self.cache_ttl)
    }

    async fn remember_registered(&self, phone: &str) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let mut cache = self.registered.write().await;
        cache.retain(|_, at| at.elapsed() < self.cache_ttl);
        cache.insert(phone.to_string(), Instant::now());
    }

    /// Submit a registration. `true` only on confirmed success.
    pub async fn register_user(&self, request: &RegistrationRequest, session_id: &str) -> bool {
        match self.gateway.register_user(request, session_id).await {
            Ok(()) => {
                info!(session_id, "Registration submitted");
                self.remember_registered(&request.phone_number).await;
                true
            }
            Err(e) => {
                warn!(session_id, error = %e, "Registration submission failed");
                false
            }
        }
    }

    /// Whether `phone` is registered. Lookup failures count as unregistered.
    pub async fn is_registered(&self, phone: &str, session_id: &str) -> bool {
        if self.cached_registered(phone).await {
            return true;
        }

        match self.gateway.is_registered(phone, session_id).await {
            Ok(true) => {
                self.remember_registered(phone).await;
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(session_id, error = %e, "Registration lookup failed, assuming unregistered");
                false
            }
        }
    }

    /// Open opportunities of `kind`, or `None` if the lookup failed.
    pub async fn fetch_opportunities(
        &self,
        kind: OpportunityKind,
        session_id: &str,
    ) -> Option<Vec<OpportunityDigest>> {
        match self.gateway.fetch_opportunities(kind, session_id).await {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(session_id, kind = kind.as_query(), error = %e, "Opportunity lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::model::{AgeGroup, BusinessStage, District, Gender};

    /// Scripted gateway counting lookups.
    struct ScriptedGateway {
        registered: bool,
        fail: bool,
        lookups: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(registered: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                registered,
                fail,
                lookups: AtomicUsize::new(0),
            })
        }

        fn failure() -> GatewayError {
            GatewayError::Server {
                operation: "test".into(),
                status: 500,
            }
        }
    }

    #[async_trait]
    impl PlatformGateway for ScriptedGateway {
        async fn register_user(
            &self,
            _request: &RegistrationRequest,
            _session_id: &str,
        ) -> Result<(), GatewayError> {
            if self.fail { Err(Self::failure()) } else { Ok(()) }
        }

        async fn is_registered(&self, _phone: &str, _session_id: &str) -> Result<bool, GatewayError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Self::failure())
            } else {
                Ok(self.registered)
            }
        }

        async fn fetch_opportunities(
            &self,
            _kind: OpportunityKind,
            _session_id: &str,
        ) -> Result<Vec<OpportunityDigest>, GatewayError> {
            if self.fail { Err(Self::failure()) } else { Ok(vec![]) }
        }
    }

    fn request() -> RegistrationRequest {
        RegistrationRequest {
            phone_number: "256701234567".into(),
            first_name: "Peter".into(),
            last_name: "Mugisha".into(),
            gender: Gender::Male,
            age_group: AgeGroup::From31To35,
            district: District::Kampala,
            business_stage: BusinessStage::Established,
            source: "USSD".into(),
        }
    }

    #[tokio::test]
    async fn positive_lookups_are_cached() {
        let gateway = ScriptedGateway::new(true, false);
        let facade = GatewayFacade::new(gateway.clone(), Duration::from_secs(60));

        assert!(facade.is_registered("256701234567", "s1").await);
        assert!(facade.is_registered("256701234567", "s2").await);
        assert_eq!(gateway.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn negative_lookups_are_not_cached() {
        let gateway = ScriptedGateway::new(false, false);
        let facade = GatewayFacade::new(gateway.clone(), Duration::from_secs(60));

        assert!(!facade.is_registered("256701234567", "s1").await);
        assert!(!facade.is_registered("256701234567", "s1").await);
        assert_eq!(gateway.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn successful_registration_seeds_cache() {
        let gateway = ScriptedGateway::new(false, false);
        let facade = GatewayFacade::new(gateway.clone(), Duration::from_secs(60));

        assert!(facade.register_user(&request(), "s1").await);
        assert!(facade.is_registered("256701234567", "s2").await);
        assert_eq!(gateway.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_degrade_to_defaults() {
        let facade = GatewayFacade::new(ScriptedGateway::new(true, true), Duration::from_secs(60));

        assert!(!facade.register_user(&request(), "s1").await);
        assert!(!facade.is_registered("256701234567", "s1").await);
        assert!(
            facade
                .fetch_opportunities(OpportunityKind::Grant, "s1")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let gateway = ScriptedGateway::new(true, false);
        let facade = GatewayFacade::new(gateway.clone(), Duration::ZERO);

        facade.is_registered("256701234567", "s1").await;
        facade.is_registered("256701234567", "s1").await;
        assert_eq!(gateway.lookups.load(Ordering::SeqCst), 2);
    }
}
