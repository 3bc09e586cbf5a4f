use crate::config::StoreBackend;
use workhub_auth::{
    AuthService, DynNotifier, IntakeService, InvitationService, JwtService, OnboardingConfig,
};
use workhub_authz::AuthorizationResolver;
use workhub_cache::Cache;
use workhub_database::{DynIdentityStore, DynTenantStore};
use workhub_tenant::{WorkspaceComposer, WorkspaceService};

pub struct AppState {
    pub auth_service: AuthService,
    pub workspace_service: WorkspaceService,
    pub composer: WorkspaceComposer,
    pub invitation_service: InvitationService,
    pub intake_service: IntakeService,
    /// Rate limiting is skipped when no cache is available.
    pub cache: Option<Cache>,
    pub store: StoreBackend,
    /// Honour X-Forwarded-For / X-Real-IP when keying rate limits.
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(
        identities: DynIdentityStore,
        tenants: DynTenantStore,
        notifier: DynNotifier,
        jwt: JwtService,
        onboarding: OnboardingConfig,
        cache: Option<Cache>,
        store: StoreBackend,
    ) -> Self {
        let authz = AuthorizationResolver::new(identities.clone(), tenants.clone());

        Self {
            auth_service: AuthService::new(identities.clone(), jwt.clone()),
            workspace_service: WorkspaceService::new(tenants.clone(), authz.clone()),
            composer: WorkspaceComposer::new(identities.clone(), tenants.clone(), authz.clone()),
            invitation_service: InvitationService::new(
                identities,
                tenants.clone(),
                authz.clone(),
                notifier.clone(),
                jwt,
                onboarding.clone(),
            ),
            intake_service: IntakeService::new(tenants, authz, notifier, onboarding),
            cache,
            store,
            trust_proxy_headers: false,
        }
    }

    pub fn with_trusted_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}
