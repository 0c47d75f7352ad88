//! Marketplace - the wired set of accessors over one backend.
//!
//! ```ignore
//! let market = Marketplace::connect(&config)?;
//! let session = market.start_session();
//! if let SessionState::Authenticated(me) = session.settled().await {
//!     let chats = market.chats().for_user(me.user_id).await?;
//! }
//! ```

use std::sync::Arc;

use crate::adapters::supabase::{Connection, GoTrueGateway, PhoenixRealtime, PostgrestBackend};
use crate::application::auth::AuthService;
use crate::application::catalogue::{Categories, Products};
use crate::application::client::DataClient;
use crate::application::dispatcher::SubscriptionDispatcher;
use crate::application::interact::Interactions;
use crate::application::listing::Listings;
use crate::application::messaging::{Chats, Messages};
use crate::application::ordering::Carts;
use crate::application::profiles::Profiles;
use crate::application::reporting::Reports;
use crate::application::review::Reviews;
use crate::application::synchronizer::AuthSynchronizer;
use crate::config::AppConfig;
use crate::domain::foundation::DataResult;
use crate::domain::session::InstitutionEmail;
use crate::ports::{AuthGateway, Backend, RealtimeTransport};

/// Every feature accessor, sharing one client, dispatcher and auth gateway.
#[derive(Clone)]
pub struct Marketplace {
    client: DataClient,
    dispatcher: SubscriptionDispatcher,
    gateway: Arc<dyn AuthGateway>,
    policy: InstitutionEmail,
}

impl Marketplace {
    /// Wires the accessors over arbitrary port implementations.
    pub fn new(
        backend: Arc<dyn Backend>,
        transport: Arc<dyn RealtimeTransport>,
        gateway: Arc<dyn AuthGateway>,
        config: &AppConfig,
    ) -> Self {
        Self {
            client: DataClient::new(backend),
            dispatcher: SubscriptionDispatcher::new(
                transport,
                config.backend.schema.clone(),
                config.realtime.event_buffer,
            ),
            gateway,
            policy: InstitutionEmail::new(config.auth.institution_domain.clone()),
        }
    }

    /// Connects to the hosted services. Must run inside a tokio runtime.
    pub fn connect(config: &AppConfig) -> DataResult<Self> {
        let connection = Connection::new(&config.backend)?;
        let backend = Arc::new(PostgrestBackend::new(connection.clone()));
        let gateway = Arc::new(GoTrueGateway::new(connection.clone()));
        let transport = Arc::new(PhoenixRealtime::start(connection, &config.realtime));
        tracing::info!(origin = %config.backend.origin(), schema = %config.backend.schema, "marketplace connected");
        Ok(Self::new(backend, transport, gateway, config))
    }

    /// Starts the process-wide session synchronizer.
    pub fn start_session(&self) -> AuthSynchronizer {
        AuthSynchronizer::start(self.gateway.clone())
    }

    pub fn client(&self) -> &DataClient {
        &self.client
    }

    pub fn dispatcher(&self) -> &SubscriptionDispatcher {
        &self.dispatcher
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.gateway.clone(), self.policy.clone())
    }

    pub fn products(&self) -> Products {
        Products::new(self.client.clone())
    }

    pub fn categories(&self) -> Categories {
        Categories::new(self.client.clone())
    }

    pub fn listings(&self) -> Listings {
        Listings::new(self.client.clone())
    }

    pub fn chats(&self) -> Chats {
        Chats::new(self.client.clone(), self.dispatcher.clone())
    }

    pub fn messages(&self) -> Messages {
        Messages::new(self.client.clone(), self.dispatcher.clone())
    }

    pub fn carts(&self) -> Carts {
        Carts::new(self.client.clone())
    }

    pub fn reviews(&self) -> Reviews {
        Reviews::new(self.client.clone())
    }

    pub fn reports(&self) -> Reports {
        Reports::new(self.client.clone())
    }

    pub fn interactions(&self) -> Interactions {
        Interactions::new(self.client.clone())
    }

    pub fn profiles(&self) -> Profiles {
        Profiles::new(self.client.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBackend, InMemoryRealtime, MockAuthGateway};
    use crate::config::BackendConfig;
    use serde_json::json;

    #[tokio::test]
    async fn accessors_share_the_backend() {
        let backend = Arc::new(InMemoryBackend::new());
        let config = AppConfig::new(BackendConfig::new("http://localhost:54321", "anon"));
        let market = Marketplace::new(
            backend.clone(),
            Arc::new(InMemoryRealtime::new()),
            Arc::new(MockAuthGateway::new()),
            &config,
        );
        backend.respond_with("Category_Tags", json!([]));
        backend.respond_with("Product_Information", json!([]));

        market.categories().tags().await.unwrap();
        market
            .products()
            .get([crate::domain::foundation::ProductId::new(1)])
            .await
            .unwrap();

        assert_eq!(backend.request_count(), 2);
    }

    #[tokio::test]
    async fn auth_uses_the_configured_domain() {
        let gateway = Arc::new(MockAuthGateway::new());
        let mut config = AppConfig::new(BackendConfig::new("http://localhost:54321", "anon"));
        config.auth.institution_domain = "ucalgary.ca".to_string();
        let market = Marketplace::new(
            Arc::new(InMemoryBackend::new()),
            Arc::new(InMemoryRealtime::new()),
            gateway.clone(),
            &config,
        );

        assert!(market.auth().sign_in("sam@mtroyal.ca", "pw").await.is_err());
        assert_eq!(gateway.call_count(), 0);
    }
}
