use std::sync::Arc;

use crate::auth::TokenManager;
use crate::billing::PaymentProcessor;
use crate::catalog::QueryBuilder;
use crate::clients::google::{GoogleTokenInfoClient, GoogleVerifier};
use crate::clients::stripe::{StripeClient, StripeConfig};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, BillingService, CatalogService, EngagementService, LibraryService,
    SeaOrmAccountService, SeaOrmBillingService, SeaOrmCatalogService, SeaOrmEngagementService,
    SeaOrmLibraryService,
};

/// Everything a request handler may touch. Built once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenManager>,

    pub catalog_service: Arc<dyn CatalogService>,

    pub engagement_service: Arc<dyn EngagementService>,

    pub account_service: Arc<dyn AccountService>,

    pub library_service: Arc<dyn LibraryService>,

    pub billing_service: Arc<dyn BillingService>,
}

impl SharedState {
    /// Connects the store and the real Stripe and Google clients.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let payments: Arc<dyn PaymentProcessor> = Arc::new(StripeClient::new(StripeConfig {
            api_base: config.payments.stripe_api_base.clone(),
            secret_key: config.payments.stripe_secret_key.clone(),
            webhook_secret: config.payments.webhook_secret.clone(),
            webhook_tolerance_secs: config.payments.webhook_tolerance_secs,
        }));

        let google: Option<Arc<dyn GoogleVerifier>> = if config.google.client_id.is_empty() {
            tracing::info!("GOOGLE_CLIENT_ID not set, Google sign-in disabled");
            None
        } else {
            Some(Arc::new(GoogleTokenInfoClient::new(
                config.google.tokeninfo_url.clone(),
                config.google.client_id.clone(),
            )))
        };

        Self::with_clients(config, payments, google).await
    }

    /// Like [`SharedState::new`] with injected external clients.
    pub async fn with_clients(
        config: Config,
        payments: Arc<dyn PaymentProcessor>,
        google: Option<Arc<dyn GoogleVerifier>>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = Arc::new(TokenManager::new(
            &config.security.jwt_secret,
            config.security.token_ttl_hours,
        ));

        let query_builder = QueryBuilder::new(
            config.catalog.page_size,
            config.catalog.paginate_category_filters,
        );

        let catalog_service =
            Arc::new(SeaOrmCatalogService::new(store.clone(), query_builder)) as Arc<dyn CatalogService>;

        let engagement_service =
            Arc::new(SeaOrmEngagementService::new(store.clone())) as Arc<dyn EngagementService>;

        let account_service = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            tokens.clone(),
            google,
            config.security.clone(),
        )) as Arc<dyn AccountService>;

        let library_service =
            Arc::new(SeaOrmLibraryService::new(store.clone())) as Arc<dyn LibraryService>;

        let billing_service = Arc::new(SeaOrmBillingService::new(
            store.clone(),
            payments,
            config.payments.default_price_id.clone(),
        )) as Arc<dyn BillingService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            catalog_service,
            engagement_service,
            account_service,
            library_service,
            billing_service,
        })
    }
}
