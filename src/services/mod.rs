pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{CatalogError, CatalogPage, CatalogService};
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod engagement_service;
pub mod engagement_service_impl;
pub use engagement_service::{Author, Draft, EngagementError, EngagementService};
pub use engagement_service_impl::SeaOrmEngagementService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService, Session};
pub use account_service_impl::SeaOrmAccountService;

pub mod library_service;
pub mod library_service_impl;
pub use library_service::LibraryService;
pub use library_service_impl::SeaOrmLibraryService;

pub mod billing_service;
pub mod billing_service_impl;
pub use billing_service::{BillingError, BillingService, SubscriptionCheckout, WebhookOutcome};
pub use billing_service_impl::SeaOrmBillingService;
