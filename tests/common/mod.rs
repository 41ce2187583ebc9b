#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use cinevault::billing::{
    CreatedSubscription, Invoice, PaymentError, PaymentIntent, PaymentProcessor,
    ProcessorSubscription, WebhookEvent, signature,
};
use cinevault::clients::google::{GoogleIdentity, GoogleVerifier};
use cinevault::clients::stripe::parse_event;
use cinevault::config::Config;
use cinevault::db::Store;
use cinevault::domain::{Role, SubscriptionStatus};
use cinevault::state::SharedState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// In-memory payment processor.
#[derive(Default)]
pub struct MockPaymentProcessor {
    pub subscriptions: Mutex<HashMap<String, ProcessorSubscription>>,
    pub invoices: Mutex<HashMap<String, Invoice>>,
    pub intents: Mutex<HashMap<String, PaymentIntent>>,
    pub customers_created: Mutex<Vec<String>>,
    /// Makes the next processor call fail with an API error.
    pub fail_next: Mutex<bool>,
}

impl MockPaymentProcessor {
    fn check_failure(&self) -> Result<(), PaymentError> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(PaymentError::Api {
                status: 402,
                message: "Your card was declined.".to_string(),
            });
        }
        Ok(())
    }

    pub fn put_subscription(&self, sub: ProcessorSubscription) {
        self.subscriptions.lock().unwrap().insert(sub.id.clone(), sub);
    }

    pub fn put_invoice(&self, invoice: Invoice) {
        self.invoices.lock().unwrap().insert(invoice.id.clone(), invoice);
    }

    pub fn fail_next_call(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn create_customer(&self, email: &str, _name: &str) -> Result<String, PaymentError> {
        self.check_failure()?;
        let mut customers = self.customers_created.lock().unwrap();
        let id = format!("cus_{}", customers.len() + 1);
        customers.push(email.to_string());
        Ok(id)
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<CreatedSubscription, PaymentError> {
        self.check_failure()?;
        let id = format!("sub_{}", self.subscriptions.lock().unwrap().len() + 1);
        let invoice_id = format!("in_{id}");
        self.put_invoice(Invoice {
            id: invoice_id.clone(),
            paid: false,
            payment_intent: Some(format!("pi_{id}")),
        });
        self.put_subscription(ProcessorSubscription {
            id: id.clone(),
            customer: customer_id.to_string(),
            status: SubscriptionStatus::Incomplete,
            created: Some(chrono::Utc::now().timestamp()),
            current_period_end: None,
            latest_invoice: Some(invoice_id),
            plan_id: Some(price_id.to_string()),
        });

        Ok(CreatedSubscription {
            client_secret: Some(format!("pi_{id}_secret")),
            subscription_id: id,
            customer_id: customer_id.to_string(),
            status: SubscriptionStatus::Incomplete,
        })
    }

    async fn retrieve_subscription(
        &self,
        id: &str,
    ) -> Result<ProcessorSubscription, PaymentError> {
        self.check_failure()?;
        self.subscriptions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::Api {
                status: 404,
                message: format!("No such subscription: '{id}'"),
            })
    }

    async fn retrieve_invoice(&self, id: &str) -> Result<Invoice, PaymentError> {
        self.invoices
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::Api {
                status: 404,
                message: format!("No such invoice: '{id}'"),
            })
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        self.intents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::Api {
                status: 404,
                message: format!("No such payment_intent: '{id}'"),
            })
    }

    fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        signature::verify(
            payload,
            signature_header,
            WEBHOOK_SECRET,
            300,
            chrono::Utc::now().timestamp(),
        )?;
        parse_event(payload)
    }
}

/// Accepts tokens of the form `google:<sub>:<email>:<name>`.
pub struct MockGoogleVerifier;

#[async_trait]
impl GoogleVerifier for MockGoogleVerifier {
    async fn verify_id_token(&self, id_token: &str) -> anyhow::Result<GoogleIdentity> {
        let parts: Vec<&str> = id_token.splitn(4, ':').collect();
        let ["google", subject, email, name] = parts.as_slice() else {
            bail!("Token used too late or malformed");
        };
        Ok(GoogleIdentity {
            subject: (*subject).to_string(),
            email: (*email).to_string(),
            name: (*name).to_string(),
            email_verified: true,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Store,
    pub payments: Arc<MockPaymentProcessor>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.jwt_secret = "integration-test-secret-0123456789".to_string();
    // Keep hashing fast in tests
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.payments.webhook_secret = WEBHOOK_SECRET.to_string();
    config.payments.default_price_id = Some("price_basic".to_string());
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let payments = Arc::new(MockPaymentProcessor::default());
    let shared = SharedState::with_clients(
        config,
        payments.clone(),
        Some(Arc::new(MockGoogleVerifier)),
    )
    .await
    .expect("Failed to create shared state");

    let store = shared.store.clone();
    let state = cinevault::api::create_app_state(Arc::new(shared), None);

    TestApp {
        router: cinevault::api::router(state),
        store,
        payments,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Signs up a password account and returns its token.
    pub async fn signup(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/signup",
                None,
                json!({ "name": name, "email": email, "password": "secret123" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Signs up an account, promotes it to admin and returns its token.
    pub async fn admin(&self) -> String {
        let token = self.signup("admin", "admin@cinevault.test").await;
        assert!(
            self.store
                .set_user_role("admin@cinevault.test", Role::Admin)
                .await
                .unwrap()
        );
        token
    }

    pub async fn add_movie(&self, admin_token: &str, movie: Value) -> (StatusCode, Value) {
        self.post("/api/movies/admin/movies", Some(admin_token), movie)
            .await
    }
}

pub fn movie_json(tmdb_id: &str, title: &str, genre: &[&str], kind: &[&str], release: &str) -> Value {
    json!({
        "tmdbId": tmdb_id,
        "title": title,
        "description": format!("About {title}"),
        "videoUrl": format!("https://cdn.cinevault.test/{tmdb_id}.m3u8"),
        "posterPath": format!("/posters/{tmdb_id}.jpg"),
        "genre": genre,
        "type": kind,
        "rating": 4.0,
        "releaseDate": release,
    })
}
