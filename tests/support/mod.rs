//! In-memory doubles for the store and geocoder seams, plus request helpers
//! for driving the router in-process.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use circleats::{
    accounts::{Account, AccountStore},
    config::Config,
    donations::DonationRegistry,
    error::AppError,
    geocode::Geocoder,
    models::{Donation, NewDonation, Notification, Scope, Transition},
    state::AppState,
};

#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<Vec<Account>>,
    donations: Mutex<Vec<Donation>>,
}

impl MemoryStore {
    pub fn stored_password(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|account| account.email == email)
            .map(|account| account.password_hash.clone())
    }

    pub fn donation(&self, id: &str) -> Option<Donation> {
        self.donations
            .lock()
            .unwrap()
            .iter()
            .find(|donation| donation.id == id)
            .cloned()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|account| account.id == id)
            .cloned())
    }

    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let id = format!("account-{}", accounts.len() + 1);

        accounts.push(Account {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        });

        Ok(())
    }
}

#[async_trait]
impl DonationRegistry for MemoryStore {
    async fn insert(&self, new: NewDonation) -> Result<String, AppError> {
        let mut donations = self.donations.lock().unwrap();
        let id = format!("donation-{}", donations.len() + 1);

        donations.push(Donation::new(id.clone(), new));

        Ok(id)
    }

    async fn apply(&self, id: &str, transition: Transition) -> Result<(), AppError> {
        let mut donations = self.donations.lock().unwrap();
        let donation = donations
            .iter_mut()
            .find(|donation| donation.id == id)
            .ok_or(AppError::NotFound)?;

        if !transition.allowed_from().contains(&donation.status) {
            return Err(AppError::InvalidTransition);
        }

        transition.apply(donation);

        Ok(())
    }

    async fn list(&self, scope: Scope) -> Result<Vec<Donation>, AppError> {
        Ok(self
            .donations
            .lock()
            .unwrap()
            .iter()
            .filter(|donation| scope.matches(donation))
            .cloned()
            .collect())
    }

    async fn notifications_for(
        &self,
        recipients: &[String],
    ) -> Result<Vec<Notification>, AppError> {
        Ok(self
            .donations
            .lock()
            .unwrap()
            .iter()
            .flat_map(|donation| donation.notifications.clone())
            .filter(|notification| recipients.contains(&notification.recipient))
            .collect())
    }
}

pub struct StubGeocoder(pub &'static str);

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<String, AppError> {
        Ok(self.0.to_string())
    }
}

pub struct FailingGeocoder;

#[async_trait]
impl Geocoder for FailingGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<String, AppError> {
        Err(AppError::GeocodingFailed("stubbed failure".to_string()))
    }
}

fn test_config() -> Config {
    Config {
        port: 0,
        mongo_uri: String::new(),
        geocoder_url: String::new(),
        geocoder_timeout_ms: 0,
    }
}

pub fn app_with_geocoder(geocoder: Arc<dyn Geocoder>) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let state = AppState::with_parts(test_config(), store.clone(), store.clone(), geocoder);

    (circleats::router(state), store)
}

pub fn test_app() -> (Router, Arc<MemoryStore>) {
    app_with_geocoder(Arc::new(StubGeocoder("MG Road, Bengaluru")))
}

pub async fn send(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);

    let request = match body {
        Some(value) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

pub async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    send(app, "GET", path, None).await
}

pub async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", path, Some(body)).await
}

pub async fn put(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    send(app, "PUT", path, Some(body)).await
}
