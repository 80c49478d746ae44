use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    accounts, donations,
    error::AppError,
    models::{Donation, NewDonation, Notification, Scope, Transition},
    state::AppState,
};

#[derive(Deserialize)]
pub struct SignupPayload {
    name: String,
    email: String,
    password: String,
}

pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    accounts::signup(
        state.accounts.as_ref(),
        &payload.name,
        &payload.email,
        &payload.password,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Signup successful!" })),
    ))
}

#[derive(Deserialize)]
pub struct LoginPayload {
    email: String,
    password: String,
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<Value>, AppError> {
    let account = accounts::login(state.accounts.as_ref(), &payload.email, &payload.password).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "user_id": account.id,
        "name": account.name,
        "email": account.email,
    })))
}

pub async fn create_donation_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewDonation>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.donations.insert(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Donation created" })),
    ))
}

pub async fn donations_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(state.donations.list(Scope::All).await?))
}

pub async fn my_donations_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(state.donations.list(Scope::Owner(user_id)).await?))
}

/// Donor notifications. Donors are addressed by user id, but an account's
/// email is included too so messages sent to it as a shelter or volunteer
/// show up in the same feed.
pub async fn my_notifications_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let mut recipients = vec![user_id.clone()];

    if let Some(account) = state.accounts.find_by_id(&user_id).await? {
        recipients.push(account.email);
    }

    Ok(Json(state.donations.notifications_for(&recipients).await?))
}

pub async fn notifications_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.donations.notifications_for(&[email]).await?))
}

#[derive(Deserialize)]
pub struct ShelterRequestPayload {
    shelter: String,
    location: String,
    #[serde(default)]
    self_pickup: bool,
}

pub async fn shelter_request_handler(
    State(state): State<Arc<AppState>>,
    Path(donation_id): Path<String>,
    Json(payload): Json<ShelterRequestPayload>,
) -> Result<Json<Value>, AppError> {
    donations::request_donation(
        state.donations.as_ref(),
        state.geocoder.as_ref(),
        &donation_id,
        payload.shelter,
        payload.location,
        payload.self_pickup,
    )
    .await?;

    Ok(Json(json!({ "message": "Request submitted" })))
}

pub async fn shelter_requests_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(state.donations.list(Scope::OpenRequests).await?))
}

pub async fn my_requests_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(
        state.donations.list(Scope::ShelterRequester(email)).await?,
    ))
}

#[derive(Deserialize)]
pub struct VolunteerPayload {
    volunteer: String,
}

pub async fn accept_delivery_handler(
    State(state): State<Arc<AppState>>,
    Path(donation_id): Path<String>,
    Json(payload): Json<VolunteerPayload>,
) -> Result<Json<Value>, AppError> {
    state
        .donations
        .apply(
            &donation_id,
            Transition::Accept {
                volunteer: payload.volunteer,
            },
        )
        .await?;

    Ok(Json(json!({ "message": "Delivery accepted" })))
}

/// Legacy route name for the same volunteer-acceptance transition.
pub async fn collect_donation_handler(
    State(state): State<Arc<AppState>>,
    Path(donation_id): Path<String>,
    Json(payload): Json<VolunteerPayload>,
) -> Result<Json<Value>, AppError> {
    state
        .donations
        .apply(
            &donation_id,
            Transition::Accept {
                volunteer: payload.volunteer,
            },
        )
        .await?;

    Ok(Json(json!({ "message": "Donation collected" })))
}

pub async fn my_deliveries_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(state.donations.list(Scope::Volunteer(email)).await?))
}

#[derive(Deserialize)]
pub struct ShelterAcceptPayload {
    #[serde(default)]
    shelter: String,
    #[serde(default)]
    location: String,
}

pub async fn shelter_accept_handler(
    State(state): State<Arc<AppState>>,
    Path(donation_id): Path<String>,
    Json(payload): Json<ShelterAcceptPayload>,
) -> Result<Json<Value>, AppError> {
    donations::shelter_accept(
        state.donations.as_ref(),
        &donation_id,
        payload.shelter,
        payload.location,
    )
    .await?;

    Ok(Json(json!({ "message": "Donation accepted" })))
}

#[derive(Deserialize)]
pub struct DonateToShelterPayload {
    shelter: String,
}

pub async fn donate_to_shelter_handler(
    State(state): State<Arc<AppState>>,
    Path(donation_id): Path<String>,
    Json(payload): Json<DonateToShelterPayload>,
) -> Result<Json<Value>, AppError> {
    state
        .donations
        .apply(
            &donation_id,
            Transition::Deliver {
                shelter: payload.shelter,
            },
        )
        .await?;

    Ok(Json(json!({ "message": "Donation delivered" })))
}

pub async fn home_handler() -> Json<Value> {
    Json(json!({ "message": "CirclEats backend running!" }))
}
