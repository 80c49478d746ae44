//! Donation registry operations.
//!
//! The registry seam keeps handlers independent of the concrete store; the
//! MongoDB binding lives in [`crate::database`]. Transition rules themselves
//! are on [`Transition`](crate::models::Transition) so every store applies
//! the same state machine.

use async_trait::async_trait;

use crate::{
    error::AppError,
    geocode::{Geocoder, resolve_location},
    models::{Donation, NewDonation, Notification, Scope, ShelterRequest, Transition},
};

#[async_trait]
pub trait DonationRegistry: Send + Sync {
    /// Insert a new pending donation, returning its id in portable string
    /// form.
    async fn insert(&self, new: NewDonation) -> Result<String, AppError>;

    /// Apply a transition as a single compare-and-swap update.
    ///
    /// `NotFound` if the id resolves to nothing, `InvalidTransition` if the
    /// record exists but its status is outside the transition's source
    /// states.
    async fn apply(&self, id: &str, transition: Transition) -> Result<(), AppError>;

    /// All donations visible under the scope, in insertion order.
    async fn list(&self, scope: Scope) -> Result<Vec<Donation>, AppError>;

    /// Every notification addressed to any of the given recipient keys,
    /// flattened across all donations.
    async fn notifications_for(&self, recipients: &[String]) -> Result<Vec<Notification>, AppError>;
}

/// Shelter requests delivery of a donation.
///
/// A `"lat,lon"` location is resolved to a display address first; if the
/// geocoder fails nothing is written.
pub async fn request_donation(
    registry: &dyn DonationRegistry,
    geocoder: &dyn Geocoder,
    id: &str,
    shelter: String,
    location: String,
    self_pickup: bool,
) -> Result<(), AppError> {
    let location = resolve_location(geocoder, location).await?;

    registry
        .apply(
            id,
            Transition::Request {
                shelter: ShelterRequest {
                    email: shelter,
                    location,
                    self_pickup,
                },
            },
        )
        .await
}

/// Shelter accepts a donation directly from the donor.
pub async fn shelter_accept(
    registry: &dyn DonationRegistry,
    id: &str,
    shelter: String,
    location: String,
) -> Result<(), AppError> {
    if shelter.trim().is_empty() || location.trim().is_empty() {
        return Err(AppError::InvalidInput("Shelter and location are required"));
    }

    registry
        .apply(id, Transition::ShelterAccept { shelter, location })
        .await
}
