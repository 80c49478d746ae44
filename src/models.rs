//! # Donation Records
//!
//! Core records of the platform and the rules that move them.
//!
//! A donation is created by a donor, requested by a shelter, and then either
//! collected by a volunteer and handed off, or accepted by the shelter
//! directly for self pickup. Every step is a [`Transition`] with a fixed set
//! of source states, so a record can only move forward:
//!
//! `Pending -> Requested -> In Transit -> Donated`
//!
//! Role fields (`requested_by`, `accepted_by`/`collected_by`, `donated_to`)
//! are written once by the transition that introduces them and never
//! cleared. Counterpart roles are told about a transition through the
//! embedded, append-only `notifications` list.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationStatus {
    Pending,
    Requested,
    #[serde(rename = "In Transit")]
    InTransit,
    Donated,
}

impl DonationStatus {
    /// Wire form, matching what existing datasets store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Requested => "Requested",
            Self::InTransit => "In Transit",
            Self::Donated => "Donated",
        }
    }
}

/// Shelter-side details of a delivery request, embedded in the donation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShelterRequest {
    pub email: String,
    pub location: String,
    pub self_pickup: bool,
}

/// One entry of a donation's append-only notification log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipient: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Donation {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: Option<String>,
    pub item: Option<String>,
    pub quantity: Option<i64>,
    pub location: Option<String>,
    pub status: DonationStatus,
    pub requested_by: Option<String>,
    pub accepted_by: Option<String>,
    pub collected_by: Option<String>,
    pub donated_to: Option<String>,
    pub shelter_location: Option<String>,
    pub shelter_request: Option<ShelterRequest>,
    pub notifications: Vec<Notification>,
}

/// Fields a donor supplies when creating an offer. Absent fields are stored
/// as nulls rather than rejected.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct NewDonation {
    pub user_id: Option<String>,
    pub item: Option<String>,
    pub quantity: Option<i64>,
    pub location: Option<String>,
}

impl Donation {
    pub fn new(id: String, new: NewDonation) -> Self {
        Self {
            id,
            user_id: new.user_id,
            item: new.item,
            quantity: new.quantity,
            location: new.location,
            status: DonationStatus::Pending,
            requested_by: None,
            accepted_by: None,
            collected_by: None,
            donated_to: None,
            shelter_location: None,
            shelter_request: None,
            notifications: Vec::new(),
        }
    }
}

/// A state-advancing action on a donation.
///
/// Each variant names the source states it is allowed from; applying one is
/// a compare-and-swap keyed on the current status, so two racing writers
/// cannot both win the same step.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Shelter requests delivery of a pending offer.
    Request { shelter: ShelterRequest },
    /// Volunteer takes over a requested delivery.
    Accept { volunteer: String },
    /// Shelter accepts directly from the donor, no volunteer involved.
    ShelterAccept { shelter: String, location: String },
    /// Volunteer hands the collected donation to the shelter.
    Deliver { shelter: String },
}

impl Transition {
    pub fn allowed_from(&self) -> &'static [DonationStatus] {
        match self {
            Self::Request { .. } => &[DonationStatus::Pending],
            Self::Accept { .. } => &[DonationStatus::Requested],
            Self::ShelterAccept { .. } => {
                &[DonationStatus::Pending, DonationStatus::Requested]
            }
            Self::Deliver { .. } => &[DonationStatus::InTransit],
        }
    }

    pub fn target(&self) -> DonationStatus {
        match self {
            Self::Request { .. } => DonationStatus::Requested,
            Self::Accept { .. } => DonationStatus::InTransit,
            Self::ShelterAccept { .. } | Self::Deliver { .. } => DonationStatus::Donated,
        }
    }

    /// Message for the counterpart role, if this step produces one.
    ///
    /// Shelters and volunteers are addressed by email, donors by their user
    /// id, matching how each role identifies itself to the API.
    pub fn notification(&self, donation: &Donation) -> Option<Notification> {
        match self {
            Self::Request { .. } => None,
            Self::Accept { volunteer } => {
                donation.requested_by.clone().map(|recipient| Notification {
                    recipient,
                    message: format!("Volunteer {volunteer} accepted your delivery request"),
                })
            }
            Self::ShelterAccept { shelter, .. } => {
                donation.user_id.clone().map(|recipient| Notification {
                    recipient,
                    message: format!("Shelter {shelter} accepted your donation"),
                })
            }
            Self::Deliver { .. } => {
                donation.requested_by.clone().map(|recipient| Notification {
                    recipient,
                    message: "Your requested donation has been delivered".to_string(),
                })
            }
        }
    }

    /// Apply this transition in place. The caller must have checked
    /// [`allowed_from`](Self::allowed_from) against the current status.
    pub fn apply(&self, donation: &mut Donation) {
        donation.status = self.target();

        match self {
            Self::Request { shelter } => {
                donation.requested_by = Some(shelter.email.clone());
                donation.shelter_request = Some(shelter.clone());
            }
            Self::Accept { volunteer } => {
                donation.accepted_by = Some(volunteer.clone());
                donation.collected_by = Some(volunteer.clone());
            }
            Self::ShelterAccept { shelter, location } => {
                donation.donated_to = Some(shelter.clone());
                donation.shelter_location = Some(location.clone());
            }
            Self::Deliver { shelter } => {
                donation.donated_to = Some(shelter.clone());
            }
        }

        if let Some(notification) = self.notification(donation) {
            donation.notifications.push(notification);
        }
    }
}

/// Role-scoped visibility over the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    All,
    Owner(String),
    ShelterRequester(String),
    Volunteer(String),
    /// Requested donations still needing a volunteer.
    OpenRequests,
}

impl Scope {
    pub fn matches(&self, donation: &Donation) -> bool {
        match self {
            Self::All => true,
            Self::Owner(user_id) => donation.user_id.as_deref() == Some(user_id),
            Self::ShelterRequester(email) => donation.requested_by.as_deref() == Some(email),
            Self::Volunteer(email) => donation.accepted_by.as_deref() == Some(email),
            Self::OpenRequests => {
                donation.status == DonationStatus::Requested
                    && donation
                        .shelter_request
                        .as_ref()
                        .is_some_and(|request| !request.self_pickup)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Donation {
        Donation::new(
            "d1".to_string(),
            NewDonation {
                user_id: Some("donor-1".to_string()),
                item: Some("rice".to_string()),
                quantity: Some(5),
                location: Some("Warehouse 4".to_string()),
            },
        )
    }

    fn request() -> Transition {
        Transition::Request {
            shelter: ShelterRequest {
                email: "s@x.com".to_string(),
                location: "MG Road, Bengaluru".to_string(),
                self_pickup: false,
            },
        }
    }

    #[test]
    fn test_new_donation_is_pending() {
        let donation = pending();

        assert_eq!(donation.status, DonationStatus::Pending);
        assert!(donation.requested_by.is_none());
        assert!(donation.accepted_by.is_none());
        assert!(donation.donated_to.is_none());
        assert!(donation.notifications.is_empty());
    }

    #[test]
    fn test_request_sets_shelter_fields() {
        let mut donation = pending();
        request().apply(&mut donation);

        assert_eq!(donation.status, DonationStatus::Requested);
        assert_eq!(donation.requested_by.as_deref(), Some("s@x.com"));
        assert_eq!(
            donation.shelter_request.as_ref().map(|r| r.location.as_str()),
            Some("MG Road, Bengaluru")
        );
        assert!(donation.notifications.is_empty());
    }

    #[test]
    fn test_accept_notifies_requesting_shelter() {
        let mut donation = pending();
        request().apply(&mut donation);
        Transition::Accept {
            volunteer: "v@x.com".to_string(),
        }
        .apply(&mut donation);

        assert_eq!(donation.status, DonationStatus::InTransit);
        assert_eq!(donation.accepted_by.as_deref(), Some("v@x.com"));
        assert_eq!(donation.collected_by.as_deref(), Some("v@x.com"));
        assert_eq!(donation.notifications.len(), 1);
        assert_eq!(donation.notifications[0].recipient, "s@x.com");
        assert!(donation.notifications[0].message.contains("v@x.com"));
    }

    #[test]
    fn test_deliver_notifies_shelter() {
        let mut donation = pending();
        request().apply(&mut donation);
        Transition::Accept {
            volunteer: "v@x.com".to_string(),
        }
        .apply(&mut donation);
        Transition::Deliver {
            shelter: "s@x.com".to_string(),
        }
        .apply(&mut donation);

        assert_eq!(donation.status, DonationStatus::Donated);
        assert_eq!(donation.donated_to.as_deref(), Some("s@x.com"));
        assert_eq!(donation.notifications.len(), 2);
        assert_eq!(donation.notifications[1].recipient, "s@x.com");
    }

    #[test]
    fn test_shelter_accept_notifies_owner() {
        let mut donation = pending();
        Transition::ShelterAccept {
            shelter: "s@x.com".to_string(),
            location: "MG Road, Bengaluru".to_string(),
        }
        .apply(&mut donation);

        assert_eq!(donation.status, DonationStatus::Donated);
        assert_eq!(donation.donated_to.as_deref(), Some("s@x.com"));
        assert_eq!(donation.shelter_location.as_deref(), Some("MG Road, Bengaluru"));
        assert_eq!(donation.notifications.len(), 1);
        assert_eq!(donation.notifications[0].recipient, "donor-1");
    }

    #[test]
    fn test_transitions_only_move_forward() {
        assert_eq!(request().allowed_from(), [DonationStatus::Pending]);
        assert_eq!(
            Transition::Accept {
                volunteer: "v@x.com".to_string()
            }
            .allowed_from(),
            [DonationStatus::Requested]
        );
        assert_eq!(
            Transition::Deliver {
                shelter: "s@x.com".to_string()
            }
            .allowed_from(),
            [DonationStatus::InTransit]
        );
        assert!(
            !Transition::ShelterAccept {
                shelter: "s@x.com".to_string(),
                location: "here".to_string(),
            }
            .allowed_from()
            .contains(&DonationStatus::InTransit)
        );
    }

    #[test]
    fn test_status_wire_form() {
        let json = serde_json::to_string(&DonationStatus::InTransit).unwrap();
        assert_eq!(json, "\"In Transit\"");

        let parsed: DonationStatus = serde_json::from_str("\"In Transit\"").unwrap();
        assert_eq!(parsed, DonationStatus::InTransit);
        assert_eq!(DonationStatus::InTransit.as_str(), "In Transit");
    }

    #[test]
    fn test_scope_matching() {
        let mut donation = pending();

        assert!(Scope::All.matches(&donation));
        assert!(Scope::Owner("donor-1".to_string()).matches(&donation));
        assert!(!Scope::Owner("donor-2".to_string()).matches(&donation));
        assert!(!Scope::OpenRequests.matches(&donation));

        request().apply(&mut donation);

        assert!(Scope::ShelterRequester("s@x.com".to_string()).matches(&donation));
        assert!(!Scope::ShelterRequester("other@x.com".to_string()).matches(&donation));
        assert!(Scope::OpenRequests.matches(&donation));
    }

    #[test]
    fn test_self_pickup_requests_are_not_open() {
        let mut donation = pending();
        Transition::Request {
            shelter: ShelterRequest {
                email: "s@x.com".to_string(),
                location: "MG Road, Bengaluru".to_string(),
                self_pickup: true,
            },
        }
        .apply(&mut donation);

        assert!(!Scope::OpenRequests.matches(&donation));
    }
}
