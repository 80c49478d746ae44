//! # MongoDB
//!
//! Document store binding for accounts and donations.
//!
//! One database, two collections. Names match the original CirclEats
//! dataset so an existing deployment stays readable:
//!
//! - `users`: account records, unique index on `email`
//! - `donor`: donation records with embedded shelter request and
//!   notification log
//!
//! Every state transition is a single `update_one` whose filter names the
//! allowed source statuses, so the store's per-document atomicity is what
//! makes transitions race-safe. There are no multi-document writes.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{Bson, Document, doc, oid::ObjectId},
    options::IndexOptions,
};
use serde::{Deserialize, Serialize};

use crate::{
    accounts::{Account, AccountStore},
    donations::DonationRegistry,
    error::AppError,
    models::{Donation, DonationStatus, NewDonation, Notification, Scope, ShelterRequest, Transition},
};

pub const DATABASE: &str = "circlEatsDB";
pub const USERS_COLLECTION: &str = "users";
pub const DONATIONS_COLLECTION: &str = "donor";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Serialize, Deserialize)]
struct AccountDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    email: String,
    password: String,
}

#[derive(Serialize, Deserialize)]
struct DonationDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    user_id: Option<String>,
    item: Option<String>,
    quantity: Option<i64>,
    location: Option<String>,
    status: DonationStatus,
    #[serde(default)]
    requested_by: Option<String>,
    #[serde(default)]
    accepted_by: Option<String>,
    #[serde(default)]
    collected_by: Option<String>,
    #[serde(default)]
    donated_to: Option<String>,
    #[serde(default)]
    shelter_location: Option<String>,
    #[serde(default)]
    shelter_request: Option<ShelterRequest>,
    #[serde(default)]
    notifications: Vec<Notification>,
}

impl From<AccountDoc> for Account {
    fn from(doc: AccountDoc) -> Self {
        Self {
            id: doc.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            name: doc.name,
            email: doc.email,
            password_hash: doc.password,
        }
    }
}

impl From<DonationDoc> for Donation {
    fn from(doc: DonationDoc) -> Self {
        Self {
            id: doc.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            user_id: doc.user_id,
            item: doc.item,
            quantity: doc.quantity,
            location: doc.location,
            status: doc.status,
            requested_by: doc.requested_by,
            accepted_by: doc.accepted_by,
            collected_by: doc.collected_by,
            donated_to: doc.donated_to,
            shelter_location: doc.shelter_location,
            shelter_request: doc.shelter_request,
            notifications: doc.notifications,
        }
    }
}

pub struct MongoStore {
    users: Collection<AccountDoc>,
    donations: Collection<DonationDoc>,
}

pub async fn init_mongo(mongo_uri: &str) -> MongoStore {
    let client = Client::with_uri_str(mongo_uri)
        .await
        .expect("MongoDB misconfigured!");

    let db = client.database(DATABASE);
    let store = MongoStore {
        users: db.collection(USERS_COLLECTION),
        donations: db.collection(DONATIONS_COLLECTION),
    };

    let email_index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    store
        .users
        .create_index(email_index)
        .await
        .expect("MongoDB misconfigured!");

    store
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        *error.kind,
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref write))
            if write.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl AccountStore for MongoStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let doc = self.users.find_one(doc! { "email": email }).await?;

        Ok(doc.map(Account::from))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let doc = self.users.find_one(doc! { "_id": oid }).await?;

        Ok(doc.map(Account::from))
    }

    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<(), AppError> {
        // The unique index backstops the pre-insert lookup under races.
        self.users
            .insert_one(AccountDoc {
                id: None,
                name: name.to_string(),
                email: email.to_string(),
                password: password_hash.to_string(),
            })
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::DuplicateAccount
                } else {
                    AppError::Store(e)
                }
            })?;

        Ok(())
    }
}

fn scope_filter(scope: &Scope) -> Document {
    match scope {
        Scope::All => doc! {},
        Scope::Owner(user_id) => doc! { "user_id": user_id.as_str() },
        Scope::ShelterRequester(email) => doc! { "requested_by": email.as_str() },
        Scope::Volunteer(email) => doc! { "accepted_by": email.as_str() },
        Scope::OpenRequests => doc! {
            "status": DonationStatus::Requested.as_str(),
            "shelter_request.self_pickup": false,
        },
    }
}

fn transition_update(transition: &Transition, current: &Donation) -> Document {
    let mut set = doc! { "status": transition.target().as_str() };

    match transition {
        Transition::Request { shelter } => {
            set.insert("requested_by", shelter.email.as_str());
            set.insert(
                "shelter_request",
                doc! {
                    "email": shelter.email.as_str(),
                    "location": shelter.location.as_str(),
                    "self_pickup": shelter.self_pickup,
                },
            );
        }
        Transition::Accept { volunteer } => {
            set.insert("accepted_by", volunteer.as_str());
            set.insert("collected_by", volunteer.as_str());
        }
        Transition::ShelterAccept { shelter, location } => {
            set.insert("donated_to", shelter.as_str());
            set.insert("shelter_location", location.as_str());
        }
        Transition::Deliver { shelter } => {
            set.insert("donated_to", shelter.as_str());
        }
    }

    let mut update = doc! { "$set": set };

    if let Some(notification) = transition.notification(current) {
        update.insert(
            "$push",
            doc! {
                "notifications": doc! {
                    "recipient": notification.recipient,
                    "message": notification.message,
                },
            },
        );
    }

    update
}

#[async_trait]
impl DonationRegistry for MongoStore {
    async fn insert(&self, new: NewDonation) -> Result<String, AppError> {
        let result = self
            .donations
            .insert_one(DonationDoc {
                id: None,
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
            })
            .await?;

        let id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };

        Ok(id)
    }

    async fn apply(&self, id: &str, transition: Transition) -> Result<(), AppError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Err(AppError::NotFound);
        };

        let current: Donation = self
            .donations
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or(AppError::NotFound)?
            .into();

        let allowed: Vec<Bson> = transition
            .allowed_from()
            .iter()
            .map(|status| Bson::from(status.as_str()))
            .collect();

        let result = self
            .donations
            .update_one(
                doc! { "_id": oid, "status": { "$in": allowed } },
                transition_update(&transition, &current),
            )
            .await?;

        // Records are never deleted, so a miss here means the status guard
        // lost: someone else advanced the record first.
        if result.matched_count == 0 {
            return Err(AppError::InvalidTransition);
        }

        Ok(())
    }

    async fn list(&self, scope: Scope) -> Result<Vec<Donation>, AppError> {
        let cursor = self
            .donations
            .find(scope_filter(&scope))
            .sort(doc! { "_id": 1 })
            .await?;

        let docs: Vec<DonationDoc> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(Donation::from).collect())
    }

    async fn notifications_for(
        &self,
        recipients: &[String],
    ) -> Result<Vec<Notification>, AppError> {
        let cursor = self
            .donations
            .find(doc! { "notifications.recipient": { "$in": recipients.to_vec() } })
            .sort(doc! { "_id": 1 })
            .await?;

        let docs: Vec<DonationDoc> = cursor.try_collect().await?;

        Ok(docs
            .into_iter()
            .flat_map(|doc| doc.notifications)
            .filter(|notification| recipients.contains(&notification.recipient))
            .collect())
    }
}
