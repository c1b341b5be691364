//! Personal allergy profile aggregation.
//!
//! A stored profile only holds ids. Reads join it against the allergen and
//! symptom catalogs inside one store snapshot, so a single view never mixes
//! two catalog states.

pub mod display;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{hash_password, verify_password, PasswordError};
use crate::crud::{build_entity_operations, CrudError};
use crate::database::{DocumentId, DocumentStore, StoreError, StoredDocument, UpdateResult};
use crate::filter::{Filter, Page};
use crate::models::user::normalize_email;
use crate::models::{Allergen, NewUser, Pap, PapAllergen, PapPatch, Severity, Symptom, User, UserPatch};
use crate::schema::{to_document, Entity, Validate};

pub use display::{DisplayPap, DisplayPapAllergen, PublicPap, PublicPapAllergen, ResolvedSymptom};

const USERS: &str = "users";
const PAPS: &str = "paps";
const ALLERGENS: &str = "allergens";
const SYMPTOMS: &str = "symptoms";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,

    /// Shared by unknown and private public ids.
    #[error("Profile not available")]
    NotAvailable,

    #[error("Referential integrity error: {kind} {id} does not exist")]
    ReferentialIntegrity { kind: &'static str, id: DocumentId },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Crud(#[from] CrudError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ids handed back after a successful registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub user_id: DocumentId,
    pub public_id: String,
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    password_cost: u32,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>, password_cost: u32) -> Self {
        Self { store, password_cost }
    }

    /// Fully resolved private view. `Ok(None)` when the user has no profile.
    pub async fn get_display_profile(&self, user_id: DocumentId) -> Result<Option<DisplayPap>, ProfileError> {
        let Some((id, pap)) = self.load_pap("userId", user_id.to_hex()).await? else {
            debug!("No profile for user {}", user_id);
            return Ok(None);
        };
        let allergens = self.resolve(&pap.allergens).await?;

        Ok(Some(DisplayPap {
            id,
            user_id: pap.user_id,
            public_id: pap.public_id,
            do_b: pap.do_b,
            gender: pap.gender,
            allow_public: pap.allow_public,
            underlying_med_con: pap.underlying_med_con,
            allergens,
            revision: pap.revision,
        }))
    }

    /// Redacted view ordered by descending severity. Unknown and private
    /// profiles produce the same error; only the log line tells them apart.
    pub async fn get_public_profile(&self, public_id: &str) -> Result<PublicPap, ProfileError> {
        let pap = match self.load_pap("publicId", public_id).await? {
            None => {
                debug!("Public profile lookup: no profile with public id {}", public_id);
                return Err(ProfileError::NotAvailable);
            }
            Some((_, pap)) if !pap.allow_public => {
                debug!("Public profile lookup: profile {} is private", public_id);
                return Err(ProfileError::NotAvailable);
            }
            Some((_, pap)) => pap,
        };

        let mut allergens: Vec<PublicPapAllergen> =
            self.resolve(&pap.allergens).await?.into_iter().map(PublicPapAllergen::from).collect();
        // stable, so ties keep profile order
        allergens.sort_by(|a, b| b.severity.cmp(&a.severity));

        Ok(PublicPap {
            public_id: pap.public_id,
            allergens,
        })
    }

    /// Owner-side partial update guarded by the stored revision.
    pub async fn update_profile(&self, user_id: DocumentId, patch: PapPatch) -> Result<u64, ProfileError> {
        patch.validate().map_err(ProfileError::Validation)?;
        let (id, pap) = self.load_pap("userId", user_id.to_hex()).await?.ok_or(ProfileError::NotFound)?;

        if let Some(expected) = patch.expected_revision {
            if expected != pap.revision {
                return Err(ProfileError::Conflict(format!(
                    "Profile revision is {}, expected {}",
                    pap.revision, expected
                )));
            }
        }
        if let Some(entries) = &patch.allergens {
            self.ensure_references(entries).await?;
        }

        let next = pap.revision + 1;
        let mut set = Pap::prepare_patch(patch).map_err(ProfileError::Validation)?;
        set.insert("revision".to_string(), Value::from(next));

        let guard = Filter::all().eq("revision", pap.revision);
        let UpdateResult { matched, .. } = self.store.update_one(PAPS, id, set, &guard).await?;
        if matched == 0 {
            warn!("Concurrent update on profile {} lost at revision {}", id, pap.revision);
            return Err(ProfileError::Conflict("Profile was modified concurrently, reload and retry".to_string()));
        }

        info!("Updated profile {} to revision {}", id, next);
        Ok(next)
    }

    /// Creates the account and its blank profile. The work runs on its own
    /// task, so a caller that stops waiting cannot leave an account without a
    /// profile. The account is removed again when the profile cannot be stored.
    pub async fn register(&self, new: NewUser) -> Result<Registration, ProfileError> {
        let service = self.clone();
        tokio::spawn(async move { service.create_account(new).await })
            .await
            .map_err(|e| ProfileError::Task(e.to_string()))?
    }

    async fn create_account(&self, new: NewUser) -> Result<Registration, ProfileError> {
        new.validate().map_err(ProfileError::Validation)?;
        let email = normalize_email(&new.email);
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(email_taken(&email));
        }

        let password_hash = self.hash(new.password.clone()).await?;
        let users = build_entity_operations::<User>(self.store.clone(), USERS);
        let user_id = match users.add(new.into_user(password_hash)).await {
            Ok(id) => DocumentId::parse_hex(&id).map_err(CrudError::from)?,
            Err(CrudError::Store(StoreError::Duplicate { .. })) => return Err(email_taken(&email)),
            Err(e) => return Err(e.into()),
        };

        let pap = Pap::blank(user_id);
        let body = to_document(&pap).map_err(ProfileError::Validation)?;
        if let Err(e) = self.store.insert_one(PAPS, body).await {
            warn!("Profile insert for user {} failed, removing account: {}", user_id, e);
            if let Err(cleanup) = self.store.delete_one(USERS, user_id).await {
                warn!("Could not remove account {}: {}", user_id, cleanup);
            }
            return Err(e.into());
        }

        info!("Registered user {}", user_id);
        Ok(Registration {
            user_id,
            public_id: pap.public_id,
        })
    }

    /// Partial account update. A new email must not belong to another
    /// account; a new password is hashed before it is stored.
    pub async fn update_user(&self, user_id: DocumentId, patch: UserPatch) -> Result<UpdateResult, ProfileError> {
        patch.validate().map_err(ProfileError::Validation)?;
        let email = patch.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if let Some((owner, _)) = self.find_user_by_email(email).await? {
                if owner != user_id {
                    return Err(email_taken(email));
                }
            }
        }

        let password_hash = match patch.password.clone() {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };
        let users = build_entity_operations::<User>(self.store.clone(), USERS);
        match users.update(&user_id.to_hex(), patch.into_changes(password_hash)).await {
            Ok(outcome) => Ok(outcome),
            Err(CrudError::Store(StoreError::Duplicate { .. })) => Err(email_taken(email.as_deref().unwrap_or_default())),
            Err(e) => Err(e.into()),
        }
    }

    /// Checks an email/password pair and returns the matching account.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<(DocumentId, User), ProfileError> {
        let email = normalize_email(email);
        let Some((id, user)) = self.find_user_by_email(&email).await? else {
            debug!("Failed login for unknown {}", email);
            return Err(ProfileError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ProfileError::Task(e.to_string()))?;
        match verified {
            Ok(true) => Ok((id, user)),
            Ok(false) => {
                debug!("Failed login for {}", email);
                Err(ProfileError::InvalidCredentials)
            }
            Err(e) => {
                warn!("Stored password hash for {} is unusable: {}", id, e);
                Err(ProfileError::InvalidCredentials)
            }
        }
    }

    /// Removes the profile first, then the account. Returns the number of
    /// accounts removed.
    pub async fn delete_user(&self, user_id: DocumentId) -> Result<u64, ProfileError> {
        if let Some((pap_id, _)) = self.load_pap("userId", user_id.to_hex()).await? {
            self.store.delete_one(PAPS, pap_id).await?;
        }
        let deleted = self.store.delete_one(USERS, user_id).await?;
        if deleted > 0 {
            info!("Deleted user {} and profile", user_id);
        }
        Ok(deleted)
    }

    async fn hash(&self, password: String) -> Result<String, ProfileError> {
        let cost = self.password_cost;
        let hashed = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| ProfileError::Task(e.to_string()))?;
        Ok(hashed?)
    }

    async fn load_pap(&self, field: &str, value: impl Into<Value>) -> Result<Option<(DocumentId, Pap)>, ProfileError> {
        let filter = Filter::all().eq(field, value);
        let found = self.store.find(PAPS, &filter, Page::first(1)).await?;
        match found.into_iter().next() {
            Some(document) => Ok(Some(decode(PAPS, document)?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<(DocumentId, User)>, ProfileError> {
        let filter = Filter::all().eq("email", email);
        let found = self.store.find(USERS, &filter, Page::first(1)).await?;
        match found.into_iter().next() {
            Some(document) => Ok(Some(decode(USERS, document)?)),
            None => Ok(None),
        }
    }

    /// Rejects profile entries that point at catalog ids which do not exist.
    async fn ensure_references(&self, entries: &[PapAllergen]) -> Result<(), ProfileError> {
        let (allergens, symptoms) = self.fetch_catalog(entries).await?;
        for entry in entries {
            if !allergens.contains_key(&entry.allergen_id) {
                return Err(ProfileError::Validation(format!("Unknown allergen id {}", entry.allergen_id)));
            }
            if let Some(missing) = entry.symptoms_id.iter().find(|id| !symptoms.contains_key(id)) {
                return Err(ProfileError::Validation(format!("Unknown symptom id {}", missing)));
            }
        }
        Ok(())
    }

    /// Joins every entry against the catalogs. Entry order is preserved.
    async fn resolve(&self, entries: &[PapAllergen]) -> Result<Vec<DisplayPapAllergen>, ProfileError> {
        let (allergens, symptoms) = self.fetch_catalog(entries).await?;

        entries
            .iter()
            .map(|entry| -> Result<DisplayPapAllergen, ProfileError> {
                let allergen = allergens.get(&entry.allergen_id).ok_or(ProfileError::ReferentialIntegrity {
                    kind: "Allergen",
                    id: entry.allergen_id,
                })?;
                let resolved = entry
                    .symptoms_id
                    .iter()
                    .map(|id| {
                        symptoms
                            .get(id)
                            .map(|symptom| ResolvedSymptom { id: *id, symptom: symptom.clone() })
                            .ok_or(ProfileError::ReferentialIntegrity { kind: "Symptom", id: *id })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(DisplayPapAllergen {
                    allergen_id: entry.allergen_id,
                    name: allergen.name.clone(),
                    allergen_type: allergen.allergen_type,
                    discovery_date: entry.discovery_date,
                    discovery_method: entry.discovery_method,
                    severity: Severity::max_of(resolved.iter().map(|s| s.symptom.severity)),
                    symptoms: resolved,
                })
            })
            .collect()
    }

    /// Loads the distinct allergens and symptoms referenced by `entries`, one
    /// query per collection, from a single snapshot.
    async fn fetch_catalog(
        &self,
        entries: &[PapAllergen],
    ) -> Result<(HashMap<DocumentId, Allergen>, HashMap<DocumentId, Symptom>), ProfileError> {
        let allergen_ids = distinct(entries.iter().map(|e| e.allergen_id));
        let symptom_ids = distinct(entries.iter().flat_map(|e| e.symptoms_id.iter().copied()));
        if allergen_ids.is_empty() {
            return Ok((HashMap::new(), HashMap::new()));
        }

        let mut snapshot = self.store.snapshot().await?;
        let fetched = async {
            let allergens = snapshot
                .find(ALLERGENS, &Filter::by_ids(allergen_ids.iter().copied()), Page::first(allergen_ids.len() as i64))
                .await?;
            let symptoms = if symptom_ids.is_empty() {
                Vec::new()
            } else {
                snapshot
                    .find(SYMPTOMS, &Filter::by_ids(symptom_ids.iter().copied()), Page::first(symptom_ids.len() as i64))
                    .await?
            };
            Ok::<_, StoreError>((allergens, symptoms))
        }
        .await;
        snapshot.finish().await?;
        let (allergens, symptoms) = fetched?;

        Ok((decode_all(ALLERGENS, allergens)?, decode_all(SYMPTOMS, symptoms)?))
    }
}

fn email_taken(email: &str) -> ProfileError {
    ProfileError::Conflict(format!("Email {} is already registered", email))
}

fn distinct(ids: impl Iterator<Item = DocumentId>) -> Vec<DocumentId> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

fn decode<T: DeserializeOwned>(collection: &str, document: StoredDocument) -> Result<(DocumentId, T), StoreError> {
    let StoredDocument { id, body } = document;
    serde_json::from_value(Value::Object(body))
        .map(|record| (id, record))
        .map_err(|e| StoreError::CorruptDocument {
            collection: collection.to_string(),
            message: format!("{}: {}", id, e),
        })
}

fn decode_all<T: DeserializeOwned>(collection: &str, documents: Vec<StoredDocument>) -> Result<HashMap<DocumentId, T>, StoreError> {
    documents.into_iter().map(|d| decode(collection, d)).collect()
}
