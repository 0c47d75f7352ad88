//! Profiles - public user information attached to auth accounts.

use chrono::{DateTime, Utc};

use crate::application::client::DataClient;
use crate::domain::foundation::{DataResult, ProfileId, UserId, ValidationError};
use crate::domain::schema::{UserProfile, UserProfileColumn, UserProfilePatch};

/// Profile access.
#[derive(Clone)]
pub struct Profiles {
    client: DataClient,
}

impl Profiles {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    /// Profile of the auth account `user`.
    pub async fn by_user(&self, user: UserId) -> DataResult<UserProfile> {
        self.client
            .from::<UserProfile>()
            .select::<UserProfile>()
            .eq(UserProfileColumn::SupabaseId, user)
            .one()
            .await
    }

    pub async fn by_id(&self, id: ProfileId) -> DataResult<UserProfile> {
        self.client
            .from::<UserProfile>()
            .select::<UserProfile>()
            .eq(UserProfileColumn::Id, id)
            .one()
            .await
    }

    /// Writes the present fields of `patch` to the profile of `user`.
    pub async fn update(&self, user: UserId, patch: &UserProfilePatch) -> DataResult<UserProfile> {
        if patch == &UserProfilePatch::default() {
            return Err(ValidationError::empty_field("profile").into());
        }
        if patch.id.is_some() || patch.supabase_id.is_some() {
            return Err(ValidationError::invalid_format("profile", "keys cannot be changed").into());
        }
        self.write(user, patch).await
    }

    /// Marks the profile deleted without removing the row.
    pub async fn soft_delete(&self, user: UserId) -> DataResult<UserProfile> {
        self.soft_delete_at(user, Utc::now()).await
    }

    pub(crate) async fn soft_delete_at(&self, user: UserId, at: DateTime<Utc>) -> DataResult<UserProfile> {
        let patch = UserProfilePatch {
            is_deleted: Some(true),
            deleted_on: Some(Some(at)),
            ..Default::default()
        };
        self.write(user, &patch).await
    }

    /// Flags the profile for moderation with a reason such as `"spam"`.
    pub async fn flag(&self, user: UserId, kind: &str) -> DataResult<UserProfile> {
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(ValidationError::empty_field("flagged_type").into());
        }
        let patch = UserProfilePatch {
            is_flagged: Some(true),
            flagged_type: Some(Some(kind.to_string())),
            ..Default::default()
        };
        self.write(user, &patch).await
    }

    async fn write(&self, user: UserId, patch: &UserProfilePatch) -> DataResult<UserProfile> {
        self.client
            .from::<UserProfile>()
            .update(patch)?
            .eq(UserProfileColumn::SupabaseId, user)
            .one()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBackend;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn profiles() -> (Arc<InMemoryBackend>, Profiles) {
        let backend = Arc::new(InMemoryBackend::new());
        (backend.clone(), Profiles::new(DataClient::new(backend)))
    }

    fn profile(user: UserId) -> serde_json::Value {
        json!({
            "id": 1,
            "created_at": "2024-01-10T08:00:00Z",
            "supabase_id": user,
            "email": "sam@mtroyal.ca",
            "first_name": "Sam",
            "last_name": null,
            "user_name": "sam",
            "profile_image": null,
            "rating": null,
            "is_flagged": false,
            "flagged_type": null,
            "is_deleted": false,
            "deleted_on": null,
        })
    }

    #[tokio::test]
    async fn by_user_matches_the_auth_subject() {
        let (backend, profiles) = profiles();
        let user = UserId::random();
        backend.respond_with("User_Information", profile(user));

        let found = profiles.by_user(user).await.unwrap();

        assert_eq!(found.user_name.as_deref(), Some("sam"));
        assert_eq!(
            backend.requests()[0].param("supabase_id"),
            Some(format!("eq.{}", user))
        );
    }

    #[tokio::test]
    async fn soft_delete_stamps_the_deletion_time() {
        let (backend, profiles) = profiles();
        let user = UserId::random();
        backend.respond_with("User_Information", profile(user));
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();

        profiles.soft_delete_at(user, at).await.unwrap();

        assert_eq!(
            backend.requests()[0].body,
            Some(json!({ "is_deleted": true, "deleted_on": "2024-05-01T09:30:00Z" }))
        );
    }

    #[tokio::test]
    async fn empty_or_key_changing_updates_are_rejected() {
        let (backend, profiles) = profiles();
        let user = UserId::random();

        let empty = profiles.update(user, &UserProfilePatch::default()).await;
        assert!(empty.unwrap_err().is_validation());

        let rekey = UserProfilePatch {
            supabase_id: Some(UserId::random()),
            ..Default::default()
        };
        assert!(profiles.update(user, &rekey).await.unwrap_err().is_validation());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn flag_records_the_reason() {
        let (backend, profiles) = profiles();
        let user = UserId::random();
        backend.respond_with("User_Information", profile(user));

        profiles.flag(user, "spam").await.unwrap();

        assert_eq!(
            backend.requests()[0].body,
            Some(json!({ "is_flagged": true, "flagged_type": "spam" }))
        );
    }
}
