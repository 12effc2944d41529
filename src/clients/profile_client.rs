use async_trait::async_trait;
use tracing::{debug, instrument};
use crate::actor_framework::ResourceClient;
use crate::domain::{ContactDetails, Profile, ProfileCreate, ProfilePatch};
use crate::profile_actor::{ProfileAction, ProfileActionResult, ProfileError};
use crate::stores::ProfileStore;

/// Client for interacting with the Profile actor.
#[derive(Clone)]
pub struct ProfileClient {
    inner: ResourceClient<Profile>,
}

impl_basic_client!(ProfileClient, Profile, ProfileError, profile_record);

impl ProfileClient {
    /// Signs up a customer and returns their user id.
    #[instrument(skip(self))]
    pub async fn create_profile(&self, params: ProfileCreate) -> Result<String, ProfileError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(ProfileError::from)
    }

    #[instrument(skip(self))]
    pub async fn update_profile(&self, id: String, patch: ProfilePatch) -> Result<Profile, ProfileError> {
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(ProfileError::from)
    }

    async fn require(&self, user_id: &str) -> Result<Profile, ProfileError> {
        self.get_profile_record(user_id.to_string())
            .await?
            .ok_or_else(|| ProfileError::NotFound(user_id.to_string()))
    }

    async fn balance_action(&self, user_id: &str, action: ProfileAction) -> Result<u64, ProfileError> {
        match self.inner.perform_action(user_id.to_string(), action).await {
            Ok(ProfileActionResult::Balance(balance)) => Ok(balance),
            Ok(_) => Err(ProfileError::ActorCommunicationError("Unexpected result".to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ProfileStore for ProfileClient {
    #[instrument(skip(self))]
    async fn get_profile(&self, user_id: &str) -> Result<ContactDetails, ProfileError> {
        debug!("Sending request");
        Ok(self.require(user_id).await?.contact())
    }

    #[instrument(skip(self))]
    async fn get_balance(&self, user_id: &str) -> Result<u64, ProfileError> {
        debug!("Sending request");
        Ok(self.require(user_id).await?.points_balance)
    }

    #[instrument(skip(self))]
    async fn set_balance(&self, user_id: &str, balance: u64) -> Result<(), ProfileError> {
        debug!("Sending request");
        self.balance_action(user_id, ProfileAction::SetBalance(balance)).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn get_saved_address(&self, user_id: &str) -> Result<Option<String>, ProfileError> {
        debug!("Sending request");
        Ok(self.require(user_id).await?.saved_address)
    }

    #[instrument(skip(self))]
    async fn set_saved_address(&self, user_id: &str, address: Option<String>) -> Result<(), ProfileError> {
        debug!("Sending request");
        match self.inner.perform_action(user_id.to_string(), ProfileAction::SetSavedAddress(address)).await {
            Ok(ProfileActionResult::SavedAddress(_)) => Ok(()),
            Ok(_) => Err(ProfileError::ActorCommunicationError("Unexpected result".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Applied inside the profile actor, so concurrent credits cannot lose updates.
    #[instrument(skip(self))]
    async fn credit_points(&self, user_id: &str, amount: u64) -> Result<u64, ProfileError> {
        debug!("Sending request");
        self.balance_action(user_id, ProfileAction::Credit(amount)).await
    }

    #[instrument(skip(self))]
    async fn debit_points(&self, user_id: &str, amount: u64) -> Result<u64, ProfileError> {
        debug!("Sending request");
        self.balance_action(user_id, ProfileAction::Debit(amount)).await
    }
}
