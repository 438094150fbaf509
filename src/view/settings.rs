use thiserror::Error;

use crate::api::{ApiClient, ApiError, EmailFrequency, User, UserUpdate};
use crate::session::{snap_min_score, StoreError};

const DEFAULT_MIN_QUALITY: u32 = 60;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("You need to sign in to change your preferences")]
    NotSignedIn,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Editable copy of the user's delivery preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceForm {
    pub preferred_categories: Vec<String>,
    min_quality_score: u32,
    pub email_frequency: EmailFrequency,
    pub email_enabled: bool,
}

impl PreferenceForm {
    /// Seed from a profile. A zero score falls back to 60.
    pub fn from_user(user: &User) -> Self {
        let score = if user.min_quality_score == 0 {
            DEFAULT_MIN_QUALITY
        } else {
            user.min_quality_score
        };
        let mut form = Self {
            preferred_categories: user.preferred_categories.clone(),
            min_quality_score: DEFAULT_MIN_QUALITY,
            email_frequency: user.email_frequency,
            email_enabled: user.email_enabled,
        };
        form.set_min_quality_score(score);
        form
    }

    pub fn min_quality_score(&self) -> u32 {
        self.min_quality_score
    }

    /// Snap with [`snap_min_score`]. Returns the stored value.
    pub fn set_min_quality_score(&mut self, score: u32) -> u32 {
        self.min_quality_score = snap_min_score(score);
        self.min_quality_score
    }

    /// Add or remove a category. Returns whether it is now selected.
    pub fn toggle_category(&mut self, category: &str) -> bool {
        if let Some(pos) = self
            .preferred_categories
            .iter()
            .position(|c| c == category)
        {
            self.preferred_categories.remove(pos);
            false
        } else {
            self.preferred_categories.push(category.to_string());
            true
        }
    }

    pub fn is_selected(&self, category: &str) -> bool {
        self.preferred_categories.iter().any(|c| c == category)
    }

    pub fn to_update(&self) -> UserUpdate {
        UserUpdate {
            preferred_categories: Some(self.preferred_categories.clone()),
            min_quality_score: Some(self.min_quality_score),
            email_frequency: Some(self.email_frequency),
            email_enabled: Some(self.email_enabled),
            ..UserUpdate::default()
        }
    }
}

/// Preference editing for the signed-in user.
#[derive(Debug, Default)]
pub struct SettingsPage {
    form: Option<PreferenceForm>,
}

impl SettingsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> Option<&PreferenceForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut PreferenceForm> {
        self.form.as_mut()
    }

    /// Seed the form from the cached profile, fetching it when absent.
    pub async fn open(
        &mut self,
        client: &ApiClient,
    ) -> Result<&mut PreferenceForm, SettingsError> {
        let session = client.session();
        if !session.is_authenticated() {
            return Err(SettingsError::NotSignedIn);
        }
        let user = match session.user() {
            Some(user) => user,
            None => {
                let user = client.users().me().await?;
                session.set_user(Some(user.clone()))?;
                user
            }
        };
        Ok(self.form.insert(PreferenceForm::from_user(&user)))
    }

    /// Send the form, cache the returned profile, and reseed from it.
    pub async fn save(&mut self, client: &ApiClient) -> Result<User, SettingsError> {
        let session = client.session();
        if !session.is_authenticated() {
            return Err(SettingsError::NotSignedIn);
        }
        let update = match &self.form {
            Some(form) => form.to_update(),
            None => return Err(SettingsError::NotSignedIn),
        };
        let user = client.users().update_me(&update).await?;
        session.set_user(Some(user.clone()))?;
        self.form = Some(PreferenceForm::from_user(&user));
        tracing::debug!(user_id = user.id, "Preferences saved");
        Ok(user)
    }
}
