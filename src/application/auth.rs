//! AuthService - credential operations guarded by the institution email policy.
//!
//! Every check runs before the gateway is called, so a rejected email, a
//! password of the wrong length or a malformed profile never produces network
//! traffic.

use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

use crate::domain::foundation::DataResult;
use crate::domain::session::{
    check_name, check_password, check_user_name, Identity, InstitutionEmail,
};
use crate::ports::{AuthGateway, Credentials, SignUpProfile};

/// Account operations for the signed-in (or signing-in) user.
#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    policy: InstitutionEmail,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn AuthGateway>, policy: InstitutionEmail) -> Self {
        Self { gateway, policy }
    }

    pub fn policy(&self) -> &InstitutionEmail {
        &self.policy
    }

    fn credentials(&self, email: &str, password: &str) -> DataResult<Credentials> {
        self.policy.check(email)?;
        check_password(password)?;
        Ok(Credentials::new(email.trim(), password))
    }

    /// Checks the present profile fields and returns them trimmed.
    fn profile(profile: &SignUpProfile) -> DataResult<SignUpProfile> {
        let first_name = match &profile.first_name {
            Some(name) => Some(check_name("first_name", name)?.to_string()),
            None => None,
        };
        let last_name = match &profile.last_name {
            Some(name) => Some(check_name("last_name", name)?.to_string()),
            None => None,
        };
        let user_name = match &profile.user_name {
            Some(name) => Some(check_user_name(name)?.to_string()),
            None => None,
        };
        Ok(SignUpProfile {
            first_name,
            last_name,
            user_name,
        })
    }

    /// Registers an institution account.
    ///
    /// Returns `None` while the service waits for the email to be confirmed.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &SignUpProfile,
    ) -> DataResult<Option<Identity>> {
        let credentials = self.credentials(email, password)?;
        let profile = Self::profile(profile)?;
        tracing::info!(email = %credentials.email, "signing up");
        self.gateway.sign_up(&credentials, &profile).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> DataResult<Identity> {
        let credentials = self.credentials(email, password)?;
        tracing::info!(email = %credentials.email, "signing in");
        self.gateway.sign_in(&credentials).await
    }

    pub async fn sign_out(&self) -> DataResult<()> {
        self.gateway.sign_out().await
    }

    /// Mails a password recovery link that returns to `redirect_to`.
    pub async fn reset_password(&self, email: &str, redirect_to: Option<&str>) -> DataResult<()> {
        self.policy.check(email)?;
        self.gateway.reset_password(email.trim(), redirect_to).await
    }

    pub async fn update_password(&self, password: &Secret<String>) -> DataResult<Identity> {
        check_password(password.expose_secret())?;
        self.gateway.update_password(password).await
    }

    pub async fn resend_verification(&self, email: &str) -> DataResult<()> {
        self.policy.check(email)?;
        self.gateway.resend_verification(email.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MockAuthGateway;
    use crate::domain::foundation::UserId;

    fn service(gateway: Arc<MockAuthGateway>) -> AuthService {
        AuthService::new(gateway, InstitutionEmail::new("mtroyal.ca"))
    }

    #[tokio::test]
    async fn foreign_email_never_reaches_the_gateway() {
        let gateway = Arc::new(MockAuthGateway::new());
        let auth = service(gateway.clone());

        let result = auth
            .sign_up("user@gmail.com", "hunter22", &SignUpProfile::default())
            .await;

        assert!(result.unwrap_err().is_validation());
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn institution_email_proceeds_to_the_gateway() {
        let gateway = Arc::new(MockAuthGateway::new());
        let auth = service(gateway.clone());

        auth.sign_up("user@mtroyal.ca", "hunter22", &SignUpProfile::default())
            .await
            .unwrap();

        assert_eq!(gateway.calls(), vec!["sign_up"]);
    }

    #[tokio::test]
    async fn short_or_long_password_is_rejected_locally() {
        let gateway = Arc::new(MockAuthGateway::new());
        let auth = service(gateway.clone());

        let short = auth.sign_in("user@mtroyal.ca", "seven77").await;
        let long = auth
            .sign_up("user@mtroyal.ca", &"p".repeat(129), &SignUpProfile::default())
            .await;

        assert!(short.unwrap_err().is_validation());
        assert!(long.unwrap_err().is_validation());
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn malformed_profile_is_rejected_locally() {
        let gateway = Arc::new(MockAuthGateway::new());
        let auth = service(gateway.clone());
        let profiles = [
            SignUpProfile {
                first_name: Some("  ".to_string()),
                ..Default::default()
            },
            SignUpProfile {
                last_name: Some("Sm1th".to_string()),
                ..Default::default()
            },
            SignUpProfile {
                user_name: Some("no spaces allowed".to_string()),
                ..Default::default()
            },
        ];

        for profile in &profiles {
            let result = auth.sign_up("user@mtroyal.ca", "hunter22", profile).await;
            assert!(result.unwrap_err().is_validation(), "{:?}", profile);
        }
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_password_is_rejected_locally() {
        let gateway = Arc::new(MockAuthGateway::new());
        let auth = service(gateway.clone());

        assert!(auth.sign_in("user@mtroyal.ca", "").await.unwrap_err().is_validation());
        assert!(auth
            .update_password(&Secret::new(String::new()))
            .await
            .unwrap_err()
            .is_validation());
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn sign_in_returns_the_account() {
        let identity = Identity::new(UserId::random(), "sam@mtroyal.ca");
        let gateway = Arc::new(MockAuthGateway::new().with_account(
            "sam@mtroyal.ca",
            "hunter22",
            identity.clone(),
        ));
        let auth = service(gateway);

        assert_eq!(auth.sign_in(" sam@mtroyal.ca ", "hunter22").await.unwrap(), identity);
    }
}
