//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Only emails at this domain may sign up or sign in
    #[serde(default = "default_institution_domain")]
    pub institution_domain: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// The domain must look like a DNS name: dot separated labels, no `@`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let domain = self.institution_domain.trim();
        if domain.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__INSTITUTION_DOMAIN"));
        }
        let well_formed = domain.contains('.')
            && domain.split('.').all(|label| {
                !label.is_empty()
                    && label
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-')
            });
        if !well_formed {
            return Err(ValidationError::InvalidInstitutionDomain(domain.to_string()));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            institution_domain: default_institution_domain(),
        }
    }
}

fn default_institution_domain() -> String {
    "mtroyal.ca".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.institution_domain, "mtroyal.ca");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_domain_with_at_sign_rejected() {
        let config = AuthConfig {
            institution_domain: "@mtroyal.ca".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidInstitutionDomain(_))
        ));
    }

    #[test]
    fn test_single_label_domain_rejected() {
        let config = AuthConfig {
            institution_domain: "localhost".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_domain_rejected() {
        let config = AuthConfig {
            institution_domain: "  ".to_string(),
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("AUTH__INSTITUTION_DOMAIN"))
        );
    }
}
