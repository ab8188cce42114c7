use crate::domain::{
    entities::{RelativePath, ServiceConfiguration, ServiceTemplate},
    error::DomainError,
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across services.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_template(template: &ServiceTemplate) -> Result<(), DomainError> {
        template.validate()
    }

    pub fn validate_configuration(
        config: &ServiceConfiguration,
        template: &ServiceTemplate,
    ) -> Result<(), DomainError> {
        if config.key() != template.key() {
            return Err(DomainError::InvalidConfiguration {
                service: config.name.clone(),
                errors: vec![format!(
                    "configuration is for {} but template is {}",
                    config.key(),
                    template.key()
                )],
            });
        }
        config.validate_against(template)
    }

    pub fn validate_target(path: &str) -> Result<RelativePath, DomainError> {
        RelativePath::try_new(path)
    }
}
