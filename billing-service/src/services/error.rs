use service_core::error::AppError;
use validator::{ValidationError, ValidationErrors};

use super::invoice::PricingError;
use super::token::AuthError;

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Invalid => AppError::Unauthorized(anyhow::anyhow!("Invalid token")),
            AuthError::Expired => AppError::Unauthorized(anyhow::anyhow!("Token expired")),
        }
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::NoValidItems => AppError::NotFound(anyhow::anyhow!(err)),
            PricingError::AlreadyPaid => AppError::Conflict(anyhow::anyhow!(err)),
            PricingError::AmountOverflow => {
                let mut field_error = ValidationError::new("amount_overflow");
                field_error.message = Some(err.to_string().into());
                let mut errors = ValidationErrors::new();
                errors.add("selected_items", field_error);
                AppError::ValidationError(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn auth_failures_are_unauthorized() {
        assert_eq!(
            AppError::from(AuthError::Invalid).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn pricing_failures_map_to_client_errors() {
        let not_found = AppError::from(PricingError::NoValidItems);
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert!(not_found.to_string().contains("No valid items found"));

        assert_eq!(
            AppError::from(PricingError::AlreadyPaid).status_code(),
            StatusCode::CONFLICT
        );

        assert_eq!(
            AppError::from(PricingError::AmountOverflow).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
