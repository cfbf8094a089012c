//! Settlement policy

use crate::error::AdapterError;
use crate::response::Response;

/// Decides whether a received response resolves or rejects
///
/// The adapter defers its success/failure boundary entirely to this policy.
pub trait Settle: Send + Sync {
    /// Resolve with the response or reject it
    fn settle(&self, response: Response) -> Result<Response, AdapterError>;
}

impl<F> Settle for F
where
    F: Fn(Response) -> Result<Response, AdapterError> + Send + Sync,
{
    fn settle(&self, response: Response) -> Result<Response, AdapterError> {
        self(response)
    }
}

/// Default policy: consult the request config's status validator
///
/// Resolves when the config has no validator, when the status is 0, or when
/// the validator accepts the status.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateStatus;

impl Settle for ValidateStatus {
    fn settle(&self, response: Response) -> Result<Response, AdapterError> {
        let accepted = match &response.config.validate_status {
            Some(validator) => response.status == 0 || validator.accepts(response.status),
            None => true,
        };

        if accepted {
            Ok(response)
        } else {
            Err(AdapterError::Status {
                response: Box::new(response),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;

    use super::*;
    use crate::config::{RequestConfig, StatusValidator};
    use crate::headers::Headers;
    use crate::response::ResponseData;

    fn response(status: u16, config: RequestConfig) -> Response {
        Response {
            data: ResponseData::Text(String::new()),
            status,
            status_text: String::new(),
            headers: Headers::new(),
            config: Arc::new(config),
            request: None,
        }
    }

    #[test]
    fn test_default_validator_accepts_2xx_only() {
        let config = || RequestConfig::new(Method::GET, "/");
        assert!(ValidateStatus.settle(response(200, config())).is_ok());
        assert!(ValidateStatus.settle(response(299, config())).is_ok());

        let rejected = ValidateStatus
            .settle(response(404, config()))
            .expect_err("404 should be rejected");
        assert_eq!(rejected.to_string(), "Request failed with status code 404");
        assert_eq!(rejected.response().map(|r| r.status), Some(404));
    }

    #[test]
    fn test_status_zero_always_resolves() {
        let config = RequestConfig::new(Method::GET, "/");
        assert!(ValidateStatus.settle(response(0, config)).is_ok());
    }

    #[test]
    fn test_missing_validator_accepts_everything() {
        let mut config = RequestConfig::new(Method::GET, "/");
        config.validate_status = None;
        assert!(ValidateStatus.settle(response(500, config)).is_ok());
    }

    #[test]
    fn test_custom_validator() {
        let config = RequestConfig::new(Method::GET, "/")
            .validate_status(StatusValidator::new(|status| status < 500));
        assert!(ValidateStatus.settle(response(404, config.clone())).is_ok());
        assert!(ValidateStatus.settle(response(503, config)).is_err());
    }

    #[test]
    fn test_closure_policy() {
        let policy = |response: Response| -> Result<Response, AdapterError> { Ok(response) };
        let config = RequestConfig::new(Method::GET, "/");
        assert!(policy.settle(response(500, config)).is_ok());
    }
}
