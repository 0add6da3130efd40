use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const POSTAL_CODE_LEN: usize = 8;

/// True iff `code` is exactly eight ASCII decimal digits. No normalization is applied.
pub fn is_valid_postal_code(code: &str) -> bool {
    code.len() == POSTAL_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

fn validate_postal_code(code: &str) -> Result<(), ValidationError> {
    if is_valid_postal_code(code) {
        Ok(())
    } else {
        Err(ValidationError::new("postal_code"))
    }
}

/// Inbound body of both stages.
#[derive(Debug, Clone, PartialEq, Eq, ToSchema, Validate, Serialize, Deserialize)]
pub struct PostalCodeRequest {
    #[schema(example = "01310100")]
    #[validate(custom = "validate_postal_code")]
    pub cep: String,
}

impl PostalCodeRequest {
    pub fn new(code: &PostalCode) -> Self {
        Self { cep: code.0.clone() }
    }

    /// Decode and validate a raw request body. Any failure is simply "no postal code".
    pub fn parse_body(body: &[u8]) -> Option<PostalCode> {
        let request: Self = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(error) => {
                tracing::info!(?error, "failed to decode postal code request");
                return None;
            },
        };

        PostalCode::try_from(request).ok()
    }
}

/// A syntactically valid postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<PostalCodeRequest> for PostalCode {
    type Error = validator::ValidationErrors;

    fn try_from(request: PostalCodeRequest) -> Result<Self, Self::Error> {
        if let Err(error) = request.validate() {
            tracing::info!(postal_code=%request.cep, ?error, "invalid postal code format");
            return Err(error);
        }

        Ok(Self(request.cep))
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PostalCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
