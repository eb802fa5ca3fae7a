//! Login and registration payloads.

/// Bearer token issued by either login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenResponse {
    pub access_token: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub token_type: Option<String>,
}

/// OAuth2 password form posted to `/admin/login` (form-encoded).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AdminLoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Stored without the leading `@`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub telegram_username: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub captcha_token: Option<String>,
}

/// Free-form acknowledgement returned by registration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageResponse {
    #[cfg_attr(feature = "serde", serde(default))]
    pub message: Option<String>,
}
