use serde_json::Value;

/// Named remote call against the serverless function runtime.
pub trait FunctionInvoker: Send + Sync {
    fn invoke(&self, name: &str, args: Value) -> Result<Value, FunctionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("function runtime unreachable: {0}")]
    Unavailable(String),
    #[error("internal function error: {0}")]
    Internal(String),
    #[error("function rejected the call: {0}")]
    Rejected(String),
    #[error("unexpected function response: {0}")]
    MalformedResponse(String),
}

impl FunctionError {
    /// Classify a raw error code/message pair the way the runtime reports them.
    ///
    /// Codes arrive in several spellings (`functions/permission-denied`,
    /// `PERMISSION_DENIED`, free-form messages), so matching is by substring.
    pub fn classify(code: &str, message: &str) -> Self {
        let haystack = format!("{code} {message}").to_ascii_lowercase();
        let message = if message.is_empty() {
            code.to_string()
        } else {
            message.to_string()
        };

        if haystack.contains("permission") || haystack.contains("denied") {
            Self::PermissionDenied(message)
        } else if haystack.contains("unauthenticated") || haystack.contains("auth") {
            Self::Unauthenticated(message)
        } else if ["unavailable", "network", "timeout", "deadline", "fetch"]
            .iter()
            .any(|needle| haystack.contains(needle))
        {
            Self::Unavailable(message)
        } else if haystack.contains("internal") {
            Self::Internal(message)
        } else {
            Self::Rejected(message)
        }
    }

    /// Auth, permission, transport, and internal failures; caller input problems are not.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated(_)
                | Self::PermissionDenied(_)
                | Self::Unavailable(_)
                | Self::Internal(_)
        )
    }
}

/// Unwrap the `{ success, ...payload }` envelope every function returns.
pub fn expect_success(response: Value) -> Result<Value, FunctionError> {
    match response.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(response),
        Some(false) => {
            let reason = ["error", "message"]
                .iter()
                .find_map(|key| response.get(*key).and_then(Value::as_str))
                .unwrap_or("call reported failure")
                .to_string();
            Err(FunctionError::Rejected(reason))
        }
        None => Err(FunctionError::MalformedResponse(
            "missing boolean 'success' field".to_string(),
        )),
    }
}
