use serde::Serialize;

/// Uniform JSON envelope returned by every endpoint:
/// `{success, message, data?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T = ()> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_data_when_absent() {
        let body = serde_json::to_value(Envelope::<()>::success("ok")).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "message": "ok"}));
    }

    #[test]
    fn failure_sets_success_false() {
        let body = serde_json::to_value(Envelope::<()>::failure("nope")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "nope");
    }
}
