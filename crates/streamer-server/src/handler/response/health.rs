use serde::{Deserialize, Serialize};

/// Liveness probe body.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
}

impl Health {
    /// Returns the healthy response.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_owned(),
        }
    }
}
