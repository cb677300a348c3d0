use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage quota exceeded: {size} bytes requested, limit is {limit} bytes")]
    QuotaExceeded { size: usize, limit: usize },
}

impl StoreError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_errors_are_distinguishable() {
        let err = StoreError::QuotaExceeded {
            size: 10,
            limit: 5,
        };
        assert!(err.is_quota());
        assert!(err.to_string().contains("10 bytes"));

        let io = StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!io.is_quota());
    }
}
