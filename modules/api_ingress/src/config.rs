use serde::{Deserialize, Serialize};

/// HTTP host configuration, read from `modules.api_ingress.config`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub enable_docs: bool,
    #[serde(default)]
    pub cors_enabled: bool,
    /// Per-request handler timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Max accepted request body size.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            enable_docs: false,
            cors_enabled: false,
            request_timeout_secs: default_request_timeout_secs(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8087".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_body_limit_bytes() -> usize {
    1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: ApiIngressConfig = serde_json::from_value(serde_json::json!({
            "bind_addr": "0.0.0.0:9000",
            "enable_docs": true
        }))
        .unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert!(cfg.enable_docs);
        assert!(!cfg.cors_enabled);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.body_limit_bytes, 1024 * 1024);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<ApiIngressConfig, _> = serde_json::from_value(serde_json::json!({
            "bind_addr": "0.0.0.0:9000",
            "grpc_port": 50051
        }));
        assert!(res.is_err());
    }
}
