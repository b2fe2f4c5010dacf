//! Plan-estimate endpoint in API Gateway proxy form.

use crate::core::pricer::PlanPricer;
use crate::core::PriceSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ApiResponse {
    fn json(status_code: u16, body: String) -> Self {
        Self {
            status_code,
            headers: HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            body,
            is_base64_encoded: false,
        }
    }

    fn error(status_code: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::json(status_code, body)
    }
}

/// Price the plan in the request body.
///
/// Every failure is answered with a JSON `{"error": ...}` body; the handler
/// itself never fails.
pub async fn handle_estimate<P: PriceSource>(
    pricer: &PlanPricer<P>,
    request: &ApiRequest,
) -> ApiResponse {
    if request.is_base64_encoded {
        return ApiResponse::error(415, "base64-encoded bodies are not supported");
    }
    let Some(body) = request.body.as_deref().filter(|b| !b.trim().is_empty()) else {
        return ApiResponse::error(400, "request body must be a Terraform plan JSON document");
    };

    match pricer.price_plan_json(body).await {
        Ok(estimate) => match serde_json::to_string(&estimate) {
            Ok(json) => ApiResponse::json(200, json),
            Err(e) => ApiResponse::error(500, &e.to_string()),
        },
        Err(e) => {
            tracing::error!(error = %e, category = ?e.category(), "Plan estimate failed");
            ApiResponse::error(e.status_code(), &e.to_string())
        }
    }
}
