use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::store::StoreError;

/// PostgREST error payload.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// Postgres `exclusion_violation`.
const EXCLUSION_VIOLATION: &str = "23P01";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let apikey = HeaderValue::from_str(&self.anon_key)
            .map_err(|e| StoreError::Request(format!("Invalid API key header: {}", e)))?;
        headers.insert("apikey", apikey);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Writes that span several tables run under the service role.
        let bearer = if self.service_key.is_empty() { &self.anon_key } else { &self.service_key };
        let auth = HeaderValue::from_str(&format!("Bearer {}", bearer))
            .map_err(|e| StoreError::Request(format!("Invalid authorization header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| StoreError::Request(e.to_string()))?;
            error!("Store API error ({}): {}", status, error_text);
            return Err(Self::map_error(status.as_u16(), &error_text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Insert/update returning the written rows.
    pub async fn request_returning<T>(&self, method: Method, path: &str, body: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        self.request_with_headers(method, path, Some(body), Some(headers)).await
    }

    /// Calls a Postgres function; each call runs in its own transaction.
    pub async fn rpc<T>(&self, function: &str, params: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, Some(params)).await
    }

    fn map_error(status: u16, body: &str) -> StoreError {
        let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
        let message = parsed.message.unwrap_or_else(|| body.to_string());

        if parsed.code.as_deref() == Some(EXCLUSION_VIOLATION) || message.contains("appointment_overlap") {
            return StoreError::Overlap;
        }
        if message.contains("insufficient_credits") {
            return StoreError::InsufficientCredits;
        }
        if message.contains("appointment_not_scheduled") {
            return StoreError::InvalidState("Appointment is not scheduled".to_string());
        }
        if message.contains("patient_not_found") {
            return StoreError::NotFound("Patient".to_string());
        }
        if message.contains("appointment_not_found") {
            return StoreError::NotFound("Appointment".to_string());
        }

        match status {
            404 => StoreError::NotFound(message),
            _ => StoreError::Request(format!("API error ({}): {}", status, message)),
        }
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
