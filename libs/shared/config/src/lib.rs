use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub video_api_base_url: String,
    pub video_application_id: String,
    pub video_application_secret: String,
    pub bind_address: String,
    pub store_backend: StoreBackend,
    pub scheduling: SchedulingConfig,
}

/// Knobs for slot generation, booking cost and the video join window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub slot_minutes: i64,
    pub horizon_days: i64,
    pub appointment_credit_cost: i64,
    pub join_lead_minutes: i64,
    pub token_grace_minutes: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            horizon_days: 4,
            appointment_credit_cost: 2,
            join_lead_minutes: 30,
            token_grace_minutes: 60,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            slot_minutes: env_or("SLOT_MINUTES", defaults.slot_minutes),
            horizon_days: env_or("SLOT_HORIZON_DAYS", defaults.horizon_days),
            appointment_credit_cost: env_or("APPOINTMENT_CREDIT_COST", defaults.appointment_credit_cost),
            join_lead_minutes: env_or("VIDEO_JOIN_LEAD_MINUTES", defaults.join_lead_minutes),
            token_grace_minutes: env_or("VIDEO_TOKEN_GRACE_MINUTES", defaults.token_grace_minutes),
        }
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        if default.is_empty() {
            warn!("{} not set, using empty value", key);
        } else {
            warn!("{} not set, using default", key);
        }
        default.to_string()
    })
}

impl AppConfig {
    pub fn from_env() -> Self {
        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("supabase") | Err(_) => StoreBackend::Supabase,
            Ok(other) => {
                warn!("Unknown STORE_BACKEND '{}', falling back to supabase", other);
                StoreBackend::Supabase
            }
        };

        let config = Self {
            supabase_url: env_string("SUPABASE_URL", ""),
            supabase_anon_key: env_string("SUPABASE_ANON_PUBLIC_KEY", ""),
            supabase_service_role_key: env_string("SUPABASE_SERVICE_ROLE_KEY", ""),
            supabase_jwt_secret: env_string("SUPABASE_JWT_SECRET", ""),
            video_api_base_url: env_string("VIDEO_API_BASE_URL", "https://video.api.vonage.com"),
            video_application_id: env_string("VIDEO_APPLICATION_ID", ""),
            video_application_secret: env_string("VIDEO_APPLICATION_SECRET", ""),
            bind_address: env_string("BIND_ADDRESS", "0.0.0.0:3000"),
            store_backend,
            scheduling: SchedulingConfig::from_env(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_jwt_secret.is_empty()
            && (self.store_backend == StoreBackend::Memory
                || (!self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()))
    }

    pub fn is_video_configured(&self) -> bool {
        !self.video_api_base_url.is_empty()
            && !self.video_application_id.is_empty()
            && !self.video_application_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduling_defaults_match_booking_rules() {
        let config = SchedulingConfig::default();
        assert_eq!(config.slot_minutes, 30);
        assert_eq!(config.horizon_days, 4);
        assert_eq!(config.appointment_credit_cost, 2);
        assert_eq!(config.join_lead_minutes, 30);
    }

    #[test]
    fn invalid_override_falls_back_to_default() {
        env::set_var("SLOT_MINUTES_TEST_ONLY", "not-a-number");
        assert_eq!(env_or("SLOT_MINUTES_TEST_ONLY", 30i64), 30);
        env::set_var("SLOT_MINUTES_TEST_ONLY", "45");
        assert_eq!(env_or("SLOT_MINUTES_TEST_ONLY", 30i64), 45);
        env::remove_var("SLOT_MINUTES_TEST_ONLY");
    }
}
