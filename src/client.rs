//! Blocking HTTP client for the Evohome EMEA v1 web API.
//!
//! - Blocking client using `ureq` (no async).
//! - Uses the models in `crate::models::evohome`.
//! - Covers the endpoints the topology and refresh passes need, plus the two zone writes
//!   (heat setpoint, weekly schedule).
//!
//! Authentication
//! - OAuth2 password grant against the vendor token endpoint. The session is consulted
//!   before every call and renewed by a fresh login once stale; a 401 triggers one
//!   re-login and a single retry.

use chrono::Utc;
use http::StatusCode;
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use ureq::Body;

use crate::error::EvohomeError;
use crate::models::evohome::*;
use crate::session::{DEFAULT_TOKEN_LIFETIME_SECS, Session, TokenPair};

pub const DEFAULT_HOST: &str = "https://tccna.honeywell.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_PATH: &str = "/Auth/OAuth/Token";
const API_PATH: &str = "/WebAPI/emea/api/v1";
const APPLICATION_ID: &str = "b013aa26-9724-4dbd-8897-048b9aada249";
const APPLICATION_AUTHORIZATION: &str = "Basic YjAxM2FhMjYtOTcyNC00ZGJkLTg4OTctMDQ4YjlhYWRhMjQ5OnRlc3Q=";
const OAUTH_SCOPE: &str = "EMEA-V1-Basic EMEA-V1-Anonymous EMEA-V1-Get-Current-User-Account";

/// Operations the topology and refresh passes need from the vendor API.
pub trait EvohomeApi {
    fn get_account(&self) -> Result<Account, EvohomeError>;

    /// Full installation tree for a user, including control systems and zones.
    fn get_installations(&self, user_id: &UserId) -> Result<Vec<Installation>, EvohomeError>;

    /// Live temperatures and setpoints for every zone of a location.
    fn get_location_status(&self, location_id: &LocationId) -> Result<LocationStatus, EvohomeError>;

    fn get_zone_schedule(&self, zone_id: &ZoneId) -> Result<Schedule, EvohomeError>;

    fn set_zone_heat_setpoint(&self, zone_id: &ZoneId, request: &HeatSetpointRequest) -> Result<(), EvohomeError>;

    fn set_zone_schedule(&self, zone_id: &ZoneId, schedule: &Schedule) -> Result<(), EvohomeError>;
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Endpoints {
    pub fn for_host(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Endpoints {
            token_url: format!("{}{}", host, TOKEN_PATH),
            api_base: format!("{}{}", host, API_PATH),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints::for_host(DEFAULT_HOST)
    }
}

pub struct EvohomeClient {
    agent: ureq::Agent,
    endpoints: Endpoints,
    credentials: Credentials,
    session: Mutex<Session>,
}

impl EvohomeClient {
    /// Build a client around an existing session without touching the network.
    pub fn new(credentials: Credentials, endpoints: Endpoints, timeout: Duration, session: Session) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        EvohomeClient {
            agent: config.into(),
            endpoints,
            credentials,
            session: Mutex::new(session),
        }
    }

    /// Build a client and log in.
    pub fn login(credentials: Credentials, endpoints: Endpoints, timeout: Duration) -> Result<Self, EvohomeError> {
        let client = Self::new(credentials, endpoints, timeout, Session::new());
        client.authenticate()?;
        Ok(client)
    }

    /// Log in with the stored credentials, replacing any held tokens.
    pub fn authenticate(&self) -> Result<(), EvohomeError> {
        let mut session = self.lock_session();
        let tokens = self.password_grant()?;
        session.authenticate(tokens);
        Ok(())
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.lock_session().clone()
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoints.api_base, path.trim_start_matches('/'))
    }

    fn password_grant(&self) -> Result<TokenPair, EvohomeError> {
        #[derive(serde::Deserialize)]
        struct R {
            access_token: String,
            refresh_token: String,
            #[serde(default)]
            expires_in: Option<i64>,
        }

        let issued_at = Utc::now();
        let mut resp = self
            .agent
            .post(&self.endpoints.token_url)
            .header("Authorization", APPLICATION_AUTHORIZATION)
            .header("Accept", "application/json")
            .send_form([
                ("grant_type", "password"),
                ("scope", OAUTH_SCOPE),
                ("Username", self.credentials.username.as_str()),
                ("Password", self.credentials.password.as_str()),
            ])?;

        let status = resp.status();
        if is_credential_rejection(status) {
            let body = read_body_lossy(&mut resp);
            return Err(EvohomeError::Auth(format!("login rejected with http {}: {}", status.as_u16(), body)));
        }
        // anything else (throttling, outages) is a transport fault the caller may retry
        let mut resp = check_status(&self.endpoints.token_url, resp)?;

        let body = resp.body_mut().read_to_string()?;
        let R {
            access_token,
            refresh_token,
            expires_in,
        } = serde_json::from_str(&body).map_err(|e| EvohomeError::Auth(format!("unusable token response: {}", e)))?;

        let lifetime = chrono::Duration::seconds(expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS).max(0));
        info!("Auth: obtained access token valid for {}s", lifetime.num_seconds());
        Ok(TokenPair {
            access_token,
            refresh_token,
            issued_at,
            lifetime,
        })
    }

    /// Current access token, logging in first when the session is missing or stale.
    ///
    /// The session lock is held across the login so concurrent callers wait for one renewal.
    fn bearer(&self) -> Result<String, EvohomeError> {
        let mut session = self.lock_session();
        if session.requires_reauthentication(Utc::now()) {
            if session.is_authenticated() {
                info!("Auth: access token expired; logging in again");
            }
            let tokens = self.password_grant()?;
            let token = tokens.access_token.clone();
            session.authenticate(tokens);
            return Ok(token);
        }
        session
            .access_token()
            .map(str::to_owned)
            .ok_or_else(|| EvohomeError::Auth("no access token held".to_string()))
    }

    /// Log in again after `rejected` was refused, unless another caller already replaced it.
    fn reauthenticate(&self, rejected: &str) -> Result<String, EvohomeError> {
        let mut session = self.lock_session();
        if let Some(current) = session.access_token()
            && current != rejected
            && !session.requires_reauthentication(Utc::now())
        {
            return Ok(current.to_owned());
        }
        session.invalidate();
        let tokens = self.password_grant()?;
        let token = tokens.access_token.clone();
        session.authenticate(tokens);
        Ok(token)
    }

    fn send_authorized<F>(&self, url: &str, send: F) -> Result<http::Response<Body>, EvohomeError>
    where
        F: Fn(&str) -> Result<http::Response<Body>, ureq::Error>,
    {
        let token = self.bearer()?;
        let resp = send(&format!("bearer {}", token))?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check_status(url, resp);
        }

        // retry once with a fresh login
        warn!("Auth: {} rejected the access token; logging in again", url);
        let token = self.reauthenticate(&token)?;
        let resp = send(&format!("bearer {}", token))?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(EvohomeError::Auth(format!("{} rejected a freshly issued access token", url)));
        }
        check_status(url, resp)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, EvohomeError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let resp = self.send_authorized(&url, |authorization| {
            let mut req = self
                .agent
                .get(&url)
                .header("Authorization", authorization)
                .header("ApplicationId", APPLICATION_ID)
                .header("Accept", "application/json");
            for (k, v) in query {
                req = req.query(*k, *v);
            }
            req.call()
        })?;
        decode(resp)
    }

    fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), EvohomeError> {
        let url = self.url(path);
        debug!("PUT {}", url);
        self.send_authorized(&url, |authorization| {
            self.agent
                .put(&url)
                .header("Authorization", authorization)
                .header("ApplicationId", APPLICATION_ID)
                .header("Accept", "application/json")
                .send_json(body)
        })?;
        Ok(())
    }
}

impl EvohomeApi for EvohomeClient {
    fn get_account(&self) -> Result<Account, EvohomeError> {
        self.get_json("userAccount", &[])
    }

    fn get_installations(&self, user_id: &UserId) -> Result<Vec<Installation>, EvohomeError> {
        self.get_json(
            "location/installationInfo",
            &[
                ("userId", user_id.0.as_str()),
                ("includeTemperatureControlSystems", "True"),
            ],
        )
    }

    fn get_location_status(&self, location_id: &LocationId) -> Result<LocationStatus, EvohomeError> {
        self.get_json(
            &format!("location/{}/status", location_id.0),
            &[("includeTemperatureControlSystems", "True")],
        )
    }

    fn get_zone_schedule(&self, zone_id: &ZoneId) -> Result<Schedule, EvohomeError> {
        self.get_json(&format!("temperatureZone/{}/schedule", zone_id.0), &[])
    }

    fn set_zone_heat_setpoint(&self, zone_id: &ZoneId, request: &HeatSetpointRequest) -> Result<(), EvohomeError> {
        self.put_json(&format!("temperatureZone/{}/heatSetpoint", zone_id.0), request)
    }

    fn set_zone_schedule(&self, zone_id: &ZoneId, schedule: &Schedule) -> Result<(), EvohomeError> {
        self.put_json(&format!("temperatureZone/{}/schedule", zone_id.0), schedule)
    }
}

/// Token endpoint statuses that mean the credentials themselves were refused.
fn is_credential_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

fn check_status(url: &str, mut resp: http::Response<Body>) -> Result<http::Response<Body>, EvohomeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = read_body_lossy(&mut resp);
    Err(EvohomeError::Http {
        status: status.as_u16(),
        url: url.to_string(),
        message,
    })
}

fn read_body_lossy(resp: &mut http::Response<Body>) -> String {
    resp.body_mut()
        .read_to_string()
        .unwrap_or_else(|_| String::from("<no body>"))
}

fn decode<T: DeserializeOwned>(mut resp: http::Response<Body>) -> Result<T, EvohomeError> {
    let body = resp.body_mut().read_to_string()?;
    let mut de = serde_json::Deserializer::from_str(&body);
    serde_path_to_error::deserialize(&mut de).map_err(EvohomeError::decode)
}
