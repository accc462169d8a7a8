use std::path::Path;
use std::sync::{Arc, MutexGuard, PoisonError};

use ::cookie_store::{CookieStore, RawCookie};
use log::debug;
use oj_api_utils::credentials::{Credentials, UserName};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use reqwest_cookie_store::CookieStoreMutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{Config, ConfigurationError};
use crate::cookie_store::{CookieFile, CookieStoreLoadError, StoredCookie};
use crate::schema::{Contest, ContestId, Page, Profile, RankEntry, RuleType};

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to build the endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Server returned an error status: {0}")]
    Status(#[source] reqwest::Error),
    #[error("Unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Server rejected the request ({error}): {message}")]
    Rejected { error: String, message: String },
}

/// The `{error, data}` envelope every endpoint responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub error: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}
impl ApiResponse {
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self.error {
            Some(error) => Err(ApiError::Rejected {
                error,
                message: match self.data {
                    serde_json::Value::String(message) => message,
                    data => data.to_string(),
                },
            }),
            None => serde_json::from_value(self.data).map_err(ApiError::Decode),
        }
    }
}

/// HTTP session against a single judge site.
pub struct OjClient {
    reqwest: reqwest::Client,
    cookie_store: Arc<CookieStoreMutex>,
    site: Url,
    host: String,
    csrf_token: Option<HeaderValue>,
}

impl OjClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let cookie_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_str(config.site.as_str())?);
        let reqwest = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookie_store))
            .default_headers(headers)
            .connection_verbose(config.verbose)
            .build()?;
        Ok(Self {
            reqwest,
            cookie_store,
            site: config.site.clone(),
            host: config.host().to_owned(),
            csrf_token: None,
        })
    }

    fn lock_cookies(&self) -> MutexGuard<'_, CookieStore> {
        self.cookie_store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cookies(&self) -> Vec<StoredCookie> {
        CookieFile::from_store(&self.lock_cookies()).cookies
    }

    /// Replaces the cookie jar with the one saved at `path`.
    /// Returns `false`, leaving the jar untouched, if no usable file is there.
    pub fn load_cookies(&self, path: &Path) -> bool {
        let store = CookieFile::load(path).and_then(|file| file.into_store(self.site.scheme()));
        match store {
            Ok(store) => {
                debug!("Loaded cookies from {path:?}");
                *self.lock_cookies() = store;
                true
            }
            Err(CookieStoreLoadError::NotFound) => {
                debug!("Cookie store was not found at {path:?}");
                false
            }
            Err(e) => {
                debug!("Failed to load cookies: {e}");
                false
            }
        }
    }

    pub fn save_cookies(&self, path: &Path) -> anyhow::Result<()> {
        let file = CookieFile::from_store(&self.lock_cookies());
        file.save(path)?;
        debug!("Saved {} cookies to {path:?}", file.cookies.len());
        Ok(())
    }

    /// Blanks the session cookie of the site, forgetting the login locally.
    pub fn clear_session_cookie(&self) -> anyhow::Result<()> {
        let mut raw = RawCookie::new(SESSION_COOKIE, "");
        raw.set_path("/");
        self.lock_cookies()
            .insert_raw(&raw, &self.site)
            .map_err(|e| anyhow::anyhow!("Failed to clear the session cookie: {e:?}"))?;
        Ok(())
    }

    /// Echoes the `csrftoken` cookie in every following request.
    /// Must be called again whenever the cookie jar may have changed.
    pub fn set_csrf_header(&mut self) -> Result<(), ConfigurationError> {
        let cookies = self.cookies();
        let cookie =
            select_csrf_token(&cookies, &self.host).ok_or(ConfigurationError::NoCsrfToken)?;
        debug!(
            "{CSRF_HEADER} set to {} (domain: {})",
            cookie.value, cookie.domain
        );
        self.csrf_token = Some(HeaderValue::from_str(&cookie.value)?);
        Ok(())
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ApiError> {
        let url = Url::parse(&format!(
            "{}/api/{endpoint}",
            self.site.as_str().trim_end_matches('/')
        ))?;
        debug!("{method} {url}");
        let mut builder = self.reqwest.request(method, url);
        if let Some(token) = &self.csrf_token {
            builder = builder.header(CSRF_HEADER, token.clone());
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(ApiError::Transport)?
            .error_for_status()
            .map_err(ApiError::Status)?;
        let body = response.bytes().await.map_err(ApiError::Transport)?;
        serde_json::from_slice::<ApiResponse>(&body)
            .map_err(ApiError::Decode)?
            .into_result()
    }

    /// `None` if the session is not logged in.
    pub async fn get_profile(&self) -> Result<Option<Profile>, ApiError> {
        Self::send(self.request(Method::GET, "profile")?).await
    }

    pub async fn post_tfa_required(&self, username: &UserName) -> Result<bool, ApiError> {
        #[derive(Serialize)]
        struct Request<'a> {
            username: &'a UserName,
        }
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            result: bool,
        }
        let builder = self
            .request(Method::POST, "tfa_required")?
            .json(&Request { username });
        Ok(Self::send::<Response>(builder).await?.result)
    }

    /// Returns the `data` of the response, which is `"Succeeded"` on success.
    pub async fn post_login(
        &self,
        credentials: &Credentials,
    ) -> Result<serde_json::Value, ApiError> {
        Self::send(self.request(Method::POST, "login")?.json(credentials)).await
    }

    pub async fn post_logout(&self) -> Result<(), ApiError> {
        Self::send::<serde_json::Value>(self.request(Method::POST, "logout")?).await?;
        Ok(())
    }

    pub async fn get_contests(
        &self,
        rule_type: RuleType,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Contest>, ApiError> {
        #[derive(Serialize)]
        struct Query<'a> {
            offset: usize,
            limit: usize,
            keyword: &'a str,
            rule_type: &'a str,
            status: &'a str,
        }
        let builder = self.request(Method::GET, "contests")?.query(&Query {
            offset,
            limit,
            keyword: "",
            rule_type: rule_type.as_ref(),
            status: "",
        });
        Self::send(builder).await
    }

    pub async fn get_contest_rank<S: DeserializeOwned>(
        &self,
        contest_id: ContestId,
        offset: usize,
        limit: usize,
    ) -> Result<Page<RankEntry<S>>, ApiError> {
        #[derive(Serialize)]
        struct Query {
            offset: usize,
            limit: usize,
            contest_id: ContestId,
        }
        let builder = self.request(Method::GET, "contest_rank")?.query(&Query {
            offset,
            limit,
            contest_id,
        });
        Self::send(builder).await
    }
}

/// Among the `csrftoken` cookies, prefers the one set for `host`, and otherwise the last one.
pub fn select_csrf_token<'a>(cookies: &'a [StoredCookie], host: &str) -> Option<&'a StoredCookie> {
    let candidates = || cookies.iter().filter(|cookie| cookie.name == CSRF_COOKIE);
    candidates()
        .find(|cookie| cookie.domain == host)
        .or_else(|| candidates().last())
}
