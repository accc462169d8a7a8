use std::path::PathBuf;

use url::Url;

/// Name of the cookie file, placed next to the executable unless overridden.
pub const COOKIE_STORE_FILE_NAME: &str = ".oj_api_cookies.json";

#[derive(Clone, Debug)]
pub struct Config {
    pub site: Url,
    pub cookie_store_path: PathBuf,
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("The base URL of the judge is not configured.  Please set SITE (or pass --site).")]
    MissingSite,
    #[error("The configured site is not a valid URL: {0}")]
    InvalidSite(#[from] url::ParseError),
    #[error("The configured site {0} has no host name.")]
    SiteWithoutHost(Url),
    #[error("No csrftoken cookie was found in the session.")]
    NoCsrfToken,
    #[error("The csrftoken cookie cannot be sent as a header: {0}")]
    InvalidCsrfToken(#[from] reqwest::header::InvalidHeaderValue),
}

impl Config {
    pub fn new(
        site: Option<&str>,
        cookie_store_path: Option<PathBuf>,
        verbose: bool,
    ) -> anyhow::Result<Self> {
        let site = site
            .filter(|site| !site.is_empty())
            .ok_or(ConfigurationError::MissingSite)?;
        let site = Url::parse(site).map_err(ConfigurationError::from)?;
        if site.host_str().is_none() {
            return Err(ConfigurationError::SiteWithoutHost(site).into());
        }
        let cookie_store_path = match cookie_store_path {
            Some(path) => path,
            None => default_cookie_store_path()?,
        };
        Ok(Self {
            site,
            cookie_store_path,
            verbose,
        })
    }

    pub fn host(&self) -> &str {
        self.site.host_str().unwrap_or_default()
    }
}

pub fn default_cookie_store_path() -> std::io::Result<PathBuf> {
    Ok(std::env::current_exe()?.with_file_name(COOKIE_STORE_FILE_NAME))
}
