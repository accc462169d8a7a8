use std::{
    fmt::Debug,
    io,
    path::{Path, PathBuf},
};

use ::cookie_store::{CookieDomain, CookieStore, RawCookie};
use itertools::Itertools;
use log::debug;
use oj_api_utils::fs_json_util::{read_json, write_json_private};
use serde::{Deserialize, Serialize};
use url::Url;

/// On-disk form of the session cookie jar.
#[derive(Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct CookieFile {
    pub cookies: Vec<StoredCookie>,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// `false` if the cookie is also sent to subdomains of `domain`.
    pub host_only: bool,
}

impl CookieFile {
    pub fn load(path: impl Into<PathBuf> + Debug) -> Result<Self, CookieStoreLoadError> {
        Ok(read_json(path)?)
    }

    /// The file is made readable only by the current user.
    pub fn save(&self, path: impl Into<PathBuf>) -> anyhow::Result<()> {
        write_json_private(path, self)
    }

    pub fn from_store(store: &CookieStore) -> Self {
        let cookies = store
            .iter_unexpired()
            .filter_map(|cookie| {
                let (domain, host_only) = match &cookie.domain {
                    CookieDomain::HostOnly(domain) => (domain.clone(), true),
                    CookieDomain::Suffix(domain) => (domain.clone(), false),
                    CookieDomain::NotPresent | CookieDomain::Empty => return None,
                };
                Some(StoredCookie {
                    name: cookie.name().to_owned(),
                    value: cookie.value().to_owned(),
                    domain,
                    path: String::from(&cookie.path),
                    host_only,
                })
            })
            .sorted()
            .collect();
        Self { cookies }
    }

    /// Rebuilds a cookie jar.  `scheme` is the scheme of the site the cookies belong to.
    pub fn into_store(self, scheme: &str) -> Result<CookieStore, CookieStoreLoadError> {
        let mut store = CookieStore::default();
        for cookie in self.cookies {
            let url = Url::parse(&format!("{scheme}://{}{}", cookie.domain, cookie.path))
                .map_err(|e| CookieStoreLoadError::InvalidCookie(cookie.name.clone(), e.to_string()))?;
            let mut raw = RawCookie::new(cookie.name.clone(), cookie.value);
            raw.set_path(cookie.path);
            if !cookie.host_only {
                raw.set_domain(cookie.domain);
            }
            store
                .insert_raw(&raw, &url)
                .map_err(|e| CookieStoreLoadError::InvalidCookie(cookie.name, format!("{e:?}")))?;
        }
        Ok(store)
    }
}

/// Deletes the cookie file.  A missing file is fine.
pub fn clear(path: &Path) -> io::Result<()> {
    match fs_err::remove_file(path) {
        Ok(()) => {
            debug!("Deleted cookie store at {path:?}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CookieStoreLoadError {
    #[error("Cookie store was not found.")]
    NotFound,
    #[error("An I/O error occurred when loading the cookie store: {0:?}")]
    IOError(io::Error),
    #[error("The cookie store json file is corrupted and could not be loaded: {0:?}")]
    JsonError(#[from] serde_json::Error),
    #[error("The stored cookie {0:?} could not be restored: {1}")]
    InvalidCookie(String, String),
}
impl From<io::Error> for CookieStoreLoadError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::IOError(e),
        }
    }
}
impl From<anyhow::Error> for CookieStoreLoadError {
    fn from(e: anyhow::Error) -> Self {
        let e = match e.downcast::<io::Error>() {
            Ok(e) => return e.into(),
            Err(e) => e,
        };
        match e.downcast::<serde_json::Error>() {
            Ok(e) => Self::JsonError(e),
            Err(e) => Self::IOError(io::Error::other(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use ::cookie_store::CookieStore;
    use url::Url;

    use super::{clear, CookieFile, CookieStoreLoadError, StoredCookie};

    fn sample_store() -> CookieStore {
        let url = Url::parse("https://oj.example.com/api/profile").unwrap();
        let mut store = CookieStore::default();
        store.parse("csrftoken=abc; Path=/", &url).unwrap();
        store.parse("sessionid=xyz; Path=/; HttpOnly", &url).unwrap();
        store
            .parse("lang=en; Domain=example.com; Path=/", &url)
            .unwrap();
        store
    }

    #[test]
    fn snapshot_of_store() {
        let file = CookieFile::from_store(&sample_store());
        let cookie = |name: &str, value: &str, domain: &str, host_only| StoredCookie {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".into(),
            host_only,
        };
        assert_eq!(
            file.cookies,
            [
                cookie("csrftoken", "abc", "oj.example.com", true),
                cookie("lang", "en", "example.com", false),
                cookie("sessionid", "xyz", "oj.example.com", true),
            ]
        );
    }

    #[test]
    fn cookies_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let saved = CookieFile::from_store(&sample_store());
        saved.save(&path).unwrap();

        let store = CookieFile::load(&path).unwrap().into_store("https").unwrap();
        assert_eq!(CookieFile::from_store(&store), saved);
        // The restored suffix cookie still reaches other subdomains.
        let other = Url::parse("https://www.example.com/").unwrap();
        let names = store.matches(&other).iter().map(|c| c.name()).collect::<Vec<_>>();
        assert_eq!(names, ["lang"]);
    }

    #[test]
    fn missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        assert!(matches!(
            CookieFile::load(&path),
            Err(CookieStoreLoadError::NotFound)
        ));
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            CookieFile::load(&path),
            Err(CookieStoreLoadError::JsonError(_))
        ));
        std::fs::write(&path, r#"{"cookies": 1}"#).unwrap();
        assert!(matches!(
            CookieFile::load(&path),
            Err(CookieStoreLoadError::JsonError(_))
        ));
    }

    #[test]
    fn other_io_errors_are_kept() {
        let err = anyhow::Error::new(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
            .context("While trying to parse the cookie store");
        match CookieStoreLoadError::from(err) {
            CookieStoreLoadError::IOError(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied)
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn clear_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        clear(&path).unwrap();
        std::fs::write(&path, "{}").unwrap();
        clear(&path).unwrap();
        assert!(!path.exists());
    }
}
