//! Location providers: PSGC HTTP directory and a built-in sample dataset.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::directory::Directory;
use super::types::{LocationError, LocationOption, OptionsKey};

pub const DEFAULT_DIRECTORY_URL: &str = "https://psgc.gitlab.io/api";

const USER_AGENT: &str = concat!("locality-cascade/", env!("CARGO_PKG_VERSION"));

// ─── Built-in dataset ───────────────────────────────────────────

struct BuiltinProvince {
    code: &'static str,
    name: &'static str,
    municipalities: &'static [BuiltinMunicipality],
}

struct BuiltinMunicipality {
    code: &'static str,
    name: &'static str,
    barangays: &'static [(&'static str, &'static str)], // (code, name)
}

const BUILTIN_PROVINCES: &[BuiltinProvince] = &[
    BuiltinProvince {
        code: "020900000",
        name: "Batanes",
        municipalities: &[
            BuiltinMunicipality {
                code: "020901000",
                name: "Basco",
                barangays: &[
                    ("020901001", "Chanarian"),
                    ("020901002", "Ihubok I"),
                    ("020901003", "Ihubok II"),
                    ("020901004", "Kayhuvokan"),
                    ("020901005", "Kaychanarianan"),
                    ("020901006", "San Antonio"),
                ],
            },
            BuiltinMunicipality {
                code: "020902000",
                name: "Itbayat",
                barangays: &[],
            },
            BuiltinMunicipality {
                code: "020903000",
                name: "Ivana",
                barangays: &[],
            },
            BuiltinMunicipality {
                code: "020904000",
                name: "Mahatao",
                barangays: &[],
            },
            BuiltinMunicipality {
                code: "020905000",
                name: "Sabtang",
                barangays: &[],
            },
            BuiltinMunicipality {
                code: "020906000",
                name: "Uyugan",
                barangays: &[],
            },
        ],
    },
    BuiltinProvince {
        code: "072200000",
        name: "Cebu",
        municipalities: &[
            BuiltinMunicipality {
                code: "072217000",
                name: "City of Cebu",
                barangays: &[
                    ("072217001", "Capitol Site"),
                    ("072217002", "Guadalupe"),
                    ("072217003", "Lahug"),
                    ("072217004", "Mabolo"),
                ],
            },
            BuiltinMunicipality {
                code: "072226000",
                name: "City of Lapu-Lapu",
                barangays: &[],
            },
            BuiltinMunicipality {
                code: "072230000",
                name: "City of Mandaue",
                barangays: &[],
            },
        ],
    },
    BuiltinProvince {
        code: "141100000",
        name: "Benguet",
        municipalities: &[
            BuiltinMunicipality {
                code: "141102000",
                name: "City of Baguio",
                barangays: &[],
            },
            BuiltinMunicipality {
                code: "141110000",
                name: "La Trinidad",
                barangays: &[
                    ("141110001", "Balili"),
                    ("141110002", "Betag"),
                    ("141110003", "Pico"),
                    ("141110004", "Poblacion"),
                ],
            },
        ],
    },
];

/// Look up an option list in the built-in dataset.
///
/// Returns None when the dataset has nothing for this request, so callers
/// can tell "unknown here" apart from an empty list.
pub fn builtin_options(key: &OptionsKey) -> Option<Vec<LocationOption>> {
    let mut options: Vec<LocationOption> = match key {
        OptionsKey::Provinces => BUILTIN_PROVINCES
            .iter()
            .map(|p| LocationOption::new(p.code, p.name))
            .collect(),
        OptionsKey::Municipalities(code) => BUILTIN_PROVINCES
            .iter()
            .find(|p| p.code == code.as_str())?
            .municipalities
            .iter()
            .map(|m| LocationOption::new(m.code, m.name))
            .collect(),
        OptionsKey::Barangays(code) => {
            let municipality = BUILTIN_PROVINCES
                .iter()
                .flat_map(|p| p.municipalities.iter())
                .find(|m| m.code == code.as_str())?;
            if municipality.barangays.is_empty() {
                return None;
            }
            municipality
                .barangays
                .iter()
                .map(|(code, name)| LocationOption::new(*code, *name))
                .collect()
        }
    };
    sort_by_name(&mut options);
    Some(options)
}

/// Order options for display (case-insensitive by name, code breaks ties).
pub fn sort_by_name(options: &mut [LocationOption]) {
    options.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.code.cmp(&b.code))
    });
}

// ─── PSGC HTTP provider ─────────────────────────────────────────

/// Client for a PSGC-style REST directory.
#[derive(Clone)]
pub struct HttpDirectory {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpDirectory {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint for one request key.
    pub fn url_for(&self, key: &OptionsKey) -> String {
        match key {
            OptionsKey::Provinces => format!("{}/provinces/", self.base_url),
            OptionsKey::Municipalities(code) => format!(
                "{}/provinces/{}/cities-municipalities/",
                self.base_url,
                encode_segment(code)
            ),
            OptionsKey::Barangays(code) => format!(
                "{}/cities-municipalities/{}/barangays/",
                self.base_url,
                encode_segment(code)
            ),
        }
    }

    /// Fetch one option list. ureq is blocking, so the call runs on
    /// tokio's blocking pool.
    #[tracing::instrument(skip(self), fields(base = %self.base_url))]
    pub async fn fetch(&self, key: &OptionsKey) -> Result<Vec<LocationOption>, LocationError> {
        let url = self.url_for(key);
        let agent = self.agent.clone();
        let what = key.to_string();

        let mut options = tokio::task::spawn_blocking(move || fetch_blocking(&agent, &url, &what))
            .await
            .map_err(|e| LocationError::Network(format!("directory task failed: {}", e)))??;

        sort_by_name(&mut options);
        debug!(count = options.len(), "fetched options");
        Ok(options)
    }
}

fn fetch_blocking(
    agent: &ureq::Agent,
    url: &str,
    what: &str,
) -> Result<Vec<LocationOption>, LocationError> {
    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::Status(404, _) => LocationError::NotFound(what.to_string()),
        ureq::Error::Status(code, _) => {
            LocationError::Network(format!("{} returned HTTP {}", url, code))
        }
        ureq::Error::Transport(t) => LocationError::Network(t.to_string()),
    })?;

    response
        .into_json::<Vec<LocationOption>>()
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn provinces(&self) -> Result<Vec<LocationOption>, LocationError> {
        self.fetch(&OptionsKey::Provinces).await
    }

    async fn municipalities(&self, province: &str) -> Result<Vec<LocationOption>, LocationError> {
        self.fetch(&OptionsKey::Municipalities(province.to_string())).await
    }

    async fn barangays(&self, municipality: &str) -> Result<Vec<LocationOption>, LocationError> {
        self.fetch(&OptionsKey::Barangays(municipality.to_string())).await
    }
}

// ─── URL encoding (path segments only) ──────────────────────────

fn encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_provinces_sorted() {
        let provinces = builtin_options(&OptionsKey::Provinces).unwrap();
        let names: Vec<_> = provinces.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Batanes", "Benguet", "Cebu"]);
    }

    #[test]
    fn test_builtin_municipalities() {
        let towns = builtin_options(&OptionsKey::Municipalities("020900000".into())).unwrap();
        assert_eq!(towns.len(), 6);
        assert_eq!(towns[0], LocationOption::new("020901000", "Basco"));
    }

    #[test]
    fn test_builtin_barangays() {
        let brgys = builtin_options(&OptionsKey::Barangays("141110000".into())).unwrap();
        assert!(brgys.iter().any(|b| b.name == "Betag"));
    }

    #[test]
    fn test_builtin_unknown_parent() {
        assert!(builtin_options(&OptionsKey::Municipalities("999900000".into())).is_none());
        // Known municipality without bundled barangays
        assert!(builtin_options(&OptionsKey::Barangays("020902000".into())).is_none());
    }

    #[test]
    fn test_url_for() {
        let dir = HttpDirectory::new("https://psgc.example/api/", Duration::from_secs(1));
        assert_eq!(dir.base_url(), "https://psgc.example/api");
        assert_eq!(dir.url_for(&OptionsKey::Provinces), "https://psgc.example/api/provinces/");
        assert_eq!(
            dir.url_for(&OptionsKey::Municipalities("072200000".into())),
            "https://psgc.example/api/provinces/072200000/cities-municipalities/"
        );
        assert_eq!(
            dir.url_for(&OptionsKey::Barangays("a/b c".into())),
            "https://psgc.example/api/cities-municipalities/a%2Fb%20c/barangays/"
        );
    }

    #[test]
    fn test_sort_by_name() {
        let mut opts = vec![
            LocationOption::new("2", "mabolo"),
            LocationOption::new("1", "Lahug"),
            LocationOption::new("3", "Capitol Site"),
        ];
        sort_by_name(&mut opts);
        let codes: Vec<_> = opts.iter().map(|o| o.code.as_str()).collect();
        assert_eq!(codes, vec!["3", "1", "2"]);
    }
}
