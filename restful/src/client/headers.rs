//! Response header normalization.

use reqwest::header::HeaderMap;

use crate::config::Headers;

/// Response headers in whichever shape the transport produced them.
#[derive(Debug, Clone)]
pub enum RawHeaders {
    Map(Headers),
    /// Name/value pairs; repeated names are allowed.
    Pairs(Vec<(String, String)>),
    Http(HeaderMap),
}

impl RawHeaders {
    /// Flattens the headers into a plain map.
    ///
    /// Repeated names are joined with `", "` in arrival order. Header values
    /// that are not valid UTF-8 are decoded lossily.
    pub fn into_map(self) -> Headers {
        match self {
            Self::Map(map) => map,
            Self::Pairs(pairs) => join_repeated(pairs),
            Self::Http(map) => join_repeated(map.iter().map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })),
        }
    }
}

fn join_repeated(pairs: impl IntoIterator<Item = (String, String)>) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in pairs {
        headers
            .entry(name)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.clone());
    }
    headers
}

impl Default for RawHeaders {
    fn default() -> Self {
        Self::Map(Headers::new())
    }
}

impl From<Headers> for RawHeaders {
    fn from(map: Headers) -> Self {
        Self::Map(map)
    }
}

impl From<Vec<(String, String)>> for RawHeaders {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl From<HeaderMap> for RawHeaders {
    fn from(map: HeaderMap) -> Self {
        Self::Http(map)
    }
}
