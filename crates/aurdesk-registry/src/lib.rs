use std::time::Duration;

use aurdesk_core::PackageRecord;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

/// The registry caps `info` batches in practice; larger requests are split
/// into chunks of at most this many names.
pub const INFO_CHUNK_LIMIT: usize = 100;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBy {
    Name,
    NameDesc,
    Maintainer,
    Depends,
    MakeDepends,
}

impl SearchBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::NameDesc => "name-desc",
            Self::Maintainer => "maintainer",
            Self::Depends => "depends",
            Self::MakeDepends => "makedepends",
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Network(String),

    #[error("registry returned HTTP status {status}")]
    Http { status: u16 },

    #[error("registry response is malformed: {reason}")]
    Malformed { reason: String },
}

/// Blocking HTTP client for the package registry's RPC interface.
#[derive(Debug, Clone)]
pub struct AurClient {
    http: Client,
    base_url: Url,
}

impl AurClient {
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| RegistryError::Network(format!("invalid registry url: {err}")))?;
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("aurdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| RegistryError::Network(err.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// `GET {base}/search/{query}?by={field}`.
    pub fn search(&self, query: &str, by: SearchBy) -> Result<Vec<PackageRecord>, RegistryError> {
        let mut url = self.base_url.clone();
        push_segments(&mut url, &["search", query])?;
        url.query_pairs_mut().append_pair("by", by.as_str());

        let body = self.fetch(url)?;
        parse_rpc_response(&body)
    }

    /// `GET {base}/info?arg[]={name}&...`, one request per chunk of at
    /// most [`INFO_CHUNK_LIMIT`] names. The first failing chunk aborts the
    /// whole call; nothing partial is returned. Results come back in input
    /// order regardless of how the registry ordered them.
    pub fn info<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PackageRecord>, RegistryError> {
        let mut records = Vec::with_capacity(names.len());
        for url in info_request_urls(&self.base_url, names)? {
            let body = self.fetch(url)?;
            records.extend(parse_rpc_response(&body)?);
        }
        Ok(reorder_to_input(records, names))
    }

    fn fetch(&self, url: Url) -> Result<String, RegistryError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|err| RegistryError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Http {
                status: status.as_u16(),
            });
        }
        response
            .text()
            .map_err(|err| RegistryError::Network(err.to_string()))
    }
}

pub(crate) fn info_request_urls<S: AsRef<str>>(
    base_url: &Url,
    names: &[S],
) -> Result<Vec<Url>, RegistryError> {
    let mut urls = Vec::new();
    for chunk in names.chunks(INFO_CHUNK_LIMIT) {
        let mut url = base_url.clone();
        push_segments(&mut url, &["info"])?;
        {
            let mut pairs = url.query_pairs_mut();
            for name in chunk {
                pairs.append_pair("arg[]", name.as_ref());
            }
        }
        urls.push(url);
    }
    Ok(urls)
}

fn push_segments(url: &mut Url, segments: &[&str]) -> Result<(), RegistryError> {
    let mut path = url
        .path_segments_mut()
        .map_err(|()| RegistryError::Network("registry url cannot hold a path".to_string()))?;
    for segment in segments {
        path.push(segment);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(rename = "type", default)]
    kind: String,
    resultcount: Option<i64>,
    results: Option<Vec<RawPackage>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Version")]
    version: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Maintainer")]
    maintainer: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "NumVotes", default)]
    votes: u64,
    #[serde(rename = "Popularity", default)]
    popularity: f64,
    #[serde(rename = "OutOfDate")]
    out_of_date: Option<i64>,
    #[serde(rename = "Keywords", default)]
    keywords: Vec<String>,
    #[serde(rename = "Depends", default)]
    depends: Vec<String>,
    #[serde(rename = "MakeDepends", default)]
    make_depends: Vec<String>,
}

impl RawPackage {
    fn into_record(self) -> PackageRecord {
        let (Some(name), Some(version)) = (self.name, self.version) else {
            return PackageRecord::invalid();
        };

        let mut record = PackageRecord::new(name, version);
        record.description = self.description.unwrap_or_default();
        record.maintainer = self.maintainer;
        record.url = self.url;
        record.votes = self.votes;
        record.popularity = self.popularity;
        record.out_of_date = self.out_of_date.is_some();
        record.keywords = self.keywords;
        record.depends = self.depends;
        record.make_depends = self.make_depends;
        record
    }
}

/// Decodes one RPC response body. Undecodable or structurally wrong
/// payloads are `Malformed`, never a partial result; records missing
/// required fields come back marked invalid.
pub(crate) fn parse_rpc_response(body: &str) -> Result<Vec<PackageRecord>, RegistryError> {
    let response: RpcResponse = serde_json::from_str(body).map_err(|err| {
        tracing::warn!(payload = %payload_snippet(body), "undecodable registry response");
        RegistryError::Malformed {
            reason: err.to_string(),
        }
    })?;

    if response.kind == "error" {
        return Err(RegistryError::Malformed {
            reason: response
                .error
                .unwrap_or_else(|| "registry reported an unspecified error".to_string()),
        });
    }

    let (Some(resultcount), Some(results)) = (response.resultcount, response.results) else {
        tracing::warn!(payload = %payload_snippet(body), "registry response is missing results");
        return Err(RegistryError::Malformed {
            reason: "response is missing resultcount or results".to_string(),
        });
    };

    if resultcount != results.len() as i64 {
        tracing::warn!(
            resultcount,
            received = results.len(),
            "registry resultcount disagrees with results length"
        );
    }

    Ok(results.into_iter().map(RawPackage::into_record).collect())
}

pub(crate) fn reorder_to_input<S: AsRef<str>>(
    mut records: Vec<PackageRecord>,
    names: &[S],
) -> Vec<PackageRecord> {
    let mut ordered = Vec::with_capacity(records.len());
    for name in names {
        if let Some(position) = records
            .iter()
            .position(|record| record.is_valid() && record.name == name.as_ref())
        {
            ordered.push(records.remove(position));
        }
    }
    ordered.extend(records.into_iter().filter(PackageRecord::is_valid));
    ordered
}

fn payload_snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(index, _)| index)
        .unwrap_or(body.len());
    &body[..end]
}
