//! URL and bare-domain extraction from free text.
//!
//! Two independent passes run over the input: absolute `http(s)://` URLs, and
//! bare domain-shaped tokens such as `www.example.com` or `example.co.uk`.
//! Both feed the same normalization, so overlapping hits collapse into one
//! [`Domain`] in the resulting [`DomainSet`].

use crate::domain::model::{Domain, DomainSet};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

static ABSOLUTE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s"'\)<>]+"#).unwrap());

static BARE_DOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?-u:\b)(?:www\.)?([a-z0-9\-]+(?:\.[a-z0-9\-]+)+)(?-u:\b)").unwrap());

static TOP_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z]{2,24}$").unwrap());

static PORT_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":\d+$").unwrap());

const TRAILING_PUNCTUATION: &[char] = &[')', ',', '.', ';', ':'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Matched with an explicit `http://` or `https://` scheme.
    Absolute,
    /// Domain-shaped token without a scheme.
    Bare,
}

/// A raw match that may or may not normalize into a [`Domain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub raw: String,
    pub kind: CandidateKind,
}

impl Candidate {
    /// The candidate as a URL string, with `http://` added for bare matches.
    pub fn as_url(&self) -> String {
        match self.kind {
            CandidateKind::Absolute => self.raw.clone(),
            CandidateKind::Bare => format!("http://{}", self.raw),
        }
    }

    /// `None` when the candidate does not parse as a URL or has no host.
    pub fn to_domain(&self) -> Option<Domain> {
        let url = Url::parse(&self.as_url()).ok()?;
        normalize_hostname(url.host_str()?)
    }
}

/// Lowercase, trim, drop a trailing dot, a leading `www.` and a `:port` suffix.
pub fn normalize_hostname(host: &str) -> Option<Domain> {
    let mut host = host.trim().to_lowercase();

    if host.ends_with('.') {
        host.pop();
    }
    if let Some(stripped) = host.strip_prefix("www.") {
        host = stripped.to_string();
    }
    let host = PORT_SUFFIX_RE.replace(&host, "").into_owned();

    if host.is_empty() {
        None
    } else {
        Some(Domain::from_normalized(host))
    }
}

/// All absolute-URL candidates, then all surviving bare candidates, in text order.
pub fn extract_candidates(text: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    if text.is_empty() {
        return candidates;
    }

    for m in ABSOLUTE_URL_RE.find_iter(text) {
        let trimmed = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        candidates.push(Candidate {
            raw: trimmed.to_string(),
            kind: CandidateKind::Absolute,
        });
    }

    for caps in BARE_DOMAIN_RE.captures_iter(text) {
        let (Some(whole), Some(host)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        // 前一個字元是 '@' 時視為電子郵件，跳過
        if text[..whole.start()].ends_with('@') {
            continue;
        }

        let top_label = host.as_str().rsplit('.').next().unwrap_or_default();
        if !TOP_LABEL_RE.is_match(top_label) {
            continue;
        }

        candidates.push(Candidate {
            raw: host.as_str().to_string(),
            kind: CandidateKind::Bare,
        });
    }

    candidates
}

/// Both outputs of one candidate pass over a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMatches {
    pub domains: DomainSet,
    /// Candidate URLs without duplicates, first occurrence wins.
    pub urls: Vec<String>,
}

/// Domains and candidate URLs from a single [`extract_candidates`] call.
pub fn scan_text(text: &str) -> TextMatches {
    let candidates = extract_candidates(text);
    let mut seen = HashSet::new();

    TextMatches {
        domains: candidates.iter().filter_map(Candidate::to_domain).collect(),
        urls: candidates
            .iter()
            .map(Candidate::as_url)
            .filter(|url| seen.insert(url.clone()))
            .collect(),
    }
}

/// Sorted, deduplicated domains referenced anywhere in `text`.
pub fn extract_domains(text: &str) -> DomainSet {
    extract_candidates(text)
        .iter()
        .filter_map(Candidate::to_domain)
        .collect()
}
