//! Async HTTP client wrapping the santuario JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use santuario_core::{
  daily::DailySelection,
  document::{DisplaySections, SectionKind},
  journal::{ChallengeStatus, JournalEntry},
  mentor::MentorNote,
  xp::{XpAward, XpStatus},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Connection settings for the santuario API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

// ─── Response shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EntryView {
  pub entry:    JournalEntry,
  pub sections: DisplaySections,
}

#[derive(Debug, Deserialize)]
pub struct SectionSaved {
  pub sections:      DisplaySections,
  pub classified_as: SectionKind,
  pub xp_awarded:    Option<XpAward>,
}

#[derive(Debug, Deserialize)]
pub struct EntrySaved {
  pub entry:      JournalEntry,
  pub xp_awarded: Option<XpAward>,
}

#[derive(Debug, Deserialize)]
pub struct MentorReply {
  pub note:       MentorNote,
  pub fell_back:  bool,
  pub xp_awarded: Option<XpAward>,
}

#[derive(Debug, Deserialize)]
struct ResetReply {
  salt: String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async HTTP client for the santuario JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Turn a non-success response into an error carrying the server's
  /// `{"error": ...}` message.
  async fn ensure_ok(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<Value>()
      .await
      .ok()
      .and_then(|v| v["error"].as_str().map(str::to_owned))
      .unwrap_or_default();
    Err(anyhow!("{what} → {status} {message}"))
  }

  // ── Daily ─────────────────────────────────────────────────────────────────

  /// `GET /api/daily[?date=<date>]`
  pub async fn daily(&self, date: Option<NaiveDate>) -> Result<DailySelection> {
    let mut req = self.auth(self.client.get(self.url("/daily")));
    if let Some(d) = date {
      req = req.query(&[("date", d.to_string())]);
    }
    let resp = req.send().await.context("GET /daily failed")?;
    let resp = Self::ensure_ok(resp, "GET /daily").await?;
    resp.json().await.context("deserialising daily selection")
  }

  /// `POST /api/daily/reset`
  pub async fn reset(&self) -> Result<String> {
    let resp = self
      .auth(self.client.post(self.url("/daily/reset")))
      .send()
      .await
      .context("POST /daily/reset failed")?;
    let resp = Self::ensure_ok(resp, "POST /daily/reset").await?;
    let reply: ResetReply = resp.json().await.context("deserialising reset reply")?;
    Ok(reply.salt)
  }

  // ── Journal ───────────────────────────────────────────────────────────────

  /// `GET /api/journal/<date>`; `None` if nothing was saved that day.
  pub async fn entry(&self, date: NaiveDate) -> Result<Option<EntryView>> {
    let path = format!("/journal/{date}");
    let resp = self
      .auth(self.client.get(self.url(&path)))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let resp = Self::ensure_ok(resp, &format!("GET {path}")).await?;
    resp.json().await.context("deserialising entry").map(Some)
  }

  /// `POST /api/journal/<date>/sections`
  pub async fn save_section(
    &self,
    date: NaiveDate,
    kind: SectionKind,
    fragment: &str,
  ) -> Result<SectionSaved> {
    let path = format!("/journal/{date}/sections");
    let resp = self
      .auth(self.client.post(self.url(&path)))
      .json(&json!({ "kind": kind, "fragment": fragment }))
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    let resp = Self::ensure_ok(resp, &format!("POST {path}")).await?;
    resp.json().await.context("deserialising saved section")
  }

  /// `PUT /api/journal/<date>/mood`
  pub async fn set_mood(&self, date: NaiveDate, mood: u8) -> Result<EntrySaved> {
    self.put_json(&format!("/journal/{date}/mood"), json!({ "mood": mood })).await
  }

  /// `PUT /api/journal/<date>/challenge`
  pub async fn set_challenge(
    &self,
    date: NaiveDate,
    title: &str,
    status: ChallengeStatus,
  ) -> Result<EntrySaved> {
    self
      .put_json(
        &format!("/journal/{date}/challenge"),
        json!({ "title": title, "status": status }),
      )
      .await
  }

  async fn put_json(&self, path: &str, body: Value) -> Result<EntrySaved> {
    let resp = self
      .auth(self.client.put(self.url(path)))
      .json(&body)
      .send()
      .await
      .with_context(|| format!("PUT {path} failed"))?;
    let resp = Self::ensure_ok(resp, &format!("PUT {path}")).await?;
    resp.json().await.context("deserialising saved entry")
  }

  /// `POST /api/journal/<date>/mentor`
  pub async fn consult_mentor(&self, date: NaiveDate) -> Result<MentorReply> {
    let path = format!("/journal/{date}/mentor");
    let resp = self
      .auth(self.client.post(self.url(&path)))
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    let resp = Self::ensure_ok(resp, &format!("POST {path}")).await?;
    resp.json().await.context("deserialising mentor reply")
  }

  // ── Progress ──────────────────────────────────────────────────────────────

  /// `GET /api/xp`
  pub async fn xp(&self) -> Result<XpStatus> {
    let resp = self
      .auth(self.client.get(self.url("/xp")))
      .send()
      .await
      .context("GET /xp failed")?;
    let resp = Self::ensure_ok(resp, "GET /xp").await?;
    resp.json().await.context("deserialising xp status")
  }

  /// `GET /api/export`, returned as raw JSON for printing.
  pub async fn export(&self) -> Result<Value> {
    let resp = self
      .auth(self.client.get(self.url("/export")))
      .send()
      .await
      .context("GET /export failed")?;
    let resp = Self::ensure_ok(resp, "GET /export").await?;
    resp.json().await.context("deserialising export")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> ApiClient {
    ApiClient::new(ApiConfig {
      base_url: base.into(),
      username: "marco".into(),
      password: "x".into(),
    })
    .unwrap()
  }

  #[test]
  fn url_joins_api_prefix() {
    assert_eq!(client("http://h:8080/").url("/xp"), "http://h:8080/api/xp");
    assert_eq!(client("http://h:8080").url("/daily"), "http://h:8080/api/daily");
  }
}
