//! OpenAI-compatible HTTP mentor.
//!
//! Works with any endpoint exposing `POST {endpoint}/chat/completions` with
//! JSON mode (OpenAI, Ollama, vLLM, LocalAI, ...). The model is asked for a
//! JSON object `{"feedback": "..."}`.

use std::time::Duration;

use reqwest::{Client, header};
use santuario_core::mentor::{Mentor, MentorError, MentorFuture, MentorNote, MentorRequest};
use serde::{Deserialize, Serialize};

use crate::config::MentorConfig;

const SYSTEM_PROMPT: &str = "Eres un mentor estoico. Lees la entrada de diario \
                             de hoy y respondes en español con una reflexión \
                             breve (dos o tres frases), cálida y práctica, \
                             inspirada en Séneca, Epicteto y Marco Aurelio. \
                             Responde solo con un objeto JSON de la forma \
                             {\"feedback\": \"...\"}.";

pub struct HttpMentor {
  client:   Client,
  endpoint: String,
  api_key:  Option<String>,
  model:    String,
}

impl HttpMentor {
  pub fn new(config: &MentorConfig) -> Result<Self, reqwest::Error> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      endpoint: config.endpoint.trim_end_matches('/').to_string(),
      api_key: config.api_key.clone(),
      model: config.model.clone(),
    })
  }

  fn chat_completions_url(&self) -> String { format!("{}/chat/completions", self.endpoint) }

  async fn ask(&self, request: &MentorRequest) -> Result<MentorNote, MentorError> {
    let body = ChatRequest {
      model:           self.model.clone(),
      messages:        vec![
        ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
        ChatMessage { role: "user", content: user_prompt(request) },
      ],
      response_format: ResponseFormat { format_type: "json_object" },
    };

    let mut req = self.client.post(self.chat_completions_url()).json(&body);
    if let Some(key) = &self.api_key {
      req = req.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }

    let resp = req.send().await.map_err(|e| {
      if e.is_timeout() {
        MentorError::Timeout
      } else {
        MentorError::Transport(e.to_string())
      }
    })?;

    if !resp.status().is_success() {
      return Err(MentorError::Transport(format!("mentor endpoint → {}", resp.status())));
    }

    let chat: ChatResponse = resp
      .json()
      .await
      .map_err(|e| MentorError::InvalidResponse(e.to_string()))?;

    let content = chat
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| MentorError::InvalidResponse("no choices returned".into()))?;

    parse_feedback(&content)
  }
}

impl Mentor for HttpMentor {
  fn reflect<'a>(&'a self, request: &'a MentorRequest) -> MentorFuture<'a> {
    Box::pin(self.ask(request))
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
  model:           String,
  messages:        Vec<ChatMessage>,
  response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
  role:    &'static str,
  content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")]
  format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
  content: Option<String>,
}

// ─── Prompt and parsing ──────────────────────────────────────────────────────

fn user_prompt(request: &MentorRequest) -> String {
  let mood = if request.mood.is_set() {
    format!("{}/5", request.mood.value())
  } else {
    "sin registrar".to_string()
  };
  let mut prompt = format!("Fecha: {}\nÁnimo: {mood}\n", request.date);
  if let Some(quote) = &request.reading_quote {
    prompt.push_str(&format!("Lectura del día: «{quote}»\n"));
  }
  prompt.push_str("\nEntrada del diario (HTML):\n");
  prompt.push_str(&request.entry_text);
  prompt
}

/// Extract `{"feedback": ...}` from the model's reply, tolerating a Markdown
/// code fence around the JSON.
fn parse_feedback(content: &str) -> Result<MentorNote, MentorError> {
  let trimmed = content.trim();
  let json = trimmed
    .strip_prefix("```json")
    .or_else(|| trimmed.strip_prefix("```"))
    .and_then(|s| s.strip_suffix("```"))
    .unwrap_or(trimmed)
    .trim();

  let note: MentorNote =
    serde_json::from_str(json).map_err(|e| MentorError::InvalidResponse(e.to_string()))?;
  if note.feedback.trim().is_empty() {
    return Err(MentorError::InvalidResponse("empty feedback".into()));
  }
  Ok(note)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use santuario_core::journal::Mood;

  use super::*;

  fn request(mood: u8) -> MentorRequest {
    MentorRequest {
      date:          NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
      mood:          Mood::new(mood).unwrap(),
      entry_text:    "<p>Hoy perdí la calma.</p>".into(),
      reading_quote: Some("No nos perturban las cosas.".into()),
    }
  }

  #[test]
  fn parses_plain_and_fenced_json() {
    let plain = parse_feedback(r#"{"feedback": "Respira."}"#).unwrap();
    assert_eq!(plain.feedback, "Respira.");

    let fenced = parse_feedback("```json\n{\"feedback\": \"Vuelve a empezar.\"}\n```").unwrap();
    assert_eq!(fenced.feedback, "Vuelve a empezar.");
  }

  #[test]
  fn rejects_non_json_and_empty_feedback() {
    assert!(matches!(
      parse_feedback("Eres muy sabio."),
      Err(MentorError::InvalidResponse(_))
    ));
    assert!(matches!(
      parse_feedback(r#"{"feedback": "  "}"#),
      Err(MentorError::InvalidResponse(_))
    ));
  }

  #[test]
  fn prompt_carries_mood_reading_and_entry() {
    let p = user_prompt(&request(4));
    assert!(p.contains("Fecha: 2024-03-15"));
    assert!(p.contains("Ánimo: 4/5"));
    assert!(p.contains("No nos perturban las cosas."));
    assert!(p.ends_with("<p>Hoy perdí la calma.</p>"));

    assert!(user_prompt(&request(0)).contains("sin registrar"));
  }

  #[test]
  fn request_body_asks_for_json_mode() {
    let body = ChatRequest {
      model:           "m".into(),
      messages:        vec![ChatMessage { role: "user", content: "x".into() }],
      response_format: ResponseFormat { format_type: "json_object" },
    };
    let v = serde_json::to_value(&body).unwrap();
    assert_eq!(v["response_format"]["type"], "json_object");
    assert_eq!(v["messages"][0]["role"], "user");
  }
}
