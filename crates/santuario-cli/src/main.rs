//! `santuario`: command-line client for the Santuario journal server.
//!
//! # Usage
//!
//! ```
//! santuario --url http://localhost:8080 --user marco --password secret today
//! santuario --config ~/.config/santuario/config.toml write morning "Hoy practicaré la paciencia"
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use santuario_core::{
  daily::DailySelection,
  document::{DisplaySections, SectionKind, escape_html, ritual_block},
  journal::ChallengeStatus,
  xp::XpAward,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "santuario", about = "Daily Stoic journal client")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the santuario server (default: http://localhost:8080).
  #[arg(long, env = "SANTUARIO_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "SANTUARIO_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "SANTUARIO_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the day's reading, philosopher, meditation, task and question.
  Today {
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// Reshuffle the daily selection.
  Reset,
  /// Show the journal entry for a date.
  Show { date: NaiveDate },
  /// Save text into a section of the day's entry.
  Write {
    #[arg(value_parser = parse_section)]
    section: SectionKind,
    text:    String,
    #[arg(long)]
    date:    Option<NaiveDate>,
  },
  /// Log the day's mood (1-5, 0 clears it).
  Mood {
    #[arg(value_parser = clap::value_parser!(u8).range(0..=5))]
    mood: u8,
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// Record the outcome of the day's challenge.
  Challenge {
    title:  String,
    #[arg(value_parser = parse_status)]
    status: ChallengeStatus,
    #[arg(long)]
    date:   Option<NaiveDate>,
  },
  /// Ask the mentor to reflect on the day's entry.
  Mentor {
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// Show experience and level.
  Xp,
  /// Print every entry and the XP status as JSON.
  Export,
}

fn parse_section(s: &str) -> Result<SectionKind, String> {
  s.parse()
    .map_err(|_| format!("expected morning, evening or free, got {s:?}"))
}

fn parse_status(s: &str) -> Result<ChallengeStatus, String> {
  s.parse()
    .map_err(|_| format!("expected success or failed, got {s:?}"))
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };
  tracing::debug!(url = %api_config.base_url, user = %api_config.username, "connecting");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

fn today() -> NaiveDate { Local::now().date_naive() }

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Today { date } => {
      let selection = client.daily(date).await?;
      print_daily(&selection);
    }
    Command::Reset => {
      client.reset().await?;
      println!("Selección diaria renovada.");
    }
    Command::Show { date } => match client.entry(date).await? {
      Some(view) => {
        println!("{date}  ánimo: {}", mood_label(view.entry.mood.value()));
        if let Some(title) = &view.entry.challenge_title {
          let status = view
            .entry
            .effective_challenge_status()
            .map_or("pendiente".to_string(), |s| s.to_string());
          println!("reto: {title} ({status})");
        }
        print_sections(&view.sections);
      }
      None => println!("No hay entrada para {date}."),
    },
    Command::Write { section, text, date } => {
      let date = date.unwrap_or_else(today);
      let fragment = match section {
        SectionKind::Free => format!("<p>{}</p>", escape_html(&text)),
        kind => ritual_block(kind, &format!("<p>{}</p>", escape_html(&text))),
      };
      let saved = client.save_section(date, section, &fragment).await?;
      println!("Guardado en {}.", saved.classified_as);
      print_award(saved.xp_awarded.as_ref());
      print_sections(&saved.sections);
    }
    Command::Mood { mood, date } => {
      let saved = client.set_mood(date.unwrap_or_else(today), mood).await?;
      println!("Ánimo: {}", mood_label(saved.entry.mood.value()));
      print_award(saved.xp_awarded.as_ref());
    }
    Command::Challenge { title, status, date } => {
      let saved = client
        .set_challenge(date.unwrap_or_else(today), &title, status)
        .await?;
      println!("Reto «{title}»: {status}");
      print_award(saved.xp_awarded.as_ref());
    }
    Command::Mentor { date } => {
      let reply = client.consult_mentor(date.unwrap_or_else(today)).await?;
      println!("{}", reply.note.feedback);
      if reply.fell_back {
        tracing::info!("mentor unavailable; fallback reflection shown");
      }
      print_award(reply.xp_awarded.as_ref());
    }
    Command::Xp => {
      let xp = client.xp().await?;
      println!(
        "Nivel {}  ·  {} XP en total  ·  {}/{} hacia el siguiente nivel",
        xp.level, xp.total, xp.into_level, xp.for_next
      );
    }
    Command::Export => {
      let data = client.export().await?;
      println!("{}", serde_json::to_string_pretty(&data)?);
    }
  }
  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn mood_label(mood: u8) -> String {
  if mood == 0 { "sin registrar".to_string() } else { format!("{mood}/5") }
}

fn print_award(award: Option<&XpAward>) {
  if let Some(a) = award {
    println!("+{} XP ({})", a.xp, a.interaction);
  }
}

fn print_daily(s: &DailySelection) {
  println!("── {} ──", s.date);
  if let Some(r) = &s.reading {
    println!("\n{}\n«{}»", r.title, r.quote);
    if let Some(author) = &r.author {
      println!("  — {author}");
    }
  }
  if let Some(p) = &s.philosopher {
    let how = if s.is_match { "autor de la lectura" } else { "filósofo del día" };
    println!("\n{} ({how})", p.name);
    if let Some(d) = &p.description {
      println!("{d}");
    }
  }
  if let Some(m) = &s.meditation {
    match m.duration_minutes {
      Some(min) => println!("\nMeditación: {} ({min} min)", m.title),
      None => println!("\nMeditación: {}", m.title),
    }
  }
  if let Some(t) = &s.task {
    println!("Tarea: {}", t.title);
  }
  if let Some(q) = &s.question {
    println!("Pregunta: {}", q.question);
  }
}

fn print_sections(s: &DisplaySections) {
  if let Some(m) = &s.morning {
    println!("\n[mañana]\n{}", plain_text(m));
  }
  if !s.free.trim().is_empty() {
    println!("\n[notas]\n{}", plain_text(&s.free));
  }
  if let Some(e) = &s.evening {
    println!("\n[noche]\n{}", plain_text(e));
  }
}

/// Flatten display HTML for the terminal: line breaks for `<br>` and block
/// ends, every other tag dropped, common entities decoded.
fn plain_text(html: &str) -> String {
  let mut out = String::with_capacity(html.len());
  let mut rest = html;
  while let Some(lt) = rest.find('<') {
    out.push_str(&rest[..lt]);
    let Some(gt) = rest[lt..].find('>') else {
      rest = &rest[lt..];
      break;
    };
    let tag = rest[lt + 1..lt + gt].to_ascii_lowercase();
    let name = tag.trim_start_matches('/').split([' ', '/']).next().unwrap_or("");
    if matches!(name, "br" | "p" | "div" | "h3" | "li") && (name == "br" || tag.starts_with('/')) {
      out.push('\n');
    }
    rest = &rest[lt + gt + 1..];
  }
  out.push_str(rest);
  out
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&#39;", "'")
    .replace("&amp;", "&")
    .lines()
    .map(str::trim_end)
    .filter(|l| !l.is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}
