//! Model types shared across the Lunara crates.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the user reported feeling on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mood {
    /// Feeling great.
    Great,
    /// Feeling good.
    Good,
    /// Feeling okay.
    Okay,
    /// Feeling low.
    Low,
    /// Struggling.
    Struggling,
}

/// Menstrual flow intensity logged for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleFlow {
    /// Spotting only.
    Spotting,
    /// Light flow.
    Light,
    /// Medium flow.
    Medium,
    /// Heavy flow.
    Heavy,
}

/// One log entry per calendar date.
///
/// The predictor only reads these; it never writes them back. A day with
/// `cycle: Some(_)` is an actual observation and always takes precedence
/// over anything the predictor would project for that date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Mood for the day.
    pub mood: Mood,
    /// Menstrual flow, if any was logged.
    pub cycle: Option<CycleFlow>,
    /// Free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DailyRecord {
    /// Creates a record with the given mood and nothing else logged.
    #[must_use]
    pub fn new(mood: Mood) -> Self {
        Self {
            mood,
            cycle: None,
            note: None,
        }
    }

    /// Sets the logged flow for the day.
    #[must_use]
    pub fn with_cycle(mut self, flow: CycleFlow) -> Self {
        self.cycle = Some(flow);
        self
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// The five supported practice kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PracticeType {
    /// Guided journaling prompt and response.
    Reflection,
    /// Gratitude list.
    Gratitude,
    /// Factors the user identified as influencing their mood.
    MoodInfluencers,
    /// Timed breathing reset.
    OneMinuteReset,
    /// An article the user read and rated.
    HelpfulReading,
}

impl PracticeType {
    /// Stable string form, used in entry ids and on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PracticeType::Reflection => "reflection",
            PracticeType::Gratitude => "gratitude",
            PracticeType::MoodInfluencers => "mood-influencers",
            PracticeType::OneMinuteReset => "one-minute-reset",
            PracticeType::HelpfulReading => "helpful-reading",
        }
    }
}

impl fmt::Display for PracticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload of a practice entry, one variant per practice kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PracticeContent {
    /// A journaling prompt and the user's written response.
    Reflection {
        /// The prompt shown to the user.
        prompt: String,
        /// The user's response.
        response: String,
    },
    /// Things the user is grateful for.
    Gratitude {
        /// One item per line of the list.
        items: Vec<String>,
    },
    /// Factors selected as influencing today's mood.
    MoodInfluencers {
        /// Selected influencer labels.
        influencers: Vec<String>,
    },
    /// A completed (or abandoned) breathing reset.
    OneMinuteReset {
        /// Whether the full reset was completed.
        completed: bool,
        /// Seconds actually spent.
        duration_secs: u32,
    },
    /// An article from the reading library.
    HelpfulReading {
        /// Stable slug of the article.
        article_slug: String,
        /// Whether the user marked it helpful.
        marked_helpful: bool,
    },
}

impl PracticeContent {
    /// The practice kind this payload belongs to.
    #[must_use]
    pub fn practice_type(&self) -> PracticeType {
        match self {
            PracticeContent::Reflection { .. } => PracticeType::Reflection,
            PracticeContent::Gratitude { .. } => PracticeType::Gratitude,
            PracticeContent::MoodInfluencers { .. } => PracticeType::MoodInfluencers,
            PracticeContent::OneMinuteReset { .. } => PracticeType::OneMinuteReset,
            PracticeContent::HelpfulReading { .. } => PracticeType::HelpfulReading,
        }
    }
}

/// One practice entry, identified by `entry_id`.
///
/// Lifecycle: created locally with `synced == false`, queued for remote
/// upsert, flipped to `synced == true` once the remote write confirms.
/// An update resets `synced` to `false` and re-queues the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeEntry {
    /// Unique id, `{type}_{timestamp_ms}_{random}` when generated locally.
    pub entry_id: String,
    /// Owning user.
    pub user_id: String,
    /// Practice kind (always matches the `content` variant).
    pub practice_type: PracticeType,
    /// Typed payload.
    pub content: PracticeContent,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Whether the remote store has confirmed this revision.
    #[serde(default)]
    pub synced: bool,
}

impl PracticeEntry {
    /// Builds a new unsynced entry.
    ///
    /// When `entry_id` is `None`, an id is generated from `now` and the
    /// supplied random source.
    pub fn new(
        user_id: impl Into<String>,
        content: PracticeContent,
        entry_id: Option<String>,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Self {
        let practice_type = content.practice_type();
        let entry_id = entry_id.unwrap_or_else(|| Self::generate_id(practice_type, now, rng));
        Self {
            entry_id,
            user_id: user_id.into(),
            practice_type,
            content,
            created_at: now,
            updated_at: now,
            synced: false,
        }
    }

    /// Generates an entry id of the form `{type}_{timestamp_ms}_{random}`.
    pub fn generate_id(
        practice_type: PracticeType,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> String {
        let suffix: String = rng
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        format!("{}_{}_{}", practice_type, now.timestamp_millis(), suffix)
    }
}
