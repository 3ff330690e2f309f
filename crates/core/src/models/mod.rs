//! Shared domain models.

use std::fmt;

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Tags a user can attach to a game.
pub const TAG_OPTIONS: [&str; 8] = [
    "RPG",
    "Ação",
    "Aventura",
    "Estratégia",
    "Indie",
    "Multiplayer",
    "História",
    "Souls-like",
];

/// Upper bound on tags filled in automatically from search metadata.
pub const MAX_IMPORTED_TAGS: usize = 5;

/// Rating given to games when none was chosen.
pub const DEFAULT_RATING: u8 = 5;

/// Platform a game was played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    /// Desktop computers, including Linux and macOS.
    #[serde(rename = "PC")]
    Pc,
    /// Any PlayStation generation.
    #[serde(rename = "PlayStation")]
    PlayStation,
    /// Any Xbox generation.
    #[serde(rename = "Xbox")]
    Xbox,
    /// Nintendo Switch.
    #[serde(rename = "Nintendo Switch")]
    NintendoSwitch,
    /// Phones and tablets.
    #[serde(rename = "Mobile")]
    Mobile,
    /// Anything else.
    #[serde(rename = "Outro", alias = "Other")]
    Other,
}

impl Platform {
    /// Every platform in display order.
    pub const ALL: [Platform; 6] = [
        Platform::Pc,
        Platform::PlayStation,
        Platform::Xbox,
        Platform::NintendoSwitch,
        Platform::Mobile,
        Platform::Other,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Platform::Pc => "PC",
            Platform::PlayStation => "PlayStation",
            Platform::Xbox => "Xbox",
            Platform::NintendoSwitch => "Nintendo Switch",
            Platform::Mobile => "Mobile",
            Platform::Other => "Outro",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::Pc
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Play status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Finished.
    Completed,
    /// Currently being played.
    Playing,
    /// Waiting to be started.
    Backlog,
    /// Given up on.
    Dropped,
}

impl Status {
    /// Every status in display order.
    pub const ALL: [Status; 4] = [
        Status::Completed,
        Status::Playing,
        Status::Dropped,
        Status::Backlog,
    ];

    /// Identifier used in storage and file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Completed => "completed",
            Status::Playing => "playing",
            Status::Backlog => "backlog",
            Status::Dropped => "dropped",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Status::Completed => "Completado",
            Status::Playing => "Jogando",
            Status::Backlog => "Backlog",
            Status::Dropped => "Abandonado",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Completed
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A user's logged entry for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Opaque identifier assigned at creation.
    pub id: String,
    /// Display name, never blank.
    pub name: String,
    /// Platform the game was played on.
    #[serde(default)]
    pub platform: Platform,
    /// Current play status.
    #[serde(default)]
    pub status: Status,
    /// Score from 1 to 5.
    #[serde(default = "default_rating", deserialize_with = "deserialize_rating")]
    pub rating: u8,
    /// Day the game was finished; `None` when the user does not remember.
    #[serde(
        default,
        deserialize_with = "deserialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_finished: Option<NaiveDate>,
    /// Hours played; `None` means unknown rather than zero.
    #[serde(
        default,
        deserialize_with = "deserialize_hours",
        skip_serializing_if = "Option::is_none"
    )]
    pub hours_played: Option<u32>,
    /// Fully completed (platinum trophy), independent of `status`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub platinado: bool,
    /// Tags in the order they were added.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Free-form notes.
    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    /// Cover art URL.
    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_image: Option<String>,
    /// Creation timestamp, never changed after the first save.
    pub created_at: DateTime<Utc>,
}

impl Game {
    /// Build a record from a draft. The draft is expected to be validated.
    pub fn from_draft(id: impl Into<String>, draft: GameDraft, created_at: DateTime<Utc>) -> Self {
        let mut game = Self {
            id: id.into(),
            name: String::new(),
            platform: Platform::default(),
            status: Status::default(),
            rating: DEFAULT_RATING,
            date_finished: None,
            hours_played: None,
            platinado: false,
            tags: Vec::new(),
            notes: None,
            cover_image: None,
            created_at,
        };
        game.apply_draft(draft);
        game
    }

    /// Replace every editable field, keeping `id` and `created_at`.
    pub fn apply_draft(&mut self, draft: GameDraft) {
        self.name = draft.name.trim().to_string();
        self.platform = draft.platform;
        self.status = draft.status;
        self.rating = clamp_rating(draft.rating);
        self.date_finished = draft.date_finished;
        self.hours_played = draft.hours_played;
        self.platinado = draft.platinado;
        self.tags = draft.tags;
        self.notes = non_blank(draft.notes);
        self.cover_image = non_blank(draft.cover_image);
    }

    /// Draft pre-filled with this record, used when editing.
    pub fn to_draft(&self) -> GameDraft {
        GameDraft {
            name: self.name.clone(),
            platform: self.platform,
            status: self.status,
            rating: self.rating,
            date_finished: self.date_finished,
            hours_played: self.hours_played,
            platinado: self.platinado,
            tags: self.tags.clone(),
            notes: self.notes.clone(),
            cover_image: self.cover_image.clone(),
        }
    }

    /// Hours played with unknown counted as zero.
    pub fn hours(&self) -> u32 {
        self.hours_played.unwrap_or(0)
    }

    /// Calendar year the game was finished in, if known.
    pub fn finished_year(&self) -> Option<i32> {
        self.date_finished.map(|date| date.year())
    }

    /// Finish date when known, otherwise the creation time.
    pub fn completion_instant(&self) -> DateTime<Utc> {
        self.date_finished
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or(self.created_at)
    }
}

/// Editable form state for a game, before it gets an id.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct GameDraft {
    pub name: String,
    pub platform: Platform,
    pub status: Status,
    pub rating: u8,
    pub date_finished: Option<NaiveDate>,
    pub hours_played: Option<u32>,
    pub platinado: bool,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub cover_image: Option<String>,
}

impl Default for GameDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            platform: Platform::Pc,
            status: Status::Completed,
            rating: DEFAULT_RATING,
            date_finished: Some(Local::now().date_naive()),
            hours_played: None,
            platinado: false,
            tags: Vec::new(),
            notes: None,
            cover_image: None,
        }
    }
}

impl GameDraft {
    /// Whether the name is blank once trimmed.
    pub fn is_name_blank(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// Add the tag at the end, or remove it when already present.
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|existing| existing == tag) {
            self.tags.remove(pos);
        } else {
            self.tags.push(tag.to_string());
        }
    }
}

/// Clamp a rating into 1..=5.
pub fn clamp_rating(rating: u8) -> u8 {
    rating.clamp(1, 5)
}

fn default_rating() -> u8 {
    DEFAULT_RATING
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(non_blank(raw))
}

/// Accepts `YYYY-MM-DD`, a full RFC 3339 timestamp, blank or null.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

/// Parse a stored finish date, returning `None` for blank or unreadable input.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

/// Accepts integers, floats and numeric strings; blank, negative or
/// non-numeric input is treated as unknown.
fn deserialize_hours<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HoursValue {
        Int(i64),
        Float(f64),
        String(String),
        Null,
    }

    let value = match HoursValue::deserialize(deserializer)? {
        HoursValue::Int(i) => Some(i),
        HoursValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        HoursValue::Float(_) => None,
        HoursValue::String(s) => parse_hours(&s).map(i64::from),
        HoursValue::Null => None,
    };
    Ok(value.and_then(|hours| u32::try_from(hours).ok()))
}

/// Stored ratings are clamped into 1..=5; zero, null or unreadable values
/// fall back to the default rating.
fn deserialize_rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RatingValue {
        Int(i64),
        Float(f64),
        String(String),
        Null,
    }

    let value = match RatingValue::deserialize(deserializer)? {
        RatingValue::Int(i) => Some(i),
        RatingValue::Float(f) if f.is_finite() => Some(f.round() as i64),
        RatingValue::Float(_) => None,
        RatingValue::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        RatingValue::Null => None,
    };
    Ok(match value {
        Some(rating) if rating > 0 => clamp_rating(rating.min(i64::from(u8::MAX)) as u8),
        _ => DEFAULT_RATING,
    })
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse the leading integer of user-entered hours.
pub fn parse_hours(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn deserializes_records_from_the_web_app() {
        let raw = r#"{
            "id": "1700000000000",
            "name": "Hollow Knight",
            "platform": "Nintendo Switch",
            "rating": 5,
            "status": "completed",
            "dateFinished": "2023-08-14",
            "hoursPlayed": "42",
            "notes": "",
            "tags": ["Indie", "Souls-like"],
            "coverImage": "",
            "userId": "abc",
            "createdAt": "2023-08-15T10:00:00.000Z"
        }"#;
        let game: Game = serde_json::from_str(raw).unwrap();
        assert_eq!(game.platform, Platform::NintendoSwitch);
        assert_eq!(game.hours_played, Some(42));
        assert_eq!(game.notes, None);
        assert_eq!(game.cover_image, None);
        assert!(!game.platinado);
        assert_eq!(game.finished_year(), Some(2023));
    }

    #[test]
    fn blank_and_invalid_hours_are_unknown() {
        for value in [r#""""#, r#""abc""#, "null", "-3"] {
            let raw = format!(
                r#"{{"id":"1","name":"A","hoursPlayed":{value},"createdAt":"2024-01-01T00:00:00Z"}}"#
            );
            let game: Game = serde_json::from_str(&raw).unwrap();
            assert_eq!(game.hours_played, None, "input {value}");
        }
        assert_eq!(parse_hours(" 12h "), Some(12));
    }

    #[test]
    fn stored_ratings_are_clamped() {
        let ratings: Vec<u8> = [r#"9"#, "0", "-2", "null", "3.6", r#""4""#]
            .iter()
            .map(|value| {
                let raw = format!(
                    r#"{{"id":"1","name":"A","rating":{value},"createdAt":"2024-01-01T00:00:00Z"}}"#
                );
                serde_json::from_str::<Game>(&raw).unwrap().rating
            })
            .collect();
        assert_eq!(ratings, vec![5, 5, 5, 5, 4, 4]);

        let raw = r#"[
            {"id":"1","name":"A","rating":9,"createdAt":"2024-01-01T00:00:00Z"},
            {"id":"2","name":"B","rating":0,"createdAt":"2024-01-01T00:00:00Z"},
            {"id":"3","name":"C","rating":9,"createdAt":"2024-01-01T00:00:00Z"}
        ]"#;
        let games: Vec<Game> = serde_json::from_str(raw).unwrap();
        assert!(games.iter().all(|game| (1..=5).contains(&game.rating)));
        assert_eq!(crate::stats::average_rating(&games), 5.0);
    }

    #[test]
    fn null_tags_and_platinado_load_as_defaults() {
        let raw = r#"{"id":"1","name":"A","tags":null,"platinado":null,"createdAt":"2024-01-01T00:00:00Z"}"#;
        let game: Game = serde_json::from_str(raw).unwrap();
        assert!(game.tags.is_empty());
        assert!(!game.platinado);
    }

    #[test]
    fn blank_finish_date_means_unknown() {
        let raw = r#"{"id":"1","name":"A","dateFinished":"","createdAt":"2024-01-01T00:00:00Z"}"#;
        let game: Game = serde_json::from_str(raw).unwrap();
        assert_eq!(game.date_finished, None);
        assert_eq!(game.rating, DEFAULT_RATING);
        assert_eq!(game.completion_instant(), game.created_at);
    }

    #[test]
    fn apply_draft_keeps_identity() {
        let mut draft = GameDraft {
            name: "  Celeste ".to_string(),
            ..GameDraft::default()
        };
        let mut game = Game::from_draft("42", draft.clone(), created());
        assert_eq!(game.name, "Celeste");

        draft.name = "Celeste Farewell".to_string();
        draft.rating = 9;
        game.apply_draft(draft);
        assert_eq!(game.id, "42");
        assert_eq!(game.created_at, created());
        assert_eq!(game.rating, 5);
    }

    #[test]
    fn toggle_tag_preserves_order() {
        let mut draft = GameDraft::default();
        draft.toggle_tag("RPG");
        draft.toggle_tag("Indie");
        draft.toggle_tag("Ação");
        draft.toggle_tag("Indie");
        assert_eq!(draft.tags, vec!["RPG".to_string(), "Ação".to_string()]);
    }

    #[test]
    fn other_platform_accepts_both_spellings() {
        let outro: Platform = serde_json::from_str(r#""Outro""#).unwrap();
        let other: Platform = serde_json::from_str(r#""Other""#).unwrap();
        assert_eq!(outro, Platform::Other);
        assert_eq!(other, Platform::Other);
    }
}
