use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::models::{clamp_rating, GameDraft, Platform, DEFAULT_RATING, MAX_IMPORTED_TAGS};

use super::SearchCandidate;

static PLATFORM_MAP: Lazy<HashMap<&'static str, Platform>> = Lazy::new(|| {
    HashMap::from([
        ("PC", Platform::Pc),
        ("Linux", Platform::Pc),
        ("macOS", Platform::Pc),
        ("PlayStation", Platform::PlayStation),
        ("PlayStation 2", Platform::PlayStation),
        ("PlayStation 3", Platform::PlayStation),
        ("PlayStation 4", Platform::PlayStation),
        ("PlayStation 5", Platform::PlayStation),
        ("Xbox", Platform::Xbox),
        ("Xbox 360", Platform::Xbox),
        ("Xbox One", Platform::Xbox),
        ("Xbox Series S/X", Platform::Xbox),
        ("Nintendo Switch", Platform::NintendoSwitch),
        ("iOS", Platform::Mobile),
        ("Android", Platform::Mobile),
    ])
});

static GENRE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("RPG", "RPG"),
        ("Role-playing (RPG)", "RPG"),
        ("Action", "Ação"),
        ("Shooter", "Ação"),
        ("Adventure", "Aventura"),
        ("Platformer", "Aventura"),
        ("Strategy", "Estratégia"),
        ("Indie", "Indie"),
        ("Massively Multiplayer", "Multiplayer"),
    ])
});

/// First platform with a known mapping, defaulting to PC.
pub fn detect_platform<'a>(names: impl IntoIterator<Item = &'a str>) -> Platform {
    names
        .into_iter()
        .find_map(|name| PLATFORM_MAP.get(name).copied())
        .unwrap_or(Platform::Pc)
}

/// Known genres translated to tags, deduplicated and capped.
pub fn genres_to_tags<'a>(genres: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in genres.into_iter().filter_map(|genre| GENRE_MAP.get(genre)) {
        if !tags.iter().any(|existing| existing == *tag) {
            tags.push((*tag).to_string());
        }
    }
    tags.truncate(MAX_IMPORTED_TAGS);
    tags
}

/// Overwrite the metadata fields of `draft` with what the candidate offers.
///
/// Status, dates, hours, notes and the platinum flag are left untouched.
pub fn apply_candidate(draft: &mut GameDraft, candidate: &SearchCandidate) {
    draft.name = candidate.name.clone();
    draft.cover_image = candidate.cover_image().map(str::to_string);
    draft.platform = detect_platform(candidate.platform_names());
    draft.tags = genres_to_tags(candidate.genre_names());
    draft.rating = imported_rating(candidate.rating);
}

fn imported_rating(rating: Option<f64>) -> u8 {
    match rating {
        Some(value) if value.is_finite() && value > 0.0 => clamp_rating(value.round() as u8),
        _ => DEFAULT_RATING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use crate::search::{NamedRef, PlatformEntry, Screenshot};

    fn platform(name: &str) -> PlatformEntry {
        PlatformEntry {
            platform: Some(NamedRef {
                id: None,
                name: name.to_string(),
            }),
        }
    }

    fn genre(name: &str) -> NamedRef {
        NamedRef {
            id: None,
            name: name.to_string(),
        }
    }

    #[test]
    fn first_known_platform_wins() {
        assert_eq!(
            detect_platform(["Sega Saturn", "Xbox One", "PC"]),
            Platform::Xbox
        );
        assert_eq!(detect_platform(["Android"]), Platform::Mobile);
        assert_eq!(detect_platform(["Atari 2600"]), Platform::Pc);
        assert_eq!(detect_platform(Vec::<&str>::new()), Platform::Pc);
    }

    #[test]
    fn genres_are_translated_deduplicated_and_capped() {
        let tags = genres_to_tags(["Action", "Shooter", "Puzzle", "Indie", "Adventure"]);
        assert_eq!(tags, vec!["Ação", "Indie", "Aventura"]);

        let many = genres_to_tags([
            "RPG",
            "Action",
            "Adventure",
            "Strategy",
            "Indie",
            "Massively Multiplayer",
        ]);
        assert_eq!(many.len(), MAX_IMPORTED_TAGS);
        assert!(!many.contains(&"Multiplayer".to_string()));
    }

    #[test]
    fn candidate_fills_metadata_and_keeps_user_fields() {
        let candidate = SearchCandidate {
            name: "Hades".to_string(),
            rating: Some(4.44),
            platforms: vec![platform("Nintendo Switch"), platform("PC")],
            genres: vec![genre("Action"), genre("Indie"), genre("RPG")],
            short_screenshots: vec![Screenshot {
                image: Some("https://img/hades.jpg".to_string()),
            }],
            ..SearchCandidate::default()
        };
        let mut draft = GameDraft {
            status: Status::Playing,
            hours_played: Some(12),
            platinado: true,
            ..GameDraft::default()
        };
        apply_candidate(&mut draft, &candidate);

        assert_eq!(draft.name, "Hades");
        assert_eq!(draft.platform, Platform::NintendoSwitch);
        assert_eq!(draft.tags, vec!["Ação", "Indie", "RPG"]);
        assert_eq!(draft.rating, 4);
        assert_eq!(draft.cover_image.as_deref(), Some("https://img/hades.jpg"));
        assert_eq!(draft.status, Status::Playing);
        assert_eq!(draft.hours_played, Some(12));
        assert!(draft.platinado);
    }

    #[test]
    fn missing_or_tiny_ratings_are_normalized() {
        assert_eq!(imported_rating(None), DEFAULT_RATING);
        assert_eq!(imported_rating(Some(0.0)), DEFAULT_RATING);
        assert_eq!(imported_rating(Some(0.3)), 1);
        assert_eq!(imported_rating(Some(4.5)), 5);
    }
}
