use jajoguei_core::{
    models::{clamp_rating, parse_date, parse_hours, Game, GameDraft, Platform, Status, TAG_OPTIONS},
    search::{apply_candidate, ScoredCandidate},
};

/// Editable fields of the add/edit modal, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Platform,
    Status,
    Rating,
    DateFinished,
    Hours,
    Platinado,
    Tags,
    Notes,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Name,
        Field::Platform,
        Field::Status,
        Field::Rating,
        Field::DateFinished,
        Field::Hours,
        Field::Platinado,
        Field::Tags,
        Field::Notes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Nome",
            Field::Platform => "Plataforma",
            Field::Status => "Status",
            Field::Rating => "Nota",
            Field::DateFinished => "Data de término",
            Field::Hours => "Horas jogadas",
            Field::Platinado => "Platinado",
            Field::Tags => "Tags",
            Field::Notes => "Notas",
        }
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            Field::Name | Field::DateFinished | Field::Hours | Field::Notes
        )
    }
}

/// State of the add/edit modal.
///
/// Free-text inputs are kept as typed and only parsed on submit, so a half
/// typed date does not get rewritten under the cursor.
#[derive(Debug, Clone)]
pub struct GameForm {
    pub editing: Option<String>,
    pub draft: GameDraft,
    pub name: String,
    pub date: String,
    pub hours: String,
    pub notes: String,
    pub focus: usize,
    pub tag_cursor: usize,
    pub results: Vec<ScoredCandidate>,
    pub result_cursor: usize,
    pub searching: bool,
}

impl GameForm {
    /// Empty form for a new game.
    pub fn new() -> Self {
        Self::from_draft(None, GameDraft::default())
    }

    /// Form pre-filled with an existing game.
    pub fn edit(game: &Game) -> Self {
        Self::from_draft(Some(game.id.clone()), game.to_draft())
    }

    fn from_draft(editing: Option<String>, draft: GameDraft) -> Self {
        Self {
            editing,
            name: draft.name.clone(),
            date: draft
                .date_finished
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            hours: draft.hours_played.map(|h| h.to_string()).unwrap_or_default(),
            notes: draft.notes.clone().unwrap_or_default(),
            draft,
            focus: 0,
            tag_cursor: 0,
            results: Vec::new(),
            result_cursor: 0,
            searching: false,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Editar Jogo"
        } else {
            "Adicionar Jogo"
        }
    }

    pub fn field(&self) -> Field {
        Field::ALL[self.focus.min(Field::ALL.len() - 1)]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % Field::ALL.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + Field::ALL.len() - 1) % Field::ALL.len();
    }

    /// Type a character into the focused text field. Returns true when the
    /// name changed and a new search should be scheduled.
    pub fn insert(&mut self, ch: char) -> bool {
        match self.field() {
            Field::Name => {
                self.name.push(ch);
                true
            }
            Field::DateFinished if ch.is_ascii_digit() || ch == '-' => {
                self.date.push(ch);
                false
            }
            Field::Hours if ch.is_ascii_digit() => {
                self.hours.push(ch);
                false
            }
            Field::Notes => {
                self.notes.push(ch);
                false
            }
            Field::Rating => {
                if let Some(digit) = ch.to_digit(10) {
                    self.draft.rating = clamp_rating(digit as u8);
                }
                false
            }
            Field::Platinado | Field::Tags if ch == ' ' => {
                self.toggle();
                false
            }
            _ => false,
        }
    }

    /// Delete the last character of the focused text field.
    pub fn backspace(&mut self) -> bool {
        match self.field() {
            Field::Name => self.name.pop().is_some(),
            Field::DateFinished => {
                self.date.pop();
                false
            }
            Field::Hours => {
                self.hours.pop();
                false
            }
            Field::Notes => {
                self.notes.pop();
                false
            }
            _ => false,
        }
    }

    /// Step the focused choice field left or right.
    pub fn adjust(&mut self, delta: isize) {
        match self.field() {
            Field::Platform => {
                self.draft.platform = step(&Platform::ALL, self.draft.platform, delta);
            }
            Field::Status => {
                self.draft.status = step(&Status::ALL, self.draft.status, delta);
            }
            Field::Rating => {
                let rating = self.draft.rating as isize + delta;
                self.draft.rating = clamp_rating(rating.clamp(1, 5) as u8);
            }
            Field::Tags => {
                let len = TAG_OPTIONS.len() as isize;
                self.tag_cursor = (self.tag_cursor as isize + delta).rem_euclid(len) as usize;
            }
            Field::Platinado => self.draft.platinado = !self.draft.platinado,
            _ => {}
        }
    }

    /// Toggle the focused flag or tag.
    pub fn toggle(&mut self) {
        match self.field() {
            Field::Platinado => self.draft.platinado = !self.draft.platinado,
            Field::Tags => {
                if let Some(tag) = TAG_OPTIONS.get(self.tag_cursor) {
                    self.draft.toggle_tag(tag);
                }
            }
            _ => {}
        }
    }

    pub fn accepts_text(&self) -> bool {
        self.field().is_text()
    }

    pub fn show_results(&mut self, results: Vec<ScoredCandidate>) {
        self.results = results;
        self.result_cursor = 0;
        self.searching = false;
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
        self.result_cursor = 0;
        self.searching = false;
    }

    pub fn move_result(&mut self, delta: isize) {
        if self.results.is_empty() {
            return;
        }
        let max = self.results.len() as isize - 1;
        self.result_cursor = (self.result_cursor as isize + delta).clamp(0, max) as usize;
    }

    /// Fill the form from the highlighted search result.
    pub fn apply_selected_result(&mut self) -> Option<String> {
        let candidate = self.results.get(self.result_cursor)?.candidate.clone();
        self.draft.name = self.name.clone();
        apply_candidate(&mut self.draft, &candidate);
        self.name = self.draft.name.clone();
        self.clear_results();
        Some(candidate.name)
    }

    /// Parse the text inputs into a draft ready for the library.
    pub fn to_draft(&self) -> Result<GameDraft, String> {
        let date_finished = if self.date.trim().is_empty() {
            None
        } else {
            Some(
                parse_date(&self.date)
                    .ok_or_else(|| format!("Data inválida: {} (use AAAA-MM-DD)", self.date))?,
            )
        };
        let notes = self.notes.trim();
        Ok(GameDraft {
            name: self.name.clone(),
            date_finished,
            hours_played: parse_hours(&self.hours),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
            ..self.draft.clone()
        })
    }
}

impl Default for GameForm {
    fn default() -> Self {
        Self::new()
    }
}

fn step<T: Copy + PartialEq>(values: &[T], current: T, delta: isize) -> T {
    let len = values.len() as isize;
    let pos = values.iter().position(|value| *value == current).unwrap_or(0) as isize;
    values[(pos + delta).rem_euclid(len) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use jajoguei_core::search::SearchCandidate;

    fn focus(form: &mut GameForm, field: Field) {
        form.focus = Field::ALL.iter().position(|f| *f == field).unwrap();
    }

    #[test]
    fn new_form_starts_with_defaults() {
        let form = GameForm::new();
        assert_eq!(form.title(), "Adicionar Jogo");
        assert_eq!(form.field(), Field::Name);
        assert_eq!(form.draft.rating, 5);
        assert_eq!(form.draft.status, Status::Completed);
        assert!(!form.date.is_empty());
    }

    #[test]
    fn typing_the_name_requests_searches() {
        let mut form = GameForm::new();
        assert!(form.insert('H'));
        assert!(form.insert('i'));
        assert!(form.backspace());
        assert_eq!(form.name, "H");

        focus(&mut form, Field::Hours);
        assert!(!form.insert('4'));
        assert!(!form.insert('x'));
        assert_eq!(form.hours, "4");
    }

    #[test]
    fn choices_wrap_around() {
        let mut form = GameForm::new();
        focus(&mut form, Field::Platform);
        form.adjust(-1);
        assert_eq!(form.draft.platform, Platform::Other);
        form.adjust(1);
        assert_eq!(form.draft.platform, Platform::Pc);

        focus(&mut form, Field::Rating);
        form.adjust(1);
        assert_eq!(form.draft.rating, 5);
        form.insert('2');
        assert_eq!(form.draft.rating, 2);

        focus(&mut form, Field::Tags);
        form.adjust(1);
        form.toggle();
        assert_eq!(form.draft.tags, vec![TAG_OPTIONS[1]]);
        form.insert(' ');
        assert!(form.draft.tags.is_empty());
    }

    #[test]
    fn blank_date_means_unknown_and_bad_date_is_rejected() {
        let mut form = GameForm::new();
        form.name = "Hades".to_string();
        form.date.clear();
        form.hours = "12".to_string();
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.date_finished, None);
        assert_eq!(draft.hours_played, Some(12));
        assert_eq!(draft.notes, None);

        form.date = "2024-13".to_string();
        assert!(form.to_draft().is_err());

        form.date = "2024-02-29".to_string();
        assert_eq!(
            form.to_draft().unwrap().date_finished,
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn selecting_a_result_fills_metadata() {
        let mut form = GameForm::new();
        form.name = "hades".to_string();
        form.show_results(vec![
            ScoredCandidate {
                candidate: SearchCandidate::named("Hades II"),
                score: 800.0,
            },
            ScoredCandidate {
                candidate: SearchCandidate {
                    rating: Some(4.4),
                    ..SearchCandidate::named("Hades")
                },
                score: 2044.0,
            },
        ]);
        form.move_result(5);
        assert_eq!(form.result_cursor, 1);
        assert_eq!(form.apply_selected_result().as_deref(), Some("Hades"));
        assert_eq!(form.name, "Hades");
        assert_eq!(form.draft.rating, 4);
        assert!(form.results.is_empty());
        assert_eq!(form.apply_selected_result(), None);
    }
}
