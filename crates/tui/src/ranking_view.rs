use jajoguei_core::{
    models::Status,
    ranking::{RankingMode, YearOrder},
};

/// Ranking kinds offered on the export screen, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingKind {
    Hours,
    Rating,
    Year,
    Recent,
    Status,
    Platinum,
}

impl RankingKind {
    pub const ALL: [RankingKind; 6] = [
        RankingKind::Hours,
        RankingKind::Rating,
        RankingKind::Year,
        RankingKind::Recent,
        RankingKind::Status,
        RankingKind::Platinum,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RankingKind::Hours => "Mais jogados",
            RankingKind::Rating => "Melhor avaliados",
            RankingKind::Year => "Por ano",
            RankingKind::Recent => "Recentes",
            RankingKind::Status => "Por status",
            RankingKind::Platinum => "Platinados",
        }
    }
}

/// Selection state of the export screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingChoice {
    pub kind: usize,
    pub year: usize,
    pub year_order: YearOrder,
    pub status: usize,
}

impl Default for RankingChoice {
    fn default() -> Self {
        Self {
            kind: 0,
            year: 0,
            year_order: YearOrder::Rating,
            status: 0,
        }
    }
}

impl RankingChoice {
    pub fn kind(&self) -> RankingKind {
        RankingKind::ALL[self.kind % RankingKind::ALL.len()]
    }

    pub fn next_kind(&mut self, delta: isize) {
        let len = RankingKind::ALL.len() as isize;
        self.kind = (self.kind as isize + delta).rem_euclid(len) as usize;
    }

    /// Move the year or status qualifier of the current kind.
    pub fn next_qualifier(&mut self, delta: isize, years: usize) {
        match self.kind() {
            RankingKind::Year if years > 0 => {
                self.year = (self.year as isize + delta).rem_euclid(years as isize) as usize;
            }
            RankingKind::Status => {
                let len = Status::ALL.len() as isize;
                self.status = (self.status as isize + delta).rem_euclid(len) as usize;
            }
            _ => {}
        }
    }

    pub fn toggle_year_order(&mut self) {
        self.year_order = match self.year_order {
            YearOrder::Rating => YearOrder::Hours,
            YearOrder::Hours => YearOrder::Rating,
        };
    }

    /// Concrete mode, or `None` when a year ranking is asked for but no game
    /// has a finish date.
    pub fn mode(&self, years: &[i32]) -> Option<RankingMode> {
        let mode = match self.kind() {
            RankingKind::Hours => RankingMode::Hours,
            RankingKind::Rating => RankingMode::Rating,
            RankingKind::Year => {
                let year = *years.get(self.year.min(years.len().saturating_sub(1)))?;
                RankingMode::Year {
                    year,
                    order: self.year_order,
                }
            }
            RankingKind::Recent => RankingMode::Recent,
            RankingKind::Status => RankingMode::Status(Status::ALL[self.status % Status::ALL.len()]),
            RankingKind::Platinum => RankingMode::Platinum,
        };
        Some(mode)
    }
}
