//! JSON-backed pitch store
//!
//! Reference `ObservationSource` for the command-line tool. The input is a
//! single JSON document holding player metadata and raw pitch records:
//!
//! ```json
//! {
//!   "players": [
//!     {"key_mlbam": 656427, "name_first": "Jack", "name_last": "Flaherty"}
//!   ],
//!   "pitches": [
//!     {"pitcher": 656427, "game_year": 2024, "pitch_type": "FF",
//!      "release_speed": 93.4, "estimated_woba_using_speedangle": 0.31,
//!      "delta_run_exp": -0.05}
//!   ]
//! }
//! ```
//!
//! Numeric pitch fields may be `null`; missing outcomes become NaN and are
//! removed by the orchestrator.

use crate::analysis::ObservationSource;
use crate::observation::{PitchObservation, SeasonRange};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Player metadata row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub key_mlbam: i64,
    pub name_first: String,
    pub name_last: String,
}

impl PlayerRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name_first, self.name_last)
    }
}

/// Raw pitch record as exported from Statcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchRecord {
    pub pitcher: i64,
    #[serde(default)]
    pub game_year: Option<i32>,
    #[serde(default)]
    pub pitch_type: Option<String>,
    #[serde(default)]
    pub release_speed: Option<f64>,
    #[serde(default)]
    pub estimated_woba_using_speedangle: Option<f64>,
    #[serde(default)]
    pub delta_run_exp: Option<f64>,
}

impl PitchRecord {
    /// Convert to an observation; pitches without a type get an empty tag
    pub fn to_observation(&self) -> PitchObservation {
        PitchObservation {
            covariate: self.release_speed.unwrap_or(f64::NAN),
            outcome: self.estimated_woba_using_speedangle.unwrap_or(f64::NAN),
            category: self.pitch_type.clone().unwrap_or_default(),
            season: self.game_year,
            run_value: self.delta_run_exp,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PitchFile {
    #[serde(default)]
    players: Vec<PlayerRecord>,
    #[serde(default)]
    pitches: Vec<PitchRecord>,
}

/// In-memory pitch store
#[derive(Debug, Clone, Default)]
pub struct PitchStore {
    players: Vec<PlayerRecord>,
    pitches: Vec<PitchRecord>,
}

impl PitchStore {
    pub fn new(players: Vec<PlayerRecord>, pitches: Vec<PitchRecord>) -> Self {
        Self { players, pitches }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to load pitch data from {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: PitchFile = serde_json::from_str(content).context("Failed to parse JSON")?;
        tracing::info!(
            players = file.players.len(),
            pitches = file.pitches.len(),
            "Pitch store loaded"
        );
        Ok(Self::new(file.players, file.pitches))
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn pitch_count(&self) -> usize {
        self.pitches.len()
    }

    /// Seasons present in the data, ascending
    pub fn available_seasons(&self) -> Vec<i32> {
        let mut seasons: Vec<i32> = self.pitches.iter().filter_map(|p| p.game_year).collect();
        seasons.sort_unstable();
        seasons.dedup();
        seasons
    }

    /// Resolve "First Last" to a player id
    ///
    /// Tries a case-insensitive full-name match first, then a partial match on
    /// the first and last words. Names need at least two words.
    pub fn find_player(&self, name: &str) -> Result<Option<&PlayerRecord>> {
        let parts: Vec<&str> = name.split_whitespace().collect();
        if parts.len() < 2 {
            anyhow::bail!("Player name must include first and last name, got {:?}", name);
        }
        let first = parts[0].to_lowercase();
        let last = parts[parts.len() - 1].to_lowercase();
        let full = format!("{} {}", first, last);

        if let Some(player) = self
            .players
            .iter()
            .find(|p| p.full_name().to_lowercase() == full)
        {
            return Ok(Some(player));
        }

        let partial: Vec<&PlayerRecord> = self
            .players
            .iter()
            .filter(|p| {
                p.name_first.to_lowercase().contains(&first)
                    && p.name_last.to_lowercase().contains(&last)
            })
            .collect();

        if partial.len() > 1 {
            tracing::info!("Found {} potential matches for {}", partial.len(), name);
        }
        Ok(partial.first().copied())
    }
}

impl ObservationSource for PitchStore {
    fn get_series(
        &self,
        subject_id: &str,
        seasons: Option<SeasonRange>,
        category: Option<&str>,
    ) -> Result<Vec<PitchObservation>> {
        let pitcher: i64 = subject_id
            .trim()
            .parse()
            .with_context(|| format!("Invalid pitcher id {:?}", subject_id))?;

        let observations: Vec<PitchObservation> = self
            .pitches
            .iter()
            .filter(|p| p.pitcher == pitcher)
            .filter(|p| match (seasons, p.game_year) {
                (Some(range), Some(year)) => range.contains(year),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|p| category.map_or(true, |c| p.pitch_type.as_deref() == Some(c)))
            .map(PitchRecord::to_observation)
            .collect();

        if observations.is_empty() {
            tracing::warn!("No data found for pitcher {}", pitcher);
        } else {
            tracing::info!("Total pitches found: {}", observations.len());
        }
        Ok(observations)
    }
}
