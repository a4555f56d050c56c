use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 100;

/// Minimum score for abs and lean whenever any definition is visible.
pub const DEFINITION_FLOOR: u8 = 70;

pub fn clamp_score(value: i64) -> u8 {
    value.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    UpperBody,
    #[default]
    FullBody,
}

impl AnalysisMode {
    /// Rating keys scored under this mode, in display order.
    pub fn muscle_groups(self) -> &'static [MuscleGroup] {
        match self {
            AnalysisMode::UpperBody => &MuscleGroup::UPPER_BODY,
            AnalysisMode::FullBody => &MuscleGroup::ALL,
        }
    }

    pub fn is_upper_body(self) -> bool {
        self == AnalysisMode::UpperBody
    }
}

impl Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::UpperBody => write!(f, "upper-body"),
            AnalysisMode::FullBody => write!(f, "full-body"),
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper-body" | "upper" => Ok(AnalysisMode::UpperBody),
            "full-body" | "full" => Ok(AnalysisMode::FullBody),
            other => Err(format!("unknown analysis mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Shoulders,
    Biceps,
    Triceps,
    Back,
    Abs,
    Lean,
    Glutes,
    Quads,
    Hamstrings,
    Calves,
}

impl MuscleGroup {
    pub const UPPER_BODY: [MuscleGroup; 7] = [
        MuscleGroup::Chest,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Back,
        MuscleGroup::Abs,
        MuscleGroup::Lean,
    ];

    pub const LOWER_BODY: [MuscleGroup; 4] = [
        MuscleGroup::Glutes,
        MuscleGroup::Quads,
        MuscleGroup::Hamstrings,
        MuscleGroup::Calves,
    ];

    pub const ALL: [MuscleGroup; 11] = [
        MuscleGroup::Chest,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Back,
        MuscleGroup::Abs,
        MuscleGroup::Lean,
        MuscleGroup::Glutes,
        MuscleGroup::Quads,
        MuscleGroup::Hamstrings,
        MuscleGroup::Calves,
    ];

    /// Key used in the model's JSON payload.
    pub fn key(self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Back => "back",
            MuscleGroup::Abs => "abs",
            MuscleGroup::Lean => "lean",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Quads => "quads",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Calves => "calves",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Back => "Back",
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Lean => "Leanness",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::Quads => "Quads",
            MuscleGroup::Hamstrings => "Hamstrings",
            MuscleGroup::Calves => "Calves",
        }
    }

    pub fn is_lower_body(self) -> bool {
        MuscleGroup::LOWER_BODY.contains(&self)
    }

    /// abs and lean are held to [`DEFINITION_FLOOR`].
    pub fn has_definition_floor(self) -> bool {
        matches!(self, MuscleGroup::Abs | MuscleGroup::Lean)
    }
}

impl Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Scores per muscle group. Every stored value lies in [1,100] and abs/lean
/// never drop below [`DEFINITION_FLOOR`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<MuscleGroup, i64>",
    into = "BTreeMap<MuscleGroup, u8>"
)]
pub struct RatingSet(BTreeMap<MuscleGroup, u8>);

impl From<BTreeMap<MuscleGroup, i64>> for RatingSet {
    fn from(values: BTreeMap<MuscleGroup, i64>) -> Self {
        let mut ratings = RatingSet::new();
        for (group, value) in values {
            ratings.insert(group, value);
        }
        ratings
    }
}

impl From<RatingSet> for BTreeMap<MuscleGroup, u8> {
    fn from(ratings: RatingSet) -> Self {
        ratings.0
    }
}

impl RatingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: MuscleGroup, value: i64) {
        let mut score = clamp_score(value);
        if group.has_definition_floor() {
            score = score.max(DEFINITION_FLOOR);
        }
        self.0.insert(group, score);
    }

    pub fn get(&self, group: MuscleGroup) -> Option<u8> {
        self.0.get(&group).copied()
    }

    pub fn contains(&self, group: MuscleGroup) -> bool {
        self.0.contains_key(&group)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = MuscleGroup> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MuscleGroup, u8)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// floor(mean) of all populated scores, clamped to [1,100].
    pub fn mean_score(&self) -> u8 {
        if self.0.is_empty() {
            return MIN_SCORE;
        }
        let total: i64 = self.0.values().map(|v| *v as i64).sum();
        clamp_score(total / self.0.len() as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    #[serde(rename = "exercise")]
    pub exercise_name: String,
    #[serde(rename = "sets")]
    pub sets_and_reps: String,
    #[serde(rename = "focus")]
    pub target_muscle: String,
}

impl WorkoutEntry {
    pub fn new(exercise_name: &str, sets_and_reps: &str, target_muscle: &str) -> Self {
        Self {
            exercise_name: exercise_name.to_string(),
            sets_and_reps: sets_and_reps.to_string(),
            target_muscle: target_muscle.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub overall_score: u8,
    pub ratings: RatingSet,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub workout_plan: Vec<WorkoutEntry>,
    pub is_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageView {
    Front,
    Back,
    Side,
}

impl Display for ImageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageView::Front => write!(f, "front"),
            ImageView::Back => write!(f, "back"),
            ImageView::Side => write!(f, "side"),
        }
    }
}

/// A self-describing image blob (`data:<media>;base64,<payload>`), passed
/// through to the model untouched.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataUri(String);

impl DataUri {
    pub fn new(uri: impl Into<String>) -> Self {
        DataUri(uri.into())
    }

    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        DataUri(format!("data:{};base64,{}", media_type, STANDARD.encode(bytes)))
    }

    pub fn media_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let end = rest.find([';', ','])?;
        Some(&rest[..end])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

// Image payloads are large; keep them out of debug output and logs.
impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataUri({}, {} bytes)",
            self.media_type().unwrap_or("unknown"),
            self.0.len()
        )
    }
}

impl From<String> for DataUri {
    fn from(value: String) -> Self {
        DataUri(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub front: Option<DataUri>,
    pub back: Option<DataUri>,
    pub side: Option<DataUri>,
    pub gender: Gender,
    pub mode: AnalysisMode,
}

impl AnalysisRequest {
    pub fn new(front: DataUri, back: DataUri, gender: Gender, mode: AnalysisMode) -> Self {
        Self {
            front: Some(front),
            back: Some(back),
            side: None,
            gender,
            mode,
        }
    }

    pub fn with_side(mut self, side: DataUri) -> Self {
        self.side = Some(side);
        self
    }
}
