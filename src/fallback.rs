//! Locally synthesized results for when the model cannot be reached or its
//! reply cannot be trusted. Nothing here touches the network and nothing
//! here fails.

use crate::types::{AnalysisMode, AnalysisResult, MuscleGroup, RatingSet, WorkoutEntry};
use rand::Rng;
use std::ops::Range;

/// Half-open range each synthetic score is drawn from.
pub fn rating_range(group: MuscleGroup) -> Range<i64> {
    match group {
        MuscleGroup::Chest => 60..85,
        MuscleGroup::Shoulders => 65..90,
        MuscleGroup::Biceps => 63..83,
        MuscleGroup::Triceps => 61..81,
        MuscleGroup::Back => 67..92,
        MuscleGroup::Abs => 50..80,
        MuscleGroup::Lean => 50..75,
        MuscleGroup::Glutes => 60..80,
        MuscleGroup::Quads => 55..80,
        MuscleGroup::Hamstrings => 57..77,
        MuscleGroup::Calves => 53..78,
    }
}

const UPPER_BODY_STRENGTHS: [&str; 3] = [
    "Well-developed shoulders and upper body",
    "Good upper body symmetry and proportions",
    "Strong back development",
];

const UPPER_BODY_IMPROVEMENTS: [&str; 3] = [
    "Increase core definition and abs visibility",
    "Build more chest thickness and width",
    "Improve triceps separation and definition",
];

const FULL_BODY_STRENGTHS: [&str; 3] = [
    "Good upper body development",
    "Balanced muscle proportions",
    "Strong back development",
];

const FULL_BODY_IMPROVEMENTS: [&str; 3] = [
    "Focus on leg development",
    "Improve core definition",
    "Work on overall leanness",
];

const UPPER_BODY_PLAN: [(&str, &str, &str); 6] = [
    ("Planks", "3 x 60s", "Abs"),
    ("Incline Barbell Press", "4 x 8-12", "Chest"),
    ("Close-Grip Push-ups", "3 x 12-15", "Triceps"),
    ("Cable Crunches", "3 x 12-15", "Abs"),
    ("Dumbbell Flyes", "3 x 12-15", "Chest"),
    ("Russian Twists", "3 x 30", "Abs"),
];

const FULL_BODY_PLAN: [(&str, &str, &str); 8] = [
    ("Squats", "4 x 8-12", "Quads"),
    ("Romanian Deadlifts", "4 x 8-12", "Hamstrings"),
    ("Calf Raises", "4 x 15-20", "Calves"),
    ("Planks", "3 x 60s", "Abs"),
    ("Bulgarian Split Squats", "3 x 12 each", "Legs"),
    ("Russian Twists", "3 x 30", "Abs"),
    ("Walking Lunges", "3 x 20 each", "Legs"),
    ("HIIT Cardio", "20 min", "Fat Loss"),
];

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn plan(entries: &[(&str, &str, &str)]) -> Vec<WorkoutEntry> {
    entries
        .iter()
        .map(|(exercise, sets, focus)| WorkoutEntry::new(exercise, sets, focus))
        .collect()
}

pub fn generate<R: Rng>(mode: AnalysisMode, rng: &mut R) -> AnalysisResult {
    let mut ratings = RatingSet::new();
    for &group in mode.muscle_groups() {
        ratings.insert(group, rng.random_range(rating_range(group)));
    }
    let overall_score = ratings.mean_score();

    let (strengths, improvements, workout_plan) = match mode {
        AnalysisMode::UpperBody => (
            texts(&UPPER_BODY_STRENGTHS),
            texts(&UPPER_BODY_IMPROVEMENTS),
            plan(&UPPER_BODY_PLAN),
        ),
        AnalysisMode::FullBody => (
            texts(&FULL_BODY_STRENGTHS),
            texts(&FULL_BODY_IMPROVEMENTS),
            plan(&FULL_BODY_PLAN),
        ),
    };

    AnalysisResult {
        overall_score,
        ratings,
        strengths,
        improvements,
        workout_plan,
        is_fallback: true,
    }
}
