//! Instruction text sent to the vision model.
//!
//! The prompt is a pure function of gender and analysis mode so the same
//! inputs always produce the same request body.

use crate::types::{AnalysisMode, Gender, MuscleGroup};
use std::fmt::Write as _;

const UPPER_BODY_EXAMPLE: &str = r#"{
  "ratings": {
    "chest": 87,
    "shoulders": 92,
    "biceps": 90,
    "triceps": 88,
    "back": 91,
    "abs": 79,
    "lean": 80
  },
  "overallScore": 86,
  "strengths": [
    "Well-developed shoulders and upper body",
    "Good upper body symmetry and proportions"
  ],
  "improvements": [
    "Increase chest thickness and width",
    "Improve core definition and abs visibility"
  ],
  "workoutPlan": [
    {
      "exercise": "Incline Barbell Press",
      "sets": "4 x 8-12",
      "focus": "Chest"
    },
    {
      "exercise": "Planks",
      "sets": "3 x 60s",
      "focus": "Abs"
    }
  ]
}"#;

const FULL_BODY_EXAMPLE: &str = r#"{
  "ratings": {
    "chest": 87,
    "shoulders": 92,
    "biceps": 90,
    "triceps": 88,
    "back": 91,
    "abs": 79,
    "lean": 80,
    "glutes": 85,
    "quads": 83,
    "hamstrings": 80,
    "calves": 76
  },
  "overallScore": 86,
  "strengths": [
    "Well-developed shoulders and upper body",
    "Good symmetry and proportions"
  ],
  "improvements": [
    "Focus on lower leg development",
    "Increase core definition"
  ],
  "workoutPlan": [
    {
      "exercise": "Calf Raises",
      "sets": "4 x 15-20",
      "focus": "Calves"
    },
    {
      "exercise": "Planks",
      "sets": "3 x 60s",
      "focus": "Abs"
    }
  ]
}"#;

const SCORING_POLICY: &str = "\
IMPORTANT SCORING GUIDELINES:
- For Abs and Leanness: If visible abdominal muscles are present (even if not perfectly defined), assign a minimum score of 70 for both categories
- Be generous with abs and leanness scoring - visible definition should always score 70+
- Only rate abs below 70 if there's absolutely no visible abdominal definition";

const UPPER_BODY_RESTRICTION: &str = "IMPORTANT: Do NOT mention legs, glutes, quads, hamstrings, calves, or any lower body parts in strengths, improvements, or workout plan.";

fn mode_title(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::UpperBody => "UPPER BODY ONLY",
        AnalysisMode::FullBody => "FULL BODY",
    }
}

fn example_payload(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::UpperBody => UPPER_BODY_EXAMPLE,
        AnalysisMode::FullBody => FULL_BODY_EXAMPLE,
    }
}

fn muscle_list(mode: AnalysisMode) -> String {
    mode.muscle_groups()
        .iter()
        .map(|group| match group {
            MuscleGroup::Lean => {
                "- Leanness (overall body fat level and muscle definition)".to_string()
            }
            other => format!("- {}", other.label()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn rating_instructions(mode: AnalysisMode) -> String {
    let mut text = String::new();
    match mode {
        AnalysisMode::UpperBody => {
            text.push_str("Rate ONLY these upper body muscle groups on a scale from 1 to 100:\n");
            text.push_str(&muscle_list(mode));
            text.push_str("\n\nDo NOT rate or mention: Glutes, Quads, Hamstrings, or Calves.");
        }
        AnalysisMode::FullBody => {
            text.push_str("Rate the following muscle groups on a scale from 1 to 100:\n");
            text.push_str(&muscle_list(mode));
        }
    }
    text.push_str("\n\n");
    text.push_str(SCORING_POLICY);
    text
}

fn focus_areas(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::UpperBody => "Focus ONLY on upper body muscle groups: Chest, Shoulders, Biceps, Triceps, Back, and Abs. DO NOT provide any lower body recommendations or exercises.",
        AnalysisMode::FullBody => "Analyze all muscle groups including both upper and lower body.",
    }
}

fn workout_instructions(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::UpperBody => "Provide a workout plan with 6-8 exercises focusing ONLY on upper body areas that need improvement (chest, shoulders, biceps, triceps, back, abs). DO NOT include any leg exercises, squats, lunges, calf raises, or other lower body movements.",
        AnalysisMode::FullBody => "Provide a workout plan with 6-8 exercises focusing on the areas that need improvement, including both upper and lower body exercises as needed.",
    }
}

pub fn build(gender: Gender, mode: AnalysisMode) -> String {
    let title = mode_title(mode);
    let (scope, tips) = match mode {
        AnalysisMode::UpperBody => ("upper body only", "upper body training tips only"),
        AnalysisMode::FullBody => ("full body", "full body training tips"),
    };

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are a professional fitness AI assistant analyzing a {title} physique.\n"
    );
    let _ = writeln!(
        prompt,
        "The user has uploaded full-body photos: a front-facing flexing image, a back-facing flexing image and optionally a side view. The user has selected their gender as {gender} and wants a {title} analysis.\n"
    );
    let _ = writeln!(prompt, "{}\n", focus_areas(mode));
    let _ = writeln!(prompt, "{}\n", rating_instructions(mode));
    prompt.push_str("BE STRICT with ratings - only exceptional physiques should score above 90, good physiques 70-85, average 50-70, below average 30-50, poor below 30.\n\n");
    prompt.push_str("EXCEPTION: For Abs and Leanness ratings, be more generous. If you can see ANY visible abdominal muscle definition or separation, assign AT LEAST 70 points for both Abs and Leanness categories. Only score below 70 if there is absolutely no visible ab definition.\n\n");
    prompt.push_str("Provide an **Overall Physique Score** from 1 to 100, considering symmetry, muscle balance, and aesthetics. Be strict - only elite physiques deserve scores above 85.\n\n");
    let _ = writeln!(
        prompt,
        "Briefly list:\n- 2-3 physique strengths ({scope})\n- 2-3 improvement suggestions ({tips})\n"
    );
    let _ = writeln!(prompt, "{}\n", workout_instructions(mode));
    prompt.push_str("Guidelines:\n");
    prompt.push_str("- Be supportive and constructive but strict and accurate\n");
    prompt.push_str("- Avoid negative tone or medical claims\n");
    prompt.push_str("- If any image is unclear or cropped, mention it in your response\n");
    prompt.push_str("- Cap all ratings at maximum 100\n");
    prompt.push_str("- Be realistic and strict with scoring EXCEPT for abs and leanness where visible definition should always be 70+\n");
    if mode.is_upper_body() {
        let _ = writeln!(prompt, "- {UPPER_BODY_RESTRICTION}");
    }
    prompt.push_str("\nMake sure the results are as accurate and truthful as possible.\n\n");
    prompt.push_str("Output format should be a JSON object with this exact structure:\n");
    prompt.push_str(example_payload(mode));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertables::*;

    fn example_keys(mode: AnalysisMode) -> Vec<String> {
        let value: serde_json::Value = serde_json::from_str(example_payload(mode)).unwrap();
        value["ratings"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn test_build_is_deterministic() {
        for mode in [AnalysisMode::UpperBody, AnalysisMode::FullBody] {
            for gender in [Gender::Male, Gender::Female] {
                assert_eq!(build(gender, mode), build(gender, mode));
            }
        }
    }

    #[test]
    fn test_examples_match_mode_groups() {
        for mode in [AnalysisMode::UpperBody, AnalysisMode::FullBody] {
            let mut expected: Vec<String> = mode
                .muscle_groups()
                .iter()
                .map(|g| g.key().to_string())
                .collect();
            expected.sort();
            let mut actual = example_keys(mode);
            actual.sort();
            assert_eq!(actual, expected, "mode {mode}");
        }
    }

    #[test]
    fn test_upper_body_prompt() {
        let prompt = build(Gender::Female, AnalysisMode::UpperBody);
        assert_contains!(prompt, "UPPER BODY ONLY");
        assert_contains!(prompt, "gender as female");
        assert_contains!(prompt, "Do NOT rate or mention: Glutes, Quads, Hamstrings, or Calves.");
        assert_contains!(prompt, UPPER_BODY_RESTRICTION);
        assert_contains!(prompt, "DO NOT include any leg exercises");
        assert_not_contains!(prompt, "- Glutes\n");
        assert_not_contains!(prompt, "\"calves\"");
    }

    #[test]
    fn test_full_body_prompt() {
        let prompt = build(Gender::Male, AnalysisMode::FullBody);
        assert_contains!(prompt, "FULL BODY");
        assert_contains!(prompt, "gender as male");
        for group in MuscleGroup::ALL {
            assert_contains!(prompt, &format!("\"{}\"", group.key()));
        }
        assert_not_contains!(prompt, UPPER_BODY_RESTRICTION);
    }

    #[test]
    fn test_prompt_states_policy_and_counts() {
        for mode in [AnalysisMode::UpperBody, AnalysisMode::FullBody] {
            let prompt = build(Gender::Male, mode);
            assert_contains!(prompt, "minimum score of 70");
            assert_contains!(prompt, "Cap all ratings at maximum 100");
            assert_contains!(prompt, "2-3 physique strengths");
            assert_contains!(prompt, "2-3 improvement suggestions");
            assert_contains!(prompt, "6-8 exercises");
            assert_contains!(prompt, "\"overallScore\"");
            assert_contains!(prompt, "\"workoutPlan\"");
        }
    }
}
