use crate::errors::AnalysisError;
use crate::types::{AnalysisMode, AnalysisResult, MuscleGroup, RatingSet, WorkoutEntry};
use serde_json::{Map, Value};

const DEFAULT_OVERALL_SCORE: i64 = 75;
const DEFAULT_ABS: i64 = 65;

/// Score substituted when the payload omits a group or gives an
/// out-of-range value.
pub fn default_rating(group: MuscleGroup) -> i64 {
    match group {
        MuscleGroup::Chest => 75,
        MuscleGroup::Shoulders => 80,
        MuscleGroup::Biceps => 78,
        MuscleGroup::Triceps => 76,
        MuscleGroup::Back => 82,
        MuscleGroup::Abs | MuscleGroup::Lean => DEFAULT_ABS,
        MuscleGroup::Glutes => 75,
        MuscleGroup::Quads => 70,
        MuscleGroup::Hamstrings => 72,
        MuscleGroup::Calves => 68,
    }
}

fn as_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64),
        _ => None,
    }
}

fn valid_score(value: Option<&Value>) -> Option<i64> {
    value.and_then(as_number).filter(|v| (1..=100).contains(v))
}

fn strings(payload: &Map<String, Value>, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn workout_plan(payload: &Map<String, Value>) -> Vec<WorkoutEntry> {
    payload
        .get("workoutPlan")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn ratings(source: &Map<String, Value>, mode: AnalysisMode) -> RatingSet {
    let abs = valid_score(source.get(MuscleGroup::Abs.key()));
    let mut ratings = RatingSet::new();
    for &group in mode.muscle_groups() {
        let value = valid_score(source.get(group.key())).unwrap_or_else(|| match group {
            MuscleGroup::Lean => abs.unwrap_or(DEFAULT_ABS),
            other => default_rating(other),
        });
        // RatingSet clamps to [1,100] and applies the abs/lean floor
        ratings.insert(group, value);
    }
    ratings
}

/// Turns the model's payload into a canonical result for `mode`.
pub fn normalize(payload: &Map<String, Value>, mode: AnalysisMode) -> Result<AnalysisResult, AnalysisError> {
    let source = payload
        .get("ratings")
        .and_then(Value::as_object)
        .ok_or_else(|| AnalysisError::Format("payload has no ratings object".to_string()))?;

    let overall_score = payload
        .get("overallScore")
        .and_then(as_number)
        .unwrap_or(DEFAULT_OVERALL_SCORE);

    Ok(AnalysisResult {
        overall_score: crate::types::clamp_score(overall_score),
        ratings: ratings(source, mode),
        strengths: strings(payload, "strengths"),
        improvements: strings(payload, "improvements"),
        workout_plan: workout_plan(payload),
        is_fallback: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertables::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn full_payload() -> Map<String, Value> {
        object(json!({
            "ratings": {
                "chest": 87, "shoulders": 92, "biceps": 90, "triceps": 88,
                "back": 91, "abs": 40, "lean": 75,
                "glutes": 85, "quads": 83, "hamstrings": 80, "calves": 76
            },
            "overallScore": 86,
            "strengths": ["Well-developed shoulders", "Good symmetry"],
            "improvements": ["Focus on lower leg development", "Increase core definition"],
            "workoutPlan": [
                {"exercise": "Calf Raises", "sets": "4 x 15-20", "focus": "Calves"},
                {"exercise": "Planks", "sets": "3 x 60s", "focus": "Abs"}
            ]
        }))
    }

    #[test]
    fn test_full_body_payload() {
        let result = normalize(&full_payload(), AnalysisMode::FullBody).unwrap();
        assert_eq!(result.overall_score, 86);
        assert_eq!(result.ratings.len(), 11);
        assert_eq!(result.ratings.get(MuscleGroup::Chest), Some(87));
        assert_eq!(result.ratings.get(MuscleGroup::Abs), Some(70));
        assert_eq!(result.ratings.get(MuscleGroup::Lean), Some(75));
        assert_eq!(result.ratings.get(MuscleGroup::Calves), Some(76));
        assert_eq!(result.strengths.len(), 2);
        assert_eq!(result.improvements[0], "Focus on lower leg development");
        assert_eq!(
            result.workout_plan[1],
            WorkoutEntry::new("Planks", "3 x 60s", "Abs")
        );
        assert!(!result.is_fallback);
    }

    #[test]
    fn test_upper_body_drops_lower_keys() {
        let result = normalize(&full_payload(), AnalysisMode::UpperBody).unwrap();
        assert_eq!(result.ratings.len(), 7);
        for group in MuscleGroup::LOWER_BODY {
            assert!(!result.ratings.contains(group), "{group} present");
        }
    }

    #[test]
    fn test_defaults_for_missing_keys() {
        let payload = object(json!({"ratings": {}}));
        let result = normalize(&payload, AnalysisMode::FullBody).unwrap();
        let expected = [
            (MuscleGroup::Chest, 75),
            (MuscleGroup::Shoulders, 80),
            (MuscleGroup::Biceps, 78),
            (MuscleGroup::Triceps, 76),
            (MuscleGroup::Back, 82),
            (MuscleGroup::Abs, 70),
            (MuscleGroup::Lean, 70),
            (MuscleGroup::Glutes, 75),
            (MuscleGroup::Quads, 70),
            (MuscleGroup::Hamstrings, 72),
            (MuscleGroup::Calves, 68),
        ];
        for (group, score) in expected {
            assert_eq!(result.ratings.get(group), Some(score), "{group}");
        }
        assert_eq!(result.overall_score, 75);
        assert!(result.strengths.is_empty());
        assert!(result.improvements.is_empty());
        assert!(result.workout_plan.is_empty());
    }

    #[test]
    fn test_lean_falls_back_to_abs() {
        let payload = object(json!({"ratings": {"abs": 84}}));
        let result = normalize(&payload, AnalysisMode::UpperBody).unwrap();
        assert_eq!(result.ratings.get(MuscleGroup::Abs), Some(84));
        assert_eq!(result.ratings.get(MuscleGroup::Lean), Some(84));
    }

    #[test]
    fn test_out_of_range_values_use_defaults() {
        let payload = object(json!({
            "ratings": {"chest": 0, "shoulders": 140, "biceps": "88", "triceps": 77.6, "back": null},
            "overallScore": 250
        }));
        let result = normalize(&payload, AnalysisMode::UpperBody).unwrap();
        assert_eq!(result.ratings.get(MuscleGroup::Chest), Some(75));
        assert_eq!(result.ratings.get(MuscleGroup::Shoulders), Some(80));
        assert_eq!(result.ratings.get(MuscleGroup::Biceps), Some(88));
        assert_eq!(result.ratings.get(MuscleGroup::Triceps), Some(78));
        assert_eq!(result.ratings.get(MuscleGroup::Back), Some(82));
        assert_eq!(result.overall_score, 100);
    }

    #[test]
    fn test_missing_ratings_is_format_error() {
        let payload = object(json!({"overallScore": 80}));
        let err = normalize(&payload, AnalysisMode::FullBody).unwrap_err();
        assert!(matches!(err, AnalysisError::Format(_)));

        let payload = object(json!({"ratings": [1, 2, 3]}));
        assert!(normalize(&payload, AnalysisMode::FullBody).is_err());
    }

    #[test]
    fn test_malformed_list_items_are_skipped() {
        let payload = object(json!({
            "ratings": {},
            "strengths": ["Strong back", 42, null],
            "workoutPlan": [
                {"exercise": "Pull-ups", "sets": "4 x 8", "focus": "Back"},
                {"exercise": "Incomplete"},
                "Push-ups"
            ]
        }));
        let result = normalize(&payload, AnalysisMode::UpperBody).unwrap();
        assert_eq!(result.strengths, vec!["Strong back".to_string()]);
        assert_eq!(result.workout_plan.len(), 1);
        assert_eq!(result.workout_plan[0].exercise_name, "Pull-ups");
    }

    fn score_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-1000i64..1000).prop_map(Value::from),
            (-500.0f64..500.0).prop_map(Value::from),
            Just(Value::Null),
            "[a-z0-9]{0,4}".prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn test_ratings_always_in_range(
            values in proptest::collection::vec(score_value(), 11),
            overall in score_value(),
            full in any::<bool>(),
        ) {
            let mode = if full { AnalysisMode::FullBody } else { AnalysisMode::UpperBody };
            let ratings: Map<String, Value> = MuscleGroup::ALL
                .iter()
                .zip(values)
                .map(|(g, v)| (g.key().to_string(), v))
                .collect();
            let mut payload = Map::new();
            payload.insert("ratings".to_string(), Value::Object(ratings));
            payload.insert("overallScore".to_string(), overall);

            let result = normalize(&payload, mode).unwrap();
            prop_assert_eq!(result.ratings.len(), mode.muscle_groups().len());
            for (group, score) in result.ratings.iter() {
                assert_ge!(score, 1);
                assert_le!(score, 100);
                if group.has_definition_floor() {
                    assert_ge!(score, 70);
                }
            }
            assert_ge!(result.overall_score, 1);
            assert_le!(result.overall_score, 100);
        }
    }
}
