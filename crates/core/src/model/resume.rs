use serde::{Deserialize, Serialize};

/// Resume pointer for the last normal quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalResume {
    pub round: String,
    pub subjects: Vec<String>,
    pub question_index: usize,
}

/// Resume pointer for the last checked-bookmark quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedResume {
    pub subjects: Vec<String>,
    pub question_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_resume_uses_persisted_field_names() {
        let state = NormalResume {
            round: "20240101".into(),
            subjects: vec!["A".into()],
            question_index: 2,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"round":"20240101","subjects":["A"],"questionIndex":2}"#
        );
    }

    #[test]
    fn checked_resume_requires_all_fields() {
        assert!(serde_json::from_str::<CheckedResume>(r#"{"subjects":["A"]}"#).is_err());
        let state: CheckedResume =
            serde_json::from_str(r#"{"subjects":["A"],"questionIndex":0}"#).unwrap();
        assert_eq!(state.question_index, 0);
    }
}
