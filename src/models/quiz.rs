use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when registration input is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Student name is required")]
    MissingName,

    #[error("Class name is required")]
    MissingClassName,

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),
}

/// The student taking the quiz.
///
/// Created once on the welcome screen and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub name: String,
    pub class_name: String,
}

impl Student {
    /// Build a student from raw form input.
    ///
    /// Both fields are trimmed and must be non-empty after trimming.
    pub fn new(name: &str, class_name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        let class_name = class_name.trim();

        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if class_name.is_empty() {
            return Err(ValidationError::MissingClassName);
        }

        Ok(Self {
            name: name.to_string(),
            class_name: class_name.to_string(),
        })
    }
}

/// A selectable subject tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub name: &'static str,
    /// RGB tile color
    pub display_color: [u8; 3],
    pub icon: &'static str,
}

/// The fixed set of subjects offered on the selection screen.
pub const SUBJECTS: [Subject; 3] = [
    Subject {
        name: "Toán",
        display_color: [0x60, 0xa5, 0xfa],
        icon: "🔢",
    },
    Subject {
        name: "Tiếng Việt",
        display_color: [0xf8, 0x71, 0x71],
        icon: "📖",
    },
    Subject {
        name: "Tự nhiên & Xã hội",
        display_color: [0x4a, 0xde, 0x80],
        icon: "🌳",
    },
];

impl Subject {
    /// Look up a subject by its exact display name.
    pub fn find(name: &str) -> Option<&'static Subject> {
        SUBJECTS.iter().find(|s| s.name == name)
    }
}

/// Answer choices shown for every question
pub const OPTIONS_PER_QUESTION: usize = 4;

/// One multiple-choice question as produced by the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    pub fn new<S: Into<String>>(question_text: S, options: Vec<String>, correct_answer: S) -> Self {
        Self {
            question_text: question_text.into(),
            options,
            correct_answer: correct_answer.into(),
        }
    }

    /// True when `answer` is exactly the correct answer.
    pub fn is_correct(&self, answer: Option<&str>) -> bool {
        answer == Some(self.correct_answer.as_str())
    }

    /// Exactly [`OPTIONS_PER_QUESTION`] options, with the correct answer
    /// matching exactly one of them by value.
    pub fn is_well_formed(&self) -> bool {
        self.options.len() == OPTIONS_PER_QUESTION
            && self
                .options
                .iter()
                .filter(|o| **o == self.correct_answer)
                .count()
                == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question::new(
            "2 + 3 = ?",
            vec!["4".into(), "5".into(), "6".into(), "7".into()],
            "5",
        )
    }

    #[test]
    fn test_student_is_trimmed() {
        let student = Student::new("  Nguyễn Văn A ", " Lớp 2A").unwrap();
        assert_eq!(student.name, "Nguyễn Văn A");
        assert_eq!(student.class_name, "Lớp 2A");
    }

    #[test]
    fn test_student_rejects_blank_fields() {
        assert_eq!(Student::new("   ", "2A"), Err(ValidationError::MissingName));
        assert_eq!(Student::new("An", ""), Err(ValidationError::MissingClassName));
    }

    #[test]
    fn test_subject_lookup() {
        assert_eq!(Subject::find("Toán").map(|s| s.icon), Some("🔢"));
        assert!(Subject::find("toán").is_none());
        assert!(Subject::find("Âm nhạc").is_none());
    }

    #[test]
    fn test_question_scoring_is_exact() {
        let q = sample_question();
        assert!(q.is_correct(Some("5")));
        assert!(!q.is_correct(Some(" 5")));
        assert!(!q.is_correct(Some("4")));
        assert!(!q.is_correct(None));
    }

    #[test]
    fn test_question_well_formed() {
        assert!(sample_question().is_well_formed());

        let missing = Question::new(
            "?",
            vec!["a".into(), "b".into(), "d".into(), "e".into()],
            "c",
        );
        assert!(!missing.is_well_formed());

        let duplicated = Question::new(
            "?",
            vec!["a".into(), "a".into(), "b".into(), "c".into()],
            "a",
        );
        assert!(!duplicated.is_well_formed());
    }

    #[test]
    fn test_question_needs_four_options() {
        let single = Question::new("?", vec!["only".into()], "only");
        assert!(!single.is_well_formed());

        let two = Question::new("?", vec!["a".into(), "b".into()], "a");
        assert!(!two.is_well_formed());

        let six = Question::new("?", (0..6).map(|i| i.to_string()).collect(), "0");
        assert!(!six.is_well_formed());

        let empty = Question::new("?", Vec::new(), "a");
        assert!(!empty.is_well_formed());
    }

    #[test]
    fn test_question_json_field_names() {
        let json = r#"{"questionText":"1 + 1 = ?","options":["1","2","3","4"],"correctAnswer":"2"}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.question_text, "1 + 1 = ?");
        assert_eq!(q.correct_answer, "2");
    }
}
