/// Highest achievable score.
pub const MAX_SCORE: u32 = 30;

/// What the results screen shows for a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub score: u32,
    pub max_score: u32,
    pub is_perfect: bool,
}

impl ResultSummary {
    pub fn new(score: u32) -> Self {
        let score = score.min(MAX_SCORE);
        Self {
            score,
            max_score: MAX_SCORE,
            is_perfect: score == MAX_SCORE,
        }
    }

    pub fn headline(&self) -> &'static str {
        if self.is_perfect {
            "Xuất sắc!"
        } else {
            "Hoàn thành!"
        }
    }

    pub fn message(&self, student_name: &str) -> String {
        if self.is_perfect {
            format!("Chúc mừng {} đã hoàn thành tất cả các câu hỏi!", student_name)
        } else {
            format!("{} đã làm rất tốt!", student_name)
        }
    }

    /// Score line, e.g. "29 / 30".
    pub fn score_line(&self) -> String {
        format!("{} / {}", self.score, self.max_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_score() {
        let summary = ResultSummary::new(30);
        assert!(summary.is_perfect);
        assert_eq!(summary.headline(), "Xuất sắc!");
        assert!(summary.message("An").contains("An"));
    }

    #[test]
    fn test_regular_score() {
        let summary = ResultSummary::new(29);
        assert!(!summary.is_perfect);
        assert_eq!(summary.score_line(), "29 / 30");
        assert_eq!(summary.message("Bình"), "Bình đã làm rất tốt!");
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(ResultSummary::new(31).score, 30);
    }
}
