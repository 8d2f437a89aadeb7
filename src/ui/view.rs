// Presentation helpers that do not touch Slint types
//
// Everything here is plain data so it can be computed on any thread and
// unit tested without a window.

use crate::models::{AppState, Question, ResultSummary, Screen};
use rand::Rng;

/// Confetti pieces on a perfect score
pub const CONFETTI_PIECES: usize = 100;

/// Highlight of an option button, matching the `state` field in `main.slint`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Idle = 0,
    Correct = 1,
    Wrong = 2,
    Dimmed = 3,
}

impl OptionState {
    /// Once answered: the right option turns green, a wrong pick turns red,
    /// the rest fade.
    pub fn for_option(
        option: &str,
        correct_answer: &str,
        selected: Option<&str>,
        answered: bool,
    ) -> Self {
        if !answered {
            OptionState::Idle
        } else if option == correct_answer {
            OptionState::Correct
        } else if Some(option) == selected {
            OptionState::Wrong
        } else {
            OptionState::Dimmed
        }
    }

    pub fn as_int(self) -> i32 {
        self as i32
    }
}

/// Option labels paired with their highlight
pub fn option_states(
    question: &Question,
    selected: Option<&str>,
    answered: bool,
) -> Vec<(String, OptionState)> {
    question
        .options
        .iter()
        .map(|option| {
            let state =
                OptionState::for_option(option, &question.correct_answer, selected, answered);
            (option.clone(), state)
        })
        .collect()
}

/// Fraction of the progress bar filled while question `index` is shown
pub fn progress(index: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((index + 1) as f32 / total as f32).min(1.0)
}

/// One falling confetti piece
#[derive(Debug, Clone, PartialEq)]
pub struct Confetti {
    /// Horizontal position as a fraction of the window width
    pub x: f32,
    /// Seconds per fall
    pub duration: f32,
    /// Seconds before the first fall
    pub delay: f32,
    pub color: [u8; 3],
}

pub fn generate_confetti<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Confetti> {
    (0..count)
        .map(|_| Confetti {
            x: rng.gen_range(0.0..1.0),
            duration: rng.gen_range(2.0..5.0),
            delay: rng.gen_range(0.0..2.0),
            color: hsl_to_rgb(rng.gen_range(0.0..360.0), 1.0, 0.5),
        })
        .collect()
}

/// HSL (hue in degrees, saturation and lightness in 0..=1) to 8-bit RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let hue = hue.rem_euclid(360.0);
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

/// Window fields owned by the flow state rather than a quiz session.
///
/// Rebuilt from a full snapshot, so the window can be resynchronised after
/// individual change events were missed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowView {
    pub screen: i32,
    pub student_name: String,
    pub final_score: u32,
    pub max_score: u32,
    /// Only set on the results screen
    pub perfect: bool,
}

impl FlowView {
    pub fn from_state(state: &AppState) -> Self {
        let summary = ResultSummary::new(state.final_score);
        Self {
            screen: state.screen.index(),
            student_name: state.student_name().unwrap_or_default().to_string(),
            final_score: summary.score,
            max_score: summary.max_score,
            perfect: state.screen == Screen::Results && summary.is_perfect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn state_at(screen: Screen, score: u32) -> AppState {
        AppState {
            screen,
            student: Some(crate::models::Student::new("An", "2A").unwrap()),
            selected_subject: None,
            final_score: score,
        }
    }

    #[test]
    fn test_flow_view_on_welcome() {
        let view = FlowView::from_state(&AppState::default());
        assert_eq!(view.screen, 0);
        assert_eq!(view.student_name, "");
        assert_eq!(view.final_score, 0);
        assert!(!view.perfect);
    }

    #[test]
    fn test_flow_view_carries_results() {
        let view = FlowView::from_state(&state_at(Screen::Results, 30));
        assert_eq!(view.screen, Screen::Results.index());
        assert_eq!(view.student_name, "An");
        assert_eq!(view.final_score, 30);
        assert_eq!(view.max_score, 30);
        assert!(view.perfect);

        let view = FlowView::from_state(&state_at(Screen::Results, 29));
        assert_eq!(view.final_score, 29);
        assert!(!view.perfect);
    }

    #[test]
    fn test_flow_view_after_replay_is_not_perfect() {
        let view = FlowView::from_state(&state_at(Screen::SubjectSelection, 0));
        assert_eq!(view.screen, Screen::SubjectSelection.index());
        assert_eq!(view.student_name, "An");
        assert!(!view.perfect);
    }

    fn question() -> Question {
        Question::new(
            "Con gì kêu meo meo?",
            vec!["Chó".into(), "Mèo".into(), "Gà".into(), "Vịt".into()],
            "Mèo",
        )
    }

    #[test]
    fn test_unanswered_options_are_idle() {
        let states = option_states(&question(), None, false);
        assert!(states.iter().all(|(_, s)| *s == OptionState::Idle));
    }

    #[test]
    fn test_wrong_pick_highlighting() {
        let states = option_states(&question(), Some("Gà"), true);
        let states: Vec<_> = states.into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            states,
            vec![
                OptionState::Dimmed,
                OptionState::Correct,
                OptionState::Wrong,
                OptionState::Dimmed
            ]
        );
    }

    #[test]
    fn test_timeout_only_reveals_correct() {
        let states = option_states(&question(), None, true);
        assert_eq!(
            states.iter().filter(|(_, s)| *s == OptionState::Correct).count(),
            1
        );
        assert!(!states.iter().any(|(_, s)| *s == OptionState::Wrong));
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(0, 30), 1.0 / 30.0);
        assert_eq!(progress(29, 30), 1.0);
        assert_eq!(progress(0, 0), 0.0);
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), [0, 0, 255]);
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), [255, 0, 0]);
    }

    #[test]
    fn test_confetti_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let pieces = generate_confetti(&mut rng, CONFETTI_PIECES);

        assert_eq!(pieces.len(), CONFETTI_PIECES);
        for piece in &pieces {
            assert!((0.0..1.0).contains(&piece.x));
            assert!((2.0..5.0).contains(&piece.duration));
            assert!((0.0..2.0).contains(&piece.delay));
        }
    }

    proptest! {
        #[test]
        fn prop_full_saturation_has_a_max_channel(hue in 0.0f32..360.0) {
            let rgb = hsl_to_rgb(hue, 1.0, 0.5);
            prop_assert_eq!(rgb.iter().copied().max(), Some(255));
            prop_assert!(rgb.iter().copied().min().unwrap() <= 1);
        }
    }
}
