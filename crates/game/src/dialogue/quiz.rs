use quizfield_engine::{InputAction, InputSnapshot};

use crate::data::{Quiz, QuizKind};

/// Longest free-text answer the player can type.
pub(crate) const TEXT_INPUT_MAX_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuizInput {
    Pending,
    Answered { correct: bool },
}

/// Where the player is inside a quiz: which question, and what they have
/// selected or typed for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct QuizProgress {
    pub(crate) index: usize,
    pub(crate) selected: usize,
    pub(crate) input: String,
}

impl QuizProgress {
    pub(crate) fn handle(&mut self, quiz: &Quiz, input: &InputSnapshot) -> QuizInput {
        match &quiz.kind {
            QuizKind::Choice { choices, .. } => {
                let count = choices.len();
                if input.pressed(InputAction::MoveUp) {
                    if count > 0 {
                        self.selected = (self.selected + count - 1) % count;
                    }
                } else if input.pressed(InputAction::MoveDown) {
                    if count > 0 {
                        self.selected = (self.selected + 1) % count;
                    }
                } else if input.pressed(InputAction::Confirm) {
                    return QuizInput::Answered {
                        correct: quiz.is_correct_choice(self.selected),
                    };
                }
                QuizInput::Pending
            }
            QuizKind::Text { .. } => {
                for action in InputAction::NUMERIC_ENTRY {
                    if let Some(ch) = action.typed_char().filter(|_| input.pressed(action)) {
                        self.push_char(ch);
                    }
                }
                if input.pressed(InputAction::Backspace) {
                    self.input.pop();
                } else if input.pressed(InputAction::Confirm) {
                    return QuizInput::Answered {
                        correct: quiz.is_correct_text(&self.input),
                    };
                }
                QuizInput::Pending
            }
        }
    }

    fn push_char(&mut self, ch: char) {
        if self.input.chars().count() >= TEXT_INPUT_MAX_CHARS {
            return;
        }
        if ch == '.' && self.input.contains('.') {
            return;
        }
        self.input.push(ch);
    }

    pub(crate) fn next_question(&mut self) {
        self.index += 1;
        self.selected = 0;
        self.input.clear();
    }

    pub(crate) fn display_lines(&self, quiz: &Quiz) -> Vec<String> {
        let mut lines = vec![quiz.prompt.clone()];
        match &quiz.kind {
            QuizKind::Choice { choices, .. } => {
                lines.extend(choices.iter().enumerate().map(|(index, choice)| {
                    let cursor = if index == self.selected { '>' } else { ' ' };
                    format!("{cursor} {}. {choice}", index + 1)
                }));
            }
            QuizKind::Text { .. } => lines.push(format!("INPUT: {}_", self.input)),
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_quiz(answer: usize) -> Quiz {
        Quiz {
            prompt: "Which?".to_string(),
            kind: QuizKind::Choice {
                choices: vec!["x".to_string(), "y".to_string(), "z".to_string()],
                answer,
            },
            reward: Vec::new(),
        }
    }

    fn text_quiz(answer: &str) -> Quiz {
        Quiz {
            prompt: "How much?".to_string(),
            kind: QuizKind::Text {
                answer: answer.to_string(),
            },
            reward: Vec::new(),
        }
    }

    fn press(action: InputAction) -> InputSnapshot {
        InputSnapshot::empty().with_pressed(action)
    }

    #[test]
    fn selection_wraps_both_directions() {
        let quiz = choice_quiz(1);
        let mut progress = QuizProgress::default();
        progress.handle(&quiz, &press(InputAction::MoveUp));
        assert_eq!(progress.selected, 2);
        progress.handle(&quiz, &press(InputAction::MoveDown));
        assert_eq!(progress.selected, 0);
        progress.handle(&quiz, &press(InputAction::MoveDown));
        assert_eq!(
            progress.handle(&quiz, &press(InputAction::Confirm)),
            QuizInput::Answered { correct: true }
        );
    }

    #[test]
    fn empty_choice_list_does_not_panic_and_is_wrong() {
        let quiz = Quiz {
            prompt: String::new(),
            kind: QuizKind::Choice {
                choices: Vec::new(),
                answer: 0,
            },
            reward: Vec::new(),
        };
        let mut progress = QuizProgress::default();
        progress.handle(&quiz, &press(InputAction::MoveUp));
        assert_eq!(
            progress.handle(&quiz, &press(InputAction::Confirm)),
            QuizInput::Answered { correct: false }
        );
    }

    #[test]
    fn text_input_caps_length_and_single_decimal() {
        let quiz = text_quiz("3.14");
        let mut progress = QuizProgress::default();
        for action in [
            InputAction::Digit3,
            InputAction::Decimal,
            InputAction::Decimal,
            InputAction::Digit1,
            InputAction::Digit4,
        ] {
            progress.handle(&quiz, &press(action));
        }
        assert_eq!(progress.input, "3.14");
        assert_eq!(
            progress.handle(&quiz, &press(InputAction::Confirm)),
            QuizInput::Answered { correct: true }
        );

        for _ in 0..20 {
            progress.handle(&quiz, &press(InputAction::Digit9));
        }
        assert_eq!(progress.input.len(), TEXT_INPUT_MAX_CHARS);
        progress.handle(&quiz, &press(InputAction::Backspace));
        assert_eq!(progress.input.len(), TEXT_INPUT_MAX_CHARS - 1);
    }

    #[test]
    fn display_marks_selected_choice() {
        let quiz = choice_quiz(0);
        let progress = QuizProgress {
            selected: 1,
            ..QuizProgress::default()
        };
        assert_eq!(
            progress.display_lines(&quiz),
            vec!["Which?", "  1. x", "> 2. y", "  3. z"]
        );
        let typed = QuizProgress {
            input: "42".to_string(),
            ..QuizProgress::default()
        };
        assert_eq!(typed.display_lines(&text_quiz("42"))[1], "INPUT: 42_");
    }
}
