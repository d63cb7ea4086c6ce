//! Template catalog of survey questions used to seed and reset rooms.

use std::collections::HashSet;

use thiserror::Error;

use crate::state::room::{Answer, Question};

/// Reasons a question catalog is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionBankError {
    /// The catalog has no question at all.
    #[error("question bank must contain at least one question")]
    Empty,
    /// Question ids must follow the play order `1..=n`.
    #[error("question at position {position} has id {id}, expected {position}")]
    OutOfOrder { position: usize, id: u32 },
    /// A question without answers cannot be played.
    #[error("question {id} has no answers")]
    NoAnswers { id: u32 },
    /// Two answers of the same question share an id.
    #[error("question {question_id} declares answer {answer_id} twice")]
    DuplicateAnswer { question_id: u32, answer_id: u32 },
}

/// Immutable, ordered question catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Validate and wrap a catalog.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionBankError> {
        if questions.is_empty() {
            return Err(QuestionBankError::Empty);
        }

        for (index, question) in questions.iter().enumerate() {
            let position = index + 1;
            if question.id as usize != position {
                return Err(QuestionBankError::OutOfOrder {
                    position,
                    id: question.id,
                });
            }

            if question.answers.is_empty() {
                return Err(QuestionBankError::NoAnswers { id: question.id });
            }

            let mut seen = HashSet::new();
            for answer in &question.answers {
                if !seen.insert(answer.id) {
                    return Err(QuestionBankError::DuplicateAnswer {
                        question_id: question.id,
                        answer_id: answer.id,
                    });
                }
            }
        }

        Ok(Self { questions })
    }

    /// Catalog shipped with the binary.
    pub fn builtin() -> Self {
        Self {
            questions: builtin_questions(),
        }
    }

    /// Number of playable questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a validated bank; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Read-only view over the templates.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Fresh deep copy for a room, with every answer hidden again.
    pub fn reset_questions(&self) -> Vec<Question> {
        self.questions
            .iter()
            .cloned()
            .map(|mut question| {
                for answer in &mut question.answers {
                    answer.revealed = false;
                }
                question
            })
            .collect()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

fn question(id: u32, theme: &str, text: &str, answers: &[(&str, u32)]) -> Question {
    Question {
        id,
        theme: theme.to_string(),
        question_text: text.to_string(),
        answers: answers
            .iter()
            .zip(1..)
            .map(|(&(text, points), id)| Answer {
                id,
                text: text.to_string(),
                points,
                revealed: false,
            })
            .collect(),
    }
}

fn builtin_questions() -> Vec<Question> {
    vec![
        question(
            1,
            "Cuisine DZ",
            "Quel est le plat incontournable d'un mariage algérien ?",
            &[
                ("Couscous", 45),
                ("Chorba", 25),
                ("Bourek", 15),
                ("Tajine Zitoun", 10),
                ("Ham Lahlou", 5),
            ],
        ),
        question(
            2,
            "Vie Quotidienne",
            "Qu'est-ce qu'on achète toujours au dernier moment avant l'Aïd ?",
            &[
                ("Les vêtements des enfants", 40),
                ("La semoule pour les gâteaux", 30),
                ("Le mouton", 15),
                ("Le henné", 10),
                ("Les bougies", 5),
            ],
        ),
        question(
            3,
            "Transports",
            "Quel est le moyen de transport le plus typique à Alger ?",
            &[
                ("Métro", 35),
                ("Téléphérique", 30),
                ("Bus ETUSA", 20),
                ("Taxi clandestin", 10),
                ("Tramway", 5),
            ],
        ),
    ]
}
