//! Reflection diary: three open prompts, reported back with word counts.

use serde::Serialize;

use super::GameError;
use crate::recorder::SessionRecorder;

pub static PROMPTS: [&str; 3] = [
    "Describe a recent time you had trouble with self-control.",
    "Give an example of when you forgot something important.",
    "Tell about a situation where you had to change plans unexpectedly. How did it go?",
];

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiaryEntry {
    pub prompt: &'static str,
    pub answer: String,
    pub words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiarySummary {
    pub entries: Vec<DiaryEntry>,
    pub total_words: usize,
}

impl DiarySummary {
    pub fn from_entries(entries: &[DiaryEntry]) -> Self {
        Self {
            entries: entries.to_vec(),
            total_words: entries.iter().map(|e| e.words).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiaryPhase {
    Start,
    Writing { prompt: usize },
    Finished(DiarySummary),
}

pub struct DiaryGame {
    phase: DiaryPhase,
    recorder: SessionRecorder<DiaryEntry>,
}

impl Default for DiaryGame {
    fn default() -> Self {
        Self::new()
    }
}

impl DiaryGame {
    pub fn new() -> Self {
        Self {
            phase: DiaryPhase::Start,
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &DiaryPhase {
        &self.phase
    }

    pub fn current_prompt(&self) -> Option<&'static str> {
        match self.phase {
            DiaryPhase::Writing { prompt } => PROMPTS.get(prompt).copied(),
            _ => None,
        }
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, DiaryPhase::Start) {
            return Err(GameError::WrongPhase);
        }
        self.recorder.reset();
        self.phase = DiaryPhase::Writing { prompt: 0 };
        Ok(())
    }

    pub fn write(&mut self, answer: &str) -> Result<Option<DiarySummary>, GameError> {
        let DiaryPhase::Writing { prompt } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        let text = PROMPTS.get(prompt).copied().ok_or(GameError::WrongPhase)?;
        let answer = answer.trim();
        self.recorder
            .record(
                prompt as u64,
                DiaryEntry {
                    prompt: text,
                    answer: answer.to_string(),
                    words: word_count(answer),
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        if prompt + 1 < PROMPTS.len() {
            self.phase = DiaryPhase::Writing { prompt: prompt + 1 };
            return Ok(None);
        }
        let summary = self
            .recorder
            .reduce(DiarySummary::from_entries)
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = DiaryPhase::Finished(summary.clone());
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_whitespace_separated_words() {
        assert_eq!(word_count("  I   forgot\tmy keys\n"), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn reports_each_answer() {
        let mut game = DiaryGame::new();
        game.start().unwrap();
        assert_eq!(game.current_prompt(), Some(PROMPTS[0]));

        assert_eq!(game.write("I ate the whole cake"), Ok(None));
        assert_eq!(game.write(""), Ok(None));
        let summary = game.write("We moved the trip and it went fine").unwrap().unwrap();

        let words: Vec<usize> = summary.entries.iter().map(|e| e.words).collect();
        assert_eq!(words, vec![5, 0, 8]);
        assert_eq!(summary.total_words, 13);
        assert_eq!(summary.entries[2].prompt, PROMPTS[2]);
        assert_eq!(game.write("more"), Err(GameError::WrongPhase));
    }
}
