//! Free-text planning scenarios scored by a step-marker and keyword heuristic.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use super::{AgeGroup, GameError, Score, Scored};
use crate::models::ScoreColumn;
use crate::recorder::SessionRecorder;

/// Responses shorter than this (after trimming) are not accepted
pub const MIN_RESPONSE_CHARS: usize = 10;

const LABELS: [&str; 5] = [
    "Very Poor Planning Quality",
    "Poor Planning Quality",
    "Average Planning Quality",
    "Good Planning Quality",
    "Excellent Planning Quality",
];

pub static YOUNGER_SCENARIOS: [&str; 3] = [
    "You have a big history project due next Friday. You also have a math test on Wednesday and soccer practice on Tuesday and Thursday. How would you plan your week to get everything done without rushing at the last minute?",
    "Your parents have agreed to let you host a small party for your friends on Saturday. You need to invite people, plan some activities, get snacks, and clean up afterwards. What are the steps you would take to organize a successful party?",
    "You want to save up $50 to buy a new video game. Your weekly allowance is $10, but you usually spend about $5 on snacks. Create a simple plan to save enough money for the game within a reasonable time.",
];

pub static OLDER_SCENARIOS: [&str; 3] = [
    "You're in your final year of high school and want to apply to three universities. Each application has different deadlines, essay requirements, and needs letters of recommendation. Outline a step-by-step plan from now until January to ensure all applications are strong and submitted on time.",
    "You're interested in a career in graphic design, but you don't have much experience. Create a long-term plan for the next two years to build a strong portfolio, learn necessary skills, and gain experience that would make you a good candidate for college programs or entry-level jobs.",
    "You and two friends want to plan a week-long road trip for the summer after graduation. You need to decide on a destination, create a budget for gas, food, and lodging, plan an itinerary, and figure out transportation. What are the key steps you would take to plan this trip?",
];

pub fn scenarios_for(age: AgeGroup) -> &'static [&'static str; 3] {
    match age {
        AgeGroup::Younger => &YOUNGER_SCENARIOS,
        AgeGroup::Older => &OLDER_SCENARIOS,
    }
}

lazy_static! {
    static ref STEP_MARKER: Regex = Regex::new(
        r"(\d+\.|-|\*|•|first|second|third|fourth|fifth|then|next|finally|after that|step \d)"
    )
    .unwrap();
    static ref YOUNGER_TIMING: Regex = Regex::new(
        r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday|weekend|after school|in the morning)\b"
    )
    .unwrap();
    static ref YOUNGER_ACTIONS: Regex =
        Regex::new(r"\b(ask|budget|list|invite|plan|schedule|save)\b").unwrap();
    static ref OLDER_CAREER: Regex =
        Regex::new(r"\b(research|apply|portfolio|deadline|resume|internship|network)\b").unwrap();
    static ref OLDER_LOGISTICS: Regex =
        Regex::new(r"\b(budget|save money|itinerary|book|long-term|career|skills)\b").unwrap();
}

/// Distinct step markers in lowercased text; falls back to the number of
/// full stops when no marker appears.
pub fn count_steps(text: &str) -> usize {
    let markers: HashSet<&str> = STEP_MARKER.find_iter(text).map(|m| m.as_str()).collect();
    if markers.is_empty() {
        text.matches('.').count()
    } else {
        markers.len()
    }
}

pub fn plan_score(response: &str, age: AgeGroup) -> Score {
    let text = response.trim().to_lowercase();
    if text.chars().count() < 15 {
        return Score::MIN;
    }
    let steps = count_steps(&text);

    let value = match age {
        AgeGroup::Younger => {
            let realism = usize::from(YOUNGER_TIMING.is_match(&text))
                + usize::from(YOUNGER_ACTIONS.is_match(&text));
            if steps >= 3 {
                5
            } else if steps >= 2 && realism > 0 {
                4
            } else if steps >= 1 {
                3
            } else {
                2
            }
        }
        AgeGroup::Older => {
            let realism = usize::from(OLDER_CAREER.is_match(&text))
                + usize::from(OLDER_LOGISTICS.is_match(&text));
            if steps >= 5 && realism > 0 {
                5
            } else if steps >= 3 && realism > 0 {
                4
            } else if steps >= 2 {
                3
            } else if steps >= 1 {
                2
            } else {
                1
            }
        }
    };
    Score::clamped(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanResponse {
    pub scenario: usize,
    pub response: String,
    pub score: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub age_group: AgeGroup,
    pub responses: Vec<PlanResponse>,
    pub score: Score,
    pub label: &'static str,
}

impl PlanSummary {
    /// The overall score is the rounded mean of the per-scenario scores.
    pub fn from_responses(age: AgeGroup, responses: &[PlanResponse]) -> Self {
        let score = if responses.is_empty() {
            Score::MIN
        } else {
            let total: u32 = responses.iter().map(|r| u32::from(r.score.value())).sum();
            Score::clamped((f64::from(total) / responses.len() as f64).round() as i32)
        };
        Self {
            age_group: age,
            responses: responses.to_vec(),
            score,
            label: score.label(&LABELS),
        }
    }
}

impl Scored for PlanSummary {
    fn score(&self) -> Score {
        self.score
    }

    fn interpretation(&self) -> &str {
        self.label
    }

    fn column(&self) -> Option<ScoreColumn> {
        Some(ScoreColumn::Plan)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanningPhase {
    Selection,
    Instructions { age: AgeGroup },
    Writing { age: AgeGroup, scenario: usize },
    Finished(PlanSummary),
}

pub struct PlanningGame {
    phase: PlanningPhase,
    recorder: SessionRecorder<PlanResponse>,
}

impl Default for PlanningGame {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanningGame {
    pub fn new() -> Self {
        Self {
            phase: PlanningPhase::Selection,
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &PlanningPhase {
        &self.phase
    }

    pub fn current_scenario(&self) -> Option<&'static str> {
        match self.phase {
            PlanningPhase::Writing { age, scenario } => scenarios_for(age).get(scenario).copied(),
            _ => None,
        }
    }

    pub fn select_age(&mut self, age: AgeGroup) -> Result<(), GameError> {
        match self.phase {
            PlanningPhase::Selection => {
                self.phase = PlanningPhase::Instructions { age };
                Ok(())
            }
            _ => Err(GameError::WrongPhase),
        }
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        let PlanningPhase::Instructions { age } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        self.recorder.reset();
        self.phase = PlanningPhase::Writing { age, scenario: 0 };
        Ok(())
    }

    /// Submit the plan for the current scenario. Short responses are rejected
    /// without advancing.
    pub fn submit(&mut self, response: &str) -> Result<Option<PlanSummary>, GameError> {
        let PlanningPhase::Writing { age, scenario } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        let response = response.trim();
        if response.chars().count() < MIN_RESPONSE_CHARS {
            return Err(GameError::ResponseTooShort {
                min: MIN_RESPONSE_CHARS,
            });
        }

        self.recorder
            .record(
                scenario as u64,
                PlanResponse {
                    scenario,
                    response: response.to_string(),
                    score: plan_score(response, age),
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        if scenario + 1 < scenarios_for(age).len() {
            self.phase = PlanningPhase::Writing {
                age,
                scenario: scenario + 1,
            };
            return Ok(None);
        }

        let summary = self
            .recorder
            .reduce(|responses| PlanSummary::from_responses(age, responses))
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = PlanningPhase::Finished(summary.clone());
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn very_short_text_scores_one() {
        assert_eq!(plan_score("study hard", AgeGroup::Younger).value(), 1);
        assert_eq!(plan_score("   1. 2. 3.    ", AgeGroup::Younger).value(), 1);
    }

    #[test]
    fn distinct_markers_are_counted_once() {
        assert_eq!(count_steps("first do this, then that, then more"), 2);
        assert_eq!(count_steps("1. read 2. write 3. rest"), 3);
    }

    #[test]
    fn falls_back_to_sentences() {
        assert_eq!(count_steps("i will read a book. i will go to bed."), 2);
        assert_eq!(count_steps("no structure at all"), 0);
    }

    #[test]
    fn younger_decision_table() {
        let three_steps = "First I finish math, then history, finally I rest";
        assert_eq!(plan_score(three_steps, AgeGroup::Younger).value(), 5);

        let two_steps_realistic = "First I make a list, then go shopping";
        assert_eq!(plan_score(two_steps_realistic, AgeGroup::Younger).value(), 4);

        let two_steps_vague = "First I relax, then go shopping";
        assert_eq!(plan_score(two_steps_vague, AgeGroup::Younger).value(), 3);

        let no_steps = "I would just do my homework whenever";
        assert_eq!(plan_score(no_steps, AgeGroup::Younger).value(), 2);
    }

    #[test]
    fn older_decision_table() {
        let detailed = "1. research schools 2. write essays 3. ask teachers 4. apply 5. submit";
        assert_eq!(plan_score(detailed, AgeGroup::Older).value(), 5);

        let unfocused = "1. relax 2. think 3. wait 4. see 5. hope it works";
        assert_eq!(plan_score(unfocused, AgeGroup::Older).value(), 3);

        let one_step = "I will simply do it at some point later";
        assert_eq!(plan_score(one_step, AgeGroup::Older).value(), 1);
    }

    #[test]
    fn short_response_is_rejected_without_advancing() {
        let mut game = PlanningGame::new();
        game.select_age(AgeGroup::Younger).unwrap();
        game.start().unwrap();

        assert_eq!(
            game.submit("  too short "),
            Err(GameError::ResponseTooShort { min: 10 })
        );
        assert_eq!(
            game.phase(),
            &PlanningPhase::Writing {
                age: AgeGroup::Younger,
                scenario: 0
            }
        );
    }

    #[test]
    fn summary_rounds_mean_score() {
        let mut game = PlanningGame::new();
        game.select_age(AgeGroup::Younger).unwrap();
        game.start().unwrap();

        assert_eq!(
            game.submit("First I plan, then I work, finally I check"),
            Ok(None)
        );
        assert_eq!(game.submit("I would just save money every week"), Ok(None));
        let summary = game
            .submit("I would just save money every week")
            .unwrap()
            .unwrap();

        // 5, 2, 2 -> mean 3.0
        assert_eq!(summary.responses.len(), 3);
        assert_eq!(summary.score.value(), 3);
        assert_eq!(summary.label, "Average Planning Quality");
    }
}
