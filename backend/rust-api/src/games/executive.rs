//! Executive-function self-report: fifty Likert items over five domains.
//!
//! Unlike the task scores, a higher domain score here means more reported
//! difficulty.

use serde::Serialize;

use super::{GameError, Score, Scored};
use crate::recorder::SessionRecorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Domain {
    Inhibition,
    WorkingMemory,
    Flexibility,
    EmotionalControl,
    Planning,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Inhibition,
        Domain::WorkingMemory,
        Domain::Flexibility,
        Domain::EmotionalControl,
        Domain::Planning,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Domain::Inhibition => "Inhibition",
            Domain::WorkingMemory => "Working Memory",
            Domain::Flexibility => "Flexibility",
            Domain::EmotionalControl => "Emotional Control",
            Domain::Planning => "Planning",
        }
    }

    /// Descriptions ordered by score 1..=5
    fn descriptions(&self) -> [&'static str; 5] {
        match self {
            Domain::Inhibition => [
                "Excellent control",
                "Good control",
                "Some problems",
                "Frequent problems",
                "Major problems",
            ],
            Domain::WorkingMemory => [
                "Never forgets",
                "Minor forgetting",
                "Moderate forgetting",
                "Often forgets",
                "Forgets constantly",
            ],
            Domain::Flexibility => [
                "Adapts easily",
                "Some adaptation",
                "Moderate difficulty",
                "Often struggles",
                "Very rigid",
            ],
            Domain::EmotionalControl => [
                "Stays calm",
                "Usually calm",
                "Sometimes upset",
                "Gets upset easily",
                "Emotional outbursts",
            ],
            Domain::Planning => [
                "Very organized",
                "Mostly organized",
                "Basic organization",
                "Poor organization",
                "Very disorganized",
            ],
        }
    }

    pub fn describe(&self, score: Score) -> &'static str {
        score.label(&self.descriptions())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Frequency {
    Never,
    Sometimes,
    Often,
    VeryOften,
}

impl Frequency {
    pub fn points(self) -> u32 {
        match self {
            Frequency::Never => 1,
            Frequency::Sometimes => 2,
            Frequency::Often => 3,
            Frequency::VeryOften => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub id: u32,
    pub domain: Domain,
    pub text: &'static str,
}

const fn item(id: u32, domain: Domain, text: &'static str) -> Item {
    Item { id, domain, text }
}

pub static ITEMS: [Item; 50] = [
    item(1, Domain::Inhibition, "I act without thinking."),
    item(2, Domain::Inhibition, "I have trouble waiting my turn in conversations or games."),
    item(3, Domain::Inhibition, "I interrupt others when they are speaking."),
    item(4, Domain::Inhibition, "I say things I regret later."),
    item(5, Domain::Inhibition, "I find it hard to resist temptations."),
    item(6, Domain::Inhibition, "I start tasks before getting all the instructions."),
    item(7, Domain::Inhibition, "I make impulsive decisions."),
    item(8, Domain::Inhibition, "I have difficulty stopping an activity I enjoy, even when I should."),
    item(9, Domain::Inhibition, "I rush through my assignments or chores."),
    item(10, Domain::Inhibition, "I blurt out answers in class before being called on."),
    item(11, Domain::WorkingMemory, "I forget instructions a few moments after hearing them."),
    item(12, Domain::WorkingMemory, "I lose track of my belongings like my keys, phone, or homework."),
    item(13, Domain::WorkingMemory, "I have trouble remembering what I just read."),
    item(14, Domain::WorkingMemory, "I walk into a room and forget why I went there."),
    item(15, Domain::WorkingMemory, "I find it hard to follow multi-step directions."),
    item(16, Domain::WorkingMemory, "I lose my train of thought while speaking."),
    item(17, Domain::WorkingMemory, "I need to have things repeated to me."),
    item(18, Domain::WorkingMemory, "I forget important dates or appointments."),
    item(19, Domain::WorkingMemory, "I struggle to remember names of people I just met."),
    item(20, Domain::WorkingMemory, "I have difficulty doing math problems in my head."),
    item(21, Domain::Flexibility, "I get upset by unexpected changes in plans."),
    item(22, Domain::Flexibility, "I have trouble switching from one activity to another."),
    item(23, Domain::Flexibility, "I get stuck on one way of doing things, even if it's not working."),
    item(24, Domain::Flexibility, "I find it hard to see a problem from someone else's perspective."),
    item(25, Domain::Flexibility, "I have trouble with new situations or unfamiliar places."),
    item(26, Domain::Flexibility, "I get frustrated when rules change."),
    item(27, Domain::Flexibility, "I have a hard time admitting when I'm wrong."),
    item(28, Domain::Flexibility, "I resist trying new foods or activities."),
    item(29, Domain::Flexibility, "I think in 'black and white' terms, finding it hard to see the gray areas."),
    item(30, Domain::Flexibility, "I struggle to find a different solution when my first attempt fails."),
    item(31, Domain::EmotionalControl, "Small problems or frustrations upset me more than they should."),
    item(32, Domain::EmotionalControl, "My emotional reactions feel very intense and overwhelming."),
    item(33, Domain::EmotionalControl, "I have a short temper or get angry easily."),
    item(34, Domain::EmotionalControl, "I overreact to situations."),
    item(35, Domain::EmotionalControl, "I find it hard to calm down once I'm upset."),
    item(36, Domain::EmotionalControl, "My mood can change quickly and unpredictably."),
    item(37, Domain::EmotionalControl, "I get easily embarrassed or discouraged."),
    item(38, Domain::EmotionalControl, "I cry over minor things."),
    item(39, Domain::EmotionalControl, "I find it difficult to handle criticism, even when it's constructive."),
    item(40, Domain::EmotionalControl, "I worry too much about what others think of me."),
    item(41, Domain::Planning, "I have trouble planning ahead for projects or assignments."),
    item(42, Domain::Planning, "My room, backpack, or locker is messy and disorganized."),
    item(43, Domain::Planning, "I wait until the last minute to start my homework or study for tests."),
    item(44, Domain::Planning, "I have a hard time estimating how long a task will take."),
    item(45, Domain::Planning, "I forget to bring the things I need for school or activities."),
    item(46, Domain::Planning, "I struggle to break down large projects into smaller steps."),
    item(47, Domain::Planning, "I have trouble managing my time effectively."),
    item(48, Domain::Planning, "I start projects but have a hard time finishing them."),
    item(49, Domain::Planning, "I don't have a system for keeping track of my assignments and due dates."),
    item(50, Domain::Planning, "I find it difficult to set and work towards long-term goals."),
];

/// Bucket an average point value (1.0..=4.0) into a 1..=5 score
pub fn domain_score(average_points: f64) -> Score {
    let value = if average_points <= 1.5 {
        1
    } else if average_points <= 2.2 {
        2
    } else if average_points <= 3.0 {
        3
    } else if average_points <= 3.7 {
        4
    } else {
        5
    };
    Score::clamped(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub item: u32,
    pub domain: Domain,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainResult {
    pub domain: Domain,
    pub average_points: f64,
    pub score: Score,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub domains: Vec<DomainResult>,
}

impl ExecutiveSummary {
    pub fn from_answers(answers: &[Answer]) -> Self {
        let domains = Domain::ALL
            .into_iter()
            .map(|domain| {
                let points: Vec<u32> = answers
                    .iter()
                    .filter(|a| a.domain == domain)
                    .map(|a| a.frequency.points())
                    .collect();
                let average_points = if points.is_empty() {
                    0.0
                } else {
                    f64::from(points.iter().sum::<u32>()) / points.len() as f64
                };
                let score = domain_score(average_points);
                DomainResult {
                    domain,
                    average_points,
                    score,
                    description: domain.describe(score),
                }
            })
            .collect();
        Self { domains }
    }

    pub fn domain(&self, domain: Domain) -> Option<&DomainResult> {
        self.domains.iter().find(|d| d.domain == domain)
    }
}

impl Scored for ExecutiveSummary {
    /// Rounded mean of the domain scores
    fn score(&self) -> Score {
        if self.domains.is_empty() {
            return Score::MIN;
        }
        let total: u32 = self.domains.iter().map(|d| u32::from(d.score.value())).sum();
        Score::clamped((f64::from(total) / self.domains.len() as f64).round() as i32)
    }

    fn interpretation(&self) -> &str {
        "Self-reported executive function profile"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutivePhase {
    Start,
    Answering { item: usize },
    Finished(ExecutiveSummary),
}

pub struct ExecutiveQuestionnaire {
    phase: ExecutivePhase,
    recorder: SessionRecorder<Answer>,
}

impl Default for ExecutiveQuestionnaire {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutiveQuestionnaire {
    pub fn new() -> Self {
        Self {
            phase: ExecutivePhase::Start,
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &ExecutivePhase {
        &self.phase
    }

    pub fn current_item(&self) -> Option<&'static Item> {
        match self.phase {
            ExecutivePhase::Answering { item } => ITEMS.get(item),
            _ => None,
        }
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, ExecutivePhase::Start) {
            return Err(GameError::WrongPhase);
        }
        self.recorder.reset();
        self.phase = ExecutivePhase::Answering { item: 0 };
        Ok(())
    }

    pub fn answer(&mut self, frequency: Frequency) -> Result<Option<ExecutiveSummary>, GameError> {
        let ExecutivePhase::Answering { item } = self.phase else {
            return Err(GameError::WrongPhase);
        };
        let question = &ITEMS[item];
        self.recorder
            .record(
                u64::from(question.id),
                Answer {
                    item: question.id,
                    domain: question.domain,
                    frequency,
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        if item + 1 < ITEMS.len() {
            self.phase = ExecutivePhase::Answering { item: item + 1 };
            return Ok(None);
        }

        let summary = self
            .recorder
            .reduce(ExecutiveSummary::from_answers)
            .map_err(|_| GameError::WrongPhase)?;
        self.phase = ExecutivePhase::Finished(summary.clone());
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_points_are_inclusive() {
        assert_eq!(domain_score(1.5).value(), 1);
        assert_eq!(domain_score(1.51).value(), 2);
        assert_eq!(domain_score(2.2).value(), 2);
        assert_eq!(domain_score(3.0).value(), 3);
        assert_eq!(domain_score(3.7).value(), 4);
        assert_eq!(domain_score(3.71).value(), 5);
    }

    #[test]
    fn each_domain_has_ten_items() {
        for domain in Domain::ALL {
            assert_eq!(ITEMS.iter().filter(|i| i.domain == domain).count(), 10);
        }
    }

    #[test]
    fn questionnaire_groups_by_domain() {
        let mut q = ExecutiveQuestionnaire::new();
        q.start().unwrap();

        let mut summary = None;
        for i in 0..ITEMS.len() {
            let frequency = match ITEMS[i].domain {
                Domain::Inhibition => Frequency::Never,
                Domain::WorkingMemory => Frequency::Sometimes,
                Domain::Flexibility => Frequency::Often,
                Domain::EmotionalControl => Frequency::VeryOften,
                Domain::Planning if i % 2 == 0 => Frequency::Never,
                Domain::Planning => Frequency::Sometimes,
            };
            summary = q.answer(frequency).unwrap();
        }

        let summary = summary.unwrap();
        let inhibition = summary.domain(Domain::Inhibition).unwrap();
        assert_eq!(inhibition.score.value(), 1);
        assert_eq!(inhibition.description, "Excellent control");

        let emotional = summary.domain(Domain::EmotionalControl).unwrap();
        assert_eq!(emotional.average_points, 4.0);
        assert_eq!(emotional.description, "Emotional outbursts");

        let planning = summary.domain(Domain::Planning).unwrap();
        assert_eq!(planning.average_points, 1.5);
        assert_eq!(planning.description, "Very organized");

        assert_eq!(q.answer(Frequency::Never), Err(GameError::WrongPhase));
    }
}
