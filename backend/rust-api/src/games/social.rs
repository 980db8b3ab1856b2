//! Social decision scenarios answered privately and again under peer pressure.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::{GameError, Score, Scored};
use crate::recorder::{action_key, SessionRecorder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Choice {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub id: u32,
    pub topic: &'static str,
    pub text: &'static str,
    pub option_a: &'static str,
    pub option_b: &'static str,
    pub peer_text: &'static str,
}

pub static SCENARIOS: [Scenario; 8] = [
    Scenario {
        id: 1,
        topic: "Party Attendance",
        text: "You get invited to a big party on Saturday, but you have a huge test on Monday you need to study for.",
        option_a: "Go to the party and study later.",
        option_b: "Stay home and focus on studying.",
        peer_text: "All your friends are texting you, saying you have to come and that you can just study on Sunday.",
    },
    Scenario {
        id: 2,
        topic: "Academic Choices",
        text: "It's time to pick your classes for next year. There's a class you're really interested in, but none of your friends are taking it.",
        option_a: "Take the class you're interested in.",
        option_b: "Take an easier class with your friends.",
        peer_text: "Your friends think you should take the easier class with them so you can all have fun together.",
    },
    Scenario {
        id: 3,
        topic: "Rule-Following",
        text: "You and your friends are at the movies and consider sneaking into a second movie without paying.",
        option_a: "Tell them it's a bad idea and go home.",
        option_b: "Go along with it to not ruin the fun.",
        peer_text: "Your friends are all for it, saying \"everyone does it\" and that you won't get caught.",
    },
    Scenario {
        id: 4,
        topic: "Friendship Conflicts",
        text: "Two of your best friends had a big argument and are now asking you to take a side.",
        option_a: "Try to help them talk it out without taking a side.",
        option_b: "Side with the friend you think is more in the right.",
        peer_text: "The friend you feel is more right is pressuring you to back them up and stop talking to the other friend.",
    },
    Scenario {
        id: 5,
        topic: "Social Events",
        text: "A new student invites you to their birthday lunch. You don't know them well, and your friends are planning to sit at your usual table.",
        option_a: "Join the new student for their birthday.",
        option_b: "Stick with your friends at your usual table.",
        peer_text: "Your friends think you should stay with them, saying it would be awkward to go sit with someone new.",
    },
    Scenario {
        id: 6,
        topic: "Academic Integrity",
        text: "A friend asks if they can copy your homework because they didn't have time to do it.",
        option_a: "Politely refuse and offer to help them understand it.",
        option_b: "Let them copy your answers.",
        peer_text: "Your friend says, \"Please, I'm desperate! A real friend would help me out here.\"",
    },
    Scenario {
        id: 7,
        topic: "Trying New Things",
        text: "There are tryouts for the school play. You've always been curious about acting, but you're nervous.",
        option_a: "Go to the tryouts and give it a shot.",
        option_b: "Decide it's too scary and skip it.",
        peer_text: "You mention it to a friend and they laugh, saying, \"You, in a play? That's not really your thing, is it?\"",
    },
    Scenario {
        id: 8,
        topic: "Interpersonal Boundaries",
        text: "A friend is telling a secret about another person that you feel is not their story to share.",
        option_a: "Change the subject or say you're not comfortable gossiping.",
        option_b: "Listen to the story.",
        peer_text: "Your friend says, \"Oh come on, I have to tell you what happened. It's so juicy!\"",
    },
];

/// Banded reading of how many answers changed under peer pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SocialProfile {
    pub score: Score,
    pub pattern: &'static str,
    pub quality: &'static str,
    pub confidence: &'static str,
}

pub fn social_profile(choice_changes: usize) -> SocialProfile {
    let (score, pattern, quality, confidence) = match choice_changes {
        0..=1 => (5, "Aware but independent", "Maintains good reasoning", "High in both conditions"),
        2 => (4, "Mostly independent", "Minor reasoning decline", "Slight drop with peers"),
        3..=4 => (3, "Balanced approach", "Some reasoning affected", "Moderate confidence loss"),
        5..=6 => (2, "Overly concerned with peers", "Reasoning clearly affected", "Large confidence drop"),
        _ => (1, "Dominated by peer opinion", "Poor reasoning under pressure", "Very low with peers"),
    };
    SocialProfile {
        score: Score::clamped(score),
        pattern,
        quality,
        confidence,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    Personal,
    Peer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SocialAnswer {
    pub round: Round,
    pub scenario: u32,
    pub choice: Choice,
}

/// Scenarios whose private and peer-round answers differ, matched by id
pub fn choice_changes(answers: &[SocialAnswer]) -> usize {
    answers
        .iter()
        .filter(|a| a.round == Round::Personal)
        .filter(|personal| {
            answers
                .iter()
                .find(|a| a.round == Round::Peer && a.scenario == personal.scenario)
                .is_some_and(|peer| peer.choice != personal.choice)
        })
        .count()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialSummary {
    pub choice_changes: usize,
    pub profile: SocialProfile,
}

impl SocialSummary {
    pub fn from_answers(answers: &[SocialAnswer]) -> Self {
        let changes = choice_changes(answers);
        Self {
            choice_changes: changes,
            profile: social_profile(changes),
        }
    }
}

impl Scored for SocialSummary {
    fn score(&self) -> Score {
        self.profile.score
    }

    fn interpretation(&self) -> &str {
        self.profile.pattern
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocialPhase {
    Start,
    Personal { index: usize },
    Interstitial,
    Peer { index: usize },
    Finished(SocialSummary),
}

pub struct SocialGame {
    phase: SocialPhase,
    peer_order: Vec<usize>,
    recorder: SessionRecorder<SocialAnswer>,
}

impl Default for SocialGame {
    fn default() -> Self {
        Self::new()
    }
}

impl SocialGame {
    pub fn new() -> Self {
        Self {
            phase: SocialPhase::Start,
            peer_order: (0..SCENARIOS.len()).collect(),
            recorder: SessionRecorder::new(),
        }
    }

    pub fn phase(&self) -> &SocialPhase {
        &self.phase
    }

    /// Scenario on screen; the peer round walks the shuffled order
    pub fn current_scenario(&self) -> Option<&'static Scenario> {
        match self.phase {
            SocialPhase::Personal { index } => SCENARIOS.get(index),
            SocialPhase::Peer { index } => self.peer_order.get(index).and_then(|&i| SCENARIOS.get(i)),
            _ => None,
        }
    }

    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if !matches!(self.phase, SocialPhase::Start) {
            return Err(GameError::WrongPhase);
        }
        self.recorder.reset();
        self.peer_order = (0..SCENARIOS.len()).collect();
        self.peer_order.shuffle(rng);
        self.phase = SocialPhase::Personal { index: 0 };
        Ok(())
    }

    pub fn answer(&mut self, choice: Choice) -> Result<Option<SocialSummary>, GameError> {
        let (round, index) = match self.phase {
            SocialPhase::Personal { index } => (Round::Personal, index),
            SocialPhase::Peer { index } => (Round::Peer, index),
            _ => return Err(GameError::WrongPhase),
        };
        let scenario = self.current_scenario().ok_or(GameError::WrongPhase)?;
        let major = match round {
            Round::Personal => 0,
            Round::Peer => 1,
        };
        self.recorder
            .record(
                action_key(major, scenario.id as usize),
                SocialAnswer {
                    round,
                    scenario: scenario.id,
                    choice,
                },
            )
            .map_err(|_| GameError::WrongPhase)?;

        let last = index + 1 == SCENARIOS.len();
        self.phase = match (round, last) {
            (Round::Personal, false) => SocialPhase::Personal { index: index + 1 },
            (Round::Personal, true) => SocialPhase::Interstitial,
            (Round::Peer, false) => SocialPhase::Peer { index: index + 1 },
            (Round::Peer, true) => {
                let summary = self
                    .recorder
                    .reduce(SocialSummary::from_answers)
                    .map_err(|_| GameError::WrongPhase)?;
                self.phase = SocialPhase::Finished(summary.clone());
                return Ok(Some(summary));
            }
        };
        Ok(None)
    }

    pub fn begin_peer_round(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, SocialPhase::Interstitial) {
            return Err(GameError::WrongPhase);
        }
        self.phase = SocialPhase::Peer { index: 0 };
        Ok(())
    }
}
