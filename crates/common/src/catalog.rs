//! Static mission catalog
//!
//! Levels form a linear unlock chain in the order they appear in [`LEVELS`].

use crate::models::{Difficulty, Level, Question, QuestionOption, Scenario};

pub static LEVELS: &[Level] = &[
    Level {
        id: "level-0",
        name: "Downing a Rogue Jet",
        description: "Intercept and neutralize a hostile aircraft violating protected airspace using cyber warfare techniques.",
        difficulty: Difficulty::Easy,
        unlock_rank: 0,
        image: "https://images.unsplash.com/photo-1543642178-7e34d5cccde5?q=80&w=1000",
    },
    Level {
        id: "level-1",
        name: "Overwhelming the Air Defense Grid",
        description: "Develop and execute strategies to overwhelm and bypass a layered surface-to-air defense network.",
        difficulty: Difficulty::Medium,
        unlock_rank: 1,
        image: "https://images.unsplash.com/photo-1595264969333-9a885e2e8513?q=80&w=1000",
    },
    Level {
        id: "level-2",
        name: "Shutting Down the Command Center",
        description: "Infiltrate and temporarily disable an enemy air command center using advanced cyber techniques.",
        difficulty: Difficulty::Hard,
        unlock_rank: 2,
        image: "https://images.unsplash.com/photo-1507712522505-a54be26995b2?q=80&w=1000",
    },
];

static SCENARIOS: &[Scenario] = &[
    Scenario {
        id: "scenario-0",
        level_id: "level-0",
        title: "Air Defense Alert",
        description: "Intelligence reports a hostile jet has entered protected airspace on a reconnaissance mission. As the cyber warfare specialist, intercept and neutralize the threat using digital means rather than conventional weapons.",
        time_limit_seconds: 300,
        questions: &[
            Question {
                id: "q1-l0",
                text: "The jet is using an advanced communication system. What's your first action?",
                options: &[
                    QuestionOption {
                        id: "q1-l0-opt1",
                        text: "Jam all radio frequencies in the area",
                        consequence: Some("This alerts the pilot and they take evasive action"),
                    },
                    QuestionOption {
                        id: "q1-l0-opt2",
                        text: "Analyze the communication protocols to find vulnerabilities",
                        consequence: Some("Gives you valuable intel but takes precious time"),
                    },
                    QuestionOption {
                        id: "q1-l0-opt3",
                        text: "Deploy signal spoofing to send false coordinates",
                        consequence: Some("You might redirect the jet to a safe interception zone"),
                    },
                    QuestionOption {
                        id: "q1-l0-opt4",
                        text: "Hack into the jet's onboard systems directly",
                        consequence: Some("Risky but could give complete control if successful"),
                    },
                ],
                correct_option_id: "q1-l0-opt3",
                explanation: "Signal spoofing immediately affects the jet's navigation without alerting the pilot to your presence, buying time to prepare further actions.",
            },
            Question {
                id: "q2-l0",
                text: "The pilot has detected something unusual. What's your next step?",
                options: &[
                    QuestionOption {
                        id: "q2-l0-opt1",
                        text: "Increase the intensity of your signal spoofing",
                        consequence: Some("This might raise suspicions further"),
                    },
                    QuestionOption {
                        id: "q2-l0-opt2",
                        text: "Switch to mimicking legitimate air control communications",
                        consequence: Some("This could convince the pilot everything is normal"),
                    },
                    QuestionOption {
                        id: "q2-l0-opt3",
                        text: "Deploy electronic countermeasures to disable the jet's electronics",
                        consequence: Some("Aggressive but effective if successful"),
                    },
                    QuestionOption {
                        id: "q2-l0-opt4",
                        text: "Retreat and alert conventional air defenses",
                        consequence: Some("Safe but mission failure"),
                    },
                ],
                correct_option_id: "q2-l0-opt2",
                explanation: "Mimicking legitimate communications keeps the operation covert while continuing to steer the situation, and is less likely to provoke an aggressive response.",
            },
        ],
    },
    Scenario {
        id: "scenario-1",
        level_id: "level-1",
        title: "Grid Saturation",
        description: "A layered air defense network protects the target corridor. Blind, confuse and overload its radars so friendly assets can pass.",
        time_limit_seconds: 360,
        questions: &[
            Question {
                id: "q1-l1",
                text: "The network's search radars share tracks over a datalink. Where do you start?",
                options: &[
                    QuestionOption {
                        id: "q1-l1-opt1",
                        text: "Flood the datalink with malformed packets",
                        consequence: Some("Operators fall back to voice coordination"),
                    },
                    QuestionOption {
                        id: "q1-l1-opt2",
                        text: "Inject phantom tracks into the shared picture",
                        consequence: Some("Interceptors are tasked against ghosts"),
                    },
                    QuestionOption {
                        id: "q1-l1-opt3",
                        text: "Cut power to the nearest radar site",
                        consequence: None,
                    },
                ],
                correct_option_id: "q1-l1-opt2",
                explanation: "Phantom tracks consume interceptors and operator attention without revealing that the link itself is compromised.",
            },
            Question {
                id: "q2-l1",
                text: "The operators start filtering suspicious tracks. How do you respond?",
                options: &[
                    QuestionOption {
                        id: "q2-l1-opt1",
                        text: "Stop injecting and wait",
                        consequence: Some("The picture clears and the corridor closes"),
                    },
                    QuestionOption {
                        id: "q2-l1-opt2",
                        text: "Make phantom tracks mirror real flight profiles",
                        consequence: Some("The filters can no longer tell them apart"),
                    },
                    QuestionOption {
                        id: "q2-l1-opt3",
                        text: "Switch to broadband jamming",
                        consequence: Some("The jamming source is quickly triangulated"),
                    },
                ],
                correct_option_id: "q2-l1-opt2",
                explanation: "Realistic profiles defeat heuristic filtering and keep the saturation effect alive.",
            },
            Question {
                id: "q3-l1",
                text: "Friendly aircraft approach the corridor. What is the final move?",
                options: &[
                    QuestionOption {
                        id: "q3-l1-opt1",
                        text: "Trigger a mass track dump across all sectors",
                        consequence: Some("The grid is overwhelmed at the decisive moment"),
                    },
                    QuestionOption {
                        id: "q3-l1-opt2",
                        text: "Announce the intrusion to sow panic",
                        consequence: Some("Operators isolate the datalink"),
                    },
                    QuestionOption {
                        id: "q3-l1-opt3",
                        text: "Hand over to conventional strike assets",
                        consequence: None,
                    },
                ],
                correct_option_id: "q3-l1-opt1",
                explanation: "Timing the saturation to the friendly transit maximises the window while minimising the time defenders have to adapt.",
            },
        ],
    },
    Scenario {
        id: "scenario-2",
        level_id: "level-2",
        title: "Lights Out",
        description: "The enemy air command center coordinates every sortie in the theatre. Get inside, stay hidden, and take it offline at the right moment.",
        time_limit_seconds: 420,
        questions: &[
            Question {
                id: "q1-l2",
                text: "How do you gain the initial foothold?",
                options: &[
                    QuestionOption {
                        id: "q1-l2-opt1",
                        text: "Spear-phish a maintenance contractor",
                        consequence: Some("A low-privilege account opens the door"),
                    },
                    QuestionOption {
                        id: "q1-l2-opt2",
                        text: "Brute-force the external VPN",
                        consequence: Some("The lockouts trigger an investigation"),
                    },
                    QuestionOption {
                        id: "q1-l2-opt3",
                        text: "Scan the perimeter aggressively",
                        consequence: Some("Intrusion detection lights up"),
                    },
                ],
                correct_option_id: "q1-l2-opt1",
                explanation: "Third-party contractors are often the least defended path into a hardened network.",
            },
            Question {
                id: "q2-l2",
                text: "You are inside with limited rights. What next?",
                options: &[
                    QuestionOption {
                        id: "q2-l2-opt1",
                        text: "Deploy ransomware immediately",
                        consequence: Some("Backups restore operations within hours"),
                    },
                    QuestionOption {
                        id: "q2-l2-opt2",
                        text: "Harvest credentials and move laterally",
                        consequence: Some("You reach the mission planning servers"),
                    },
                    QuestionOption {
                        id: "q2-l2-opt3",
                        text: "Exfiltrate everything you can reach",
                        consequence: Some("The traffic spike is noticed"),
                    },
                ],
                correct_option_id: "q2-l2-opt2",
                explanation: "Quiet lateral movement builds the access needed for a decisive effect instead of spending it early.",
            },
            Question {
                id: "q3-l2",
                text: "You control the planning servers. When do you strike?",
                options: &[
                    QuestionOption {
                        id: "q3-l2-opt1",
                        text: "Right away, before you are discovered",
                        consequence: Some("The outage hits during a quiet period"),
                    },
                    QuestionOption {
                        id: "q3-l2-opt2",
                        text: "During the next large sortie generation",
                        consequence: Some("Coordination collapses when it matters most"),
                    },
                    QuestionOption {
                        id: "q3-l2-opt3",
                        text: "Never, keep collecting intelligence",
                        consequence: None,
                    },
                ],
                correct_option_id: "q3-l2-opt2",
                explanation: "Disruption is worth most when the adversary depends on the system the most.",
            },
        ],
    },
];

/// All levels in unlock-chain order
pub fn levels() -> &'static [Level] {
    LEVELS
}

pub fn level(level_id: &str) -> Option<&'static Level> {
    LEVELS.iter().find(|l| l.id == level_id)
}

pub fn scenario_for(level_id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.level_id == level_id)
}

/// Position of the level in the unlock chain
pub fn chain_index(level_id: &str) -> Option<usize> {
    LEVELS.iter().position(|l| l.id == level_id)
}

/// Ids of all levels in chain order
pub fn chain() -> Vec<&'static str> {
    LEVELS.iter().map(|l| l.id).collect()
}

/// Check the catalog for dangling references and duplicate ids
pub fn validate() -> Result<(), String> {
    let mut seen_levels = std::collections::HashSet::new();
    for level in LEVELS {
        if !seen_levels.insert(level.id) {
            return Err(format!("duplicate level id {}", level.id));
        }
        if scenario_for(level.id).is_none() {
            return Err(format!("level {} has no scenario", level.id));
        }
    }

    for scenario in SCENARIOS {
        if level(scenario.level_id).is_none() {
            return Err(format!(
                "scenario {} references unknown level {}",
                scenario.id, scenario.level_id
            ));
        }
        if scenario.questions.is_empty() {
            return Err(format!("scenario {} has no questions", scenario.id));
        }

        let mut seen_questions = std::collections::HashSet::new();
        for question in scenario.questions {
            if !seen_questions.insert(question.id) {
                return Err(format!("duplicate question id {}", question.id));
            }
            let mut seen_options = std::collections::HashSet::new();
            for option in question.options {
                if !seen_options.insert(option.id) {
                    return Err(format!("duplicate option id {}", option.id));
                }
            }
            if question.option(question.correct_option_id).is_none() {
                return Err(format!(
                    "question {} has no option {}",
                    question.id, question.correct_option_id
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_consistent() {
        assert_eq!(validate(), Ok(()));
    }

    #[test]
    fn test_every_level_has_a_scenario() {
        for level in levels() {
            let scenario = scenario_for(level.id).unwrap();
            assert_eq!(scenario.level_id, level.id);
        }
    }

    #[test]
    fn test_first_level_has_rank_zero() {
        assert_eq!(levels()[0].id, "level-0");
        assert_eq!(levels()[0].unlock_rank, 0);
    }

    #[test]
    fn test_difficulty_increases_along_chain() {
        let difficulties: Vec<_> = levels().iter().map(|l| l.difficulty).collect();
        let mut sorted = difficulties.clone();
        sorted.sort();
        assert_eq!(difficulties, sorted);
    }

    #[test]
    fn test_chain_index() {
        assert_eq!(chain_index("level-0"), Some(0));
        assert_eq!(chain_index("level-2"), Some(2));
        assert_eq!(chain_index("level-99"), None);
    }

    #[test]
    fn test_question_time_limit_splits_budget() {
        let scenario = scenario_for("level-0").unwrap();
        assert_eq!(scenario.question_time_limit(), 150);
        let scenario = scenario_for("level-1").unwrap();
        assert_eq!(scenario.question_time_limit(), 120);
    }
}
