//! Static path definitions: names, guides, sizing and audience copy.

use super::PathId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Audience register the narration is pitched at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Register {
    Kid,
    Teen,
    #[default]
    Adult,
    Family,
}

impl Register {
    pub const ALL: [Register; 4] = [Register::Kid, Register::Teen, Register::Adult, Register::Family];

    pub fn as_str(&self) -> &'static str {
        match self {
            Register::Kid => "kid",
            Register::Teen => "teen",
            Register::Adult => "adult",
            Register::Family => "family",
        }
    }

    fn index(&self) -> usize {
        match self {
            Register::Kid => 0,
            Register::Teen => 1,
            Register::Adult => 2,
            Register::Family => 3,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Register {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown register: {s}"))
    }
}

/// Path copy for one audience register.
#[derive(Debug, Clone, Copy)]
pub struct RegisterCopy {
    pub subtitle: &'static str,
    pub description: &'static str,
    pub tone: &'static str,
}

/// Pre-authored narration used whenever the narrator produces nothing.
#[derive(Debug, Clone, Copy)]
pub struct FallbackText {
    pub intro: &'static str,
    pub scan: &'static str,
    pub convergence: &'static str,
}

/// Immutable, build-time definition of a path.
#[derive(Debug, Clone, Copy)]
pub struct PathDefinition {
    pub id: PathId,
    pub name: &'static str,
    pub subtitle: &'static str,
    pub guide: &'static str,
    pub tone: &'static str,
    pub best_for: &'static str,
    pub description: &'static str,
    /// Convergence floor: scans required before the story may end.
    pub min_artifacts: usize,
    /// Sampler size and the denominator of path progress.
    pub target_artifacts: usize,
    /// Copy per register, indexed kid, teen, adult, family.
    register_copy: [RegisterCopy; 4],
    pub fallback: FallbackText,
}

impl PathDefinition {
    /// Copy for the given audience.
    pub fn copy_for(&self, register: Register) -> &RegisterCopy {
        &self.register_copy[register.index()]
    }
}

/// Look up the definition of a path.
pub fn definition(id: PathId) -> &'static PathDefinition {
    match id {
        PathId::Search => &SEARCH,
        PathId::Trial => &TRIAL,
        PathId::Letters => &LETTERS,
        PathId::Memory => &MEMORY,
        PathId::Awakening => &AWAKENING,
    }
}

static SEARCH: PathDefinition = PathDefinition {
    id: PathId::Search,
    name: "The Search",
    subtitle: "Find the 14 Pieces of Osiris",
    guide: "Isis",
    tone: "Adventure, discovery, wonder",
    best_for: "Families, younger players, first-time visitors",
    description: "Osiris was torn into 14 pieces and scattered across the museum. Scan artifacts to find each fragment.",
    min_artifacts: 7,
    target_artifacts: 14,
    register_copy: [
        RegisterCopy {
            subtitle: "Find the Hidden Treasure Pieces!",
            description: "Osiris needs your help! His magic was shattered into 14 secret pieces hidden in the museum. Scan artifacts and find them all.",
            tone: "Adventure, treasure hunt, teamwork",
        },
        RegisterCopy {
            subtitle: "Piece Together the Mystery",
            description: "Something ancient was broken apart and scattered. 14 fragments, hidden in plain sight. Scan artifacts, decode the pattern, rebuild what was lost.",
            tone: "Mystery, puzzle-solving, discovery",
        },
        RegisterCopy {
            subtitle: "Find the 14 Pieces of Osiris",
            description: "The myth of dismemberment and resurrection comes alive as you trace 14 artifacts through the galleries. Each scan reveals another fragment of the oldest story ever told.",
            tone: "Archaeological discovery, literary depth",
        },
        RegisterCopy {
            subtitle: "A Treasure Hunt for Everyone!",
            description: "Work together to find 14 hidden pieces scattered across the Egyptian Wing. Each artifact you scan reveals part of an ancient mystery.",
            tone: "Cooperative, fun, educational",
        },
    ],
    fallback: FallbackText {
        intro: "I am Isis. My husband Osiris lies scattered across these halls, fourteen pieces hidden among the treasures of his people. Help me find him.",
        scan: "I feel something stir as you hold this close. Not every piece is his, but every piece remembers him. Keep searching.",
        convergence: "The pieces are gathered. Bring them to the Hall of Two Truths, and let Osiris rise once more.",
    },
};

static TRIAL: PathDefinition = PathDefinition {
    id: PathId::Trial,
    name: "The Trial",
    subtitle: "Judge the Contendings of Horus and Set",
    guide: "Thoth",
    tone: "Moral complexity, critical thinking, drama",
    best_for: "Teens, adults, narrative lovers",
    description: "The trial of Horus and Set has reopened. You are the judge. Scan artifacts to hear testimony and deliver your verdict.",
    min_artifacts: 5,
    target_artifacts: 10,
    register_copy: [
        RegisterCopy {
            subtitle: "Be the Judge!",
            description: "Two powerful gods are fighting and you get to decide who wins! Scan artifacts to collect clues and hear both sides.",
            tone: "Exciting, fair play, detective",
        },
        RegisterCopy {
            subtitle: "Nothing Is What It Seems",
            description: "The gods' trial has been rigged for millennia. Gather evidence, question witnesses, expose the truth.",
            tone: "Conspiracy, moral ambiguity, edge",
        },
        RegisterCopy {
            subtitle: "Judge the Contendings of Horus and Set",
            description: "A mythological trial eighty years in the making reopens. Weigh testimony from gods, examine artifacts as evidence, and render a verdict.",
            tone: "Moral complexity, critical thinking, drama",
        },
        RegisterCopy {
            subtitle: "A Mystery to Solve Together!",
            description: "Two gods need your family to settle their argument. Gather evidence together and vote on the verdict.",
            tone: "Collaborative, debate, family decision",
        },
    ],
    fallback: FallbackText {
        intro: "I am Thoth, keeper of the record. The case of Horus against Set is opened again, and you shall sit in judgment.",
        scan: "Let the record show this object. Every piece of evidence leans toward one god or the other. Weigh it carefully.",
        convergence: "The evidence is gathered. The Ennead awaits your verdict in the Hall of Two Truths.",
    },
};

static LETTERS: PathDefinition = PathDefinition {
    id: PathId::Letters,
    name: "The Letters",
    subtitle: "Free a Scribe's Soul",
    guide: "Kha",
    tone: "Intimate, emotional, literary",
    best_for: "Adults, readers, story lovers",
    description: "A scribe named Kha died 3,000 years ago and is trapped in the underworld. Find his possessions to free his soul.",
    min_artifacts: 5,
    target_artifacts: 10,
    register_copy: [
        RegisterCopy {
            subtitle: "Help a Friendly Ghost!",
            description: "A ghost named Kha is stuck and needs your help! Find his lost things hidden in the museum so he can finally go home.",
            tone: "Spooky-fun, helpful, letters",
        },
        RegisterCopy {
            subtitle: "A Dead Man Is Writing to You",
            description: "Kha died 3,000 years ago. He shouldn't be able to write, but his letters keep appearing. Find what he lost before silence takes him.",
            tone: "Haunting, personal, urgent",
        },
        RegisterCopy {
            subtitle: "Free a Scribe's Soul",
            description: "The scribe Kha failed his weighing of the heart. Through letters from the underworld he guides you to his scattered possessions.",
            tone: "Intimate, emotional, literary",
        },
        RegisterCopy {
            subtitle: "Letters from the Past!",
            description: "A friendly ancient scribe is sending letters with clues about his lost belongings. Work together to set his spirit free.",
            tone: "Cooperative, story-driven, warm",
        },
    ],
    fallback: FallbackText {
        intro: "To whoever finds this letter: my name is Kha, scribe of the Place of Truth. My heart was weighed and found wanting. Please, find what I left behind.",
        scan: "You found it. I remember the weight of it in my hands. There is more of me out there. Keep looking.",
        convergence: "My possessions are gathered. Speak for my heart at the scales, friend. I have no one else.",
    },
};

static MEMORY: PathDefinition = PathDefinition {
    id: PathId::Memory,
    name: "The Memory",
    subtitle: "See Through Time",
    guide: "Thoth",
    tone: "Awe, beauty, time-travel wonder",
    best_for: "Visual learners, all ages",
    description: "Thoth grants you divine sight. Scan any artifact to see it as it was 3,000 years ago: vivid, alive, and whole.",
    min_artifacts: 5,
    target_artifacts: 10,
    register_copy: [
        RegisterCopy {
            subtitle: "Magic Time-Travel Vision!",
            description: "You've been given magic eyes! Point your phone at any old artifact and see what it looked like when it was brand new.",
            tone: "Wonder, magic, time travel",
        },
        RegisterCopy {
            subtitle: "See What No One Else Can",
            description: "Every artifact hides a memory. Scan it and the veil lifts. What was broken becomes whole. What was silent speaks.",
            tone: "Surreal, powerful, unique",
        },
        RegisterCopy {
            subtitle: "See Through Time",
            description: "Each artifact you scan reveals its original context: the temple it adorned, the ceremony it witnessed, the hands that made it.",
            tone: "Awe, beauty, time-travel wonder",
        },
        RegisterCopy {
            subtitle: "Travel Back in Time Together!",
            description: "Your whole family gets time-travel vision! Scan artifacts together and watch ancient Egypt come alive.",
            tone: "Shared wonder, visual, educational",
        },
    ],
    fallback: FallbackText {
        intro: "I am Thoth. I lend you my sight. Look upon these objects and see them as they were, before the centuries took their color.",
        scan: "The dust falls away and the colors return. For a moment this object is new again, held by hands long gone.",
        convergence: "The visions are many, but they are one story. Come, and see how they connect.",
    },
};

static AWAKENING: PathDefinition = PathDefinition {
    id: PathId::Awakening,
    name: "The Awakening",
    subtitle: "Talk to the Artifacts",
    guide: "Various characters",
    tone: "Conversational, surprising, relationship-driven",
    best_for: "Social players, curious minds",
    description: "Every artifact has a voice: gods, craftsmen, priestesses, soldiers. They remember you and give you quests.",
    min_artifacts: 5,
    target_artifacts: 10,
    register_copy: [
        RegisterCopy {
            subtitle: "Make Friends with Ancient Things!",
            description: "The artifacts are alive and want to be your friend! Each one has a personality, a story, and a quest just for you.",
            tone: "Friendly, fun, social",
        },
        RegisterCopy {
            subtitle: "They've Been Waiting to Talk",
            description: "Every artifact remembers being alive. Scan them and they'll speak, with opinions, grudges, and secrets.",
            tone: "Surprising, witty, character-driven",
        },
        RegisterCopy {
            subtitle: "Talk to the Artifacts",
            description: "Every artifact has a voice and a story. They remember you between scans, give quests, and have conflicts only you can resolve.",
            tone: "Conversational, surprising, relationship-driven",
        },
        RegisterCopy {
            subtitle: "The Museum Is Alive!",
            description: "Tonight the artifacts can talk! Meet ancient characters together, each with quests for your whole family.",
            tone: "Social, inclusive, character-driven",
        },
    ],
    fallback: FallbackText {
        intro: "The galleries are waking. Voices stir behind the glass. Someone has been waiting a very long time to talk to you.",
        scan: "Ah, a visitor! It has been centuries since anyone listened. Stay a moment. I have a story, and a favor to ask.",
        convergence: "Everyone you met is gathering in the Hall. They have been waiting to meet each other, too.",
    },
};
