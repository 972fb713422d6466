//! Static lesson, quiz and badge definitions for the learning flow

use crate::core::error::CoreError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const BUILTIN_CURRICULUM: &str = include_str!("../../docs/curriculum.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct Curriculum {
    pub modules: Vec<Module>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    #[serde(default)]
    pub badges: Vec<BadgeRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Module {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "Beginner"),
            Difficulty::Intermediate => write!(f, "Intermediate"),
            Difficulty::Advanced => write!(f, "Advanced"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lesson {
    pub id: u32,
    pub title: String,
    pub duration: String,
    pub difficulty: Difficulty,
    pub xp_reward: u32,
    pub introduction: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub heading: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub body: SectionBody,
}

/// The shape of a lesson section, one variant per kind of content block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    Text,
    Bullets { items: Vec<String> },
    Example { example: String },
    Note { note: String },
    Tip { tip: String },
    ProsCons { pros: Vec<String>, cons: Vec<String> },
    Characteristics { items: Vec<String> },
    Definition {
        #[serde(default)]
        term: Option<String>,
        definition: String,
    },
    Analogy { analogy: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quiz {
    pub module: u32,
    pub title: String,
    /// Minimum score percentage needed to pass.
    pub passing_score: u32,
    pub xp_reward: u32,
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BadgeRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub trigger: BadgeTrigger,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BadgeTrigger {
    LessonsCompleted { count: usize },
    ModuleCompleted { module: u32 },
    QuizzesPassed { count: usize },
}

/// Where the learner goes after finishing a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Lesson { module: u32, lesson: u32 },
    Quiz { module: u32 },
    ModuleDone { module: u32 },
}

impl Curriculum {
    /// The curriculum shipped with the binary.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_yaml(BUILTIN_CURRICULUM)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CoreError> {
        let curriculum: Self = serde_yaml::from_str(yaml)
            .map_err(|e| CoreError::InvalidCurriculum(e.to_string()))?;
        curriculum.validate()?;
        Ok(curriculum)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read curriculum file: {}", path.as_ref().display())
        })?;
        let curriculum = Self::from_yaml(&yaml).with_context(|| {
            format!("Failed to load curriculum: {}", path.as_ref().display())
        })?;
        debug!(
            modules = curriculum.modules.len(),
            "Loaded curriculum from {}",
            path.as_ref().display()
        );
        Ok(curriculum)
    }

    fn validate(&self) -> Result<(), CoreError> {
        let fail = |msg: String| Err(CoreError::InvalidCurriculum(msg));

        if self.modules.is_empty() {
            return fail("no modules defined".to_string());
        }
        for pair in self.modules.windows(2) {
            if pair[1].id <= pair[0].id {
                return fail(format!(
                    "module ids must be unique and ascending, found {} after {}",
                    pair[1].id, pair[0].id
                ));
            }
        }
        for module in &self.modules {
            if module.lessons.is_empty() {
                return fail(format!("module {} has no lessons", module.id));
            }
            let mut seen = HashSet::new();
            for lesson in &module.lessons {
                if !seen.insert(lesson.id) {
                    return fail(format!(
                        "lesson {} is defined twice in module {}",
                        lesson.id, module.id
                    ));
                }
            }
        }
        for quiz in &self.quizzes {
            if self.module(quiz.module).is_err() {
                return fail(format!("quiz '{}' references unknown module {}", quiz.title, quiz.module));
            }
            if quiz.questions.is_empty() {
                return fail(format!("quiz '{}' has no questions", quiz.title));
            }
            if quiz.passing_score > 100 {
                return fail(format!("quiz '{}' passing score exceeds 100", quiz.title));
            }
            for (i, q) in quiz.questions.iter().enumerate() {
                if q.correct_answer >= q.options.len() {
                    return fail(format!(
                        "quiz '{}' question {} has no option {}",
                        quiz.title,
                        i + 1,
                        q.correct_answer
                    ));
                }
            }
        }
        let mut badge_ids = HashSet::new();
        for badge in &self.badges {
            if !badge_ids.insert(badge.id.as_str()) {
                return fail(format!("badge '{}' is defined twice", badge.id));
            }
        }
        Ok(())
    }

    pub fn module(&self, id: u32) -> Result<&Module, CoreError> {
        self.modules
            .iter()
            .find(|m| m.id == id)
            .ok_or(CoreError::UnknownModule(id))
    }

    pub fn lesson(&self, module: u32, lesson: u32) -> Result<&Lesson, CoreError> {
        self.module(module)?
            .lessons
            .iter()
            .find(|l| l.id == lesson)
            .ok_or(CoreError::UnknownLesson { module, lesson })
    }

    pub fn quiz(&self, module: u32) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.module == module)
    }

    pub fn total_lessons(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    pub fn next_step(&self, module: u32, lesson: u32) -> Result<NextStep, CoreError> {
        let lessons = &self.module(module)?.lessons;
        let position = lessons
            .iter()
            .position(|l| l.id == lesson)
            .ok_or(CoreError::UnknownLesson { module, lesson })?;

        Ok(match lessons.get(position + 1) {
            Some(next) => NextStep::Lesson {
                module,
                lesson: next.id,
            },
            None if self.quiz(module).is_some() => NextStep::Quiz { module },
            None => NextStep::ModuleDone { module },
        })
    }
}
