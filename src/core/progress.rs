//! Learner progress: XP, levels, streaks, completed lessons and badges.
//!
//! [`LearnerProgress`] is plain state that can be persisted; every
//! mutation goes through [`ProgressEngine`], which owns the state for the
//! duration of an interaction and applies the level-up, unlock and badge
//! rules.
use crate::core::curriculum::{BadgeTrigger, Curriculum};
use crate::core::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

pub const DEFAULT_XP_TO_NEXT_LEVEL: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LessonKey {
    pub module: u32,
    pub lesson: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredProgress")]
pub struct LearnerProgress {
    level: u32,
    xp: u32,
    xp_to_next_level: u32,
    streak: u32,
    #[serde(default)]
    last_active: Option<NaiveDate>,
    #[serde(default)]
    completed_lessons: BTreeSet<LessonKey>,
    #[serde(default)]
    passed_quizzes: BTreeSet<u32>,
    #[serde(default)]
    badges: BTreeSet<String>,
}

impl LearnerProgress {
    pub fn new(initial_xp_to_next_level: u32) -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: initial_xp_to_next_level.max(1),
            streak: 0,
            last_active: None,
            completed_lessons: BTreeSet::new(),
            passed_quizzes: BTreeSet::new(),
            badges: BTreeSet::new(),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    pub fn xp_to_next_level(&self) -> u32 {
        self.xp_to_next_level
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn completed_lessons(&self) -> &BTreeSet<LessonKey> {
        &self.completed_lessons
    }

    pub fn passed_quizzes(&self) -> &BTreeSet<u32> {
        &self.passed_quizzes
    }

    pub fn badges(&self) -> &BTreeSet<String> {
        &self.badges
    }

    pub fn is_lesson_completed(&self, module: u32, lesson: u32) -> bool {
        self.completed_lessons.contains(&LessonKey { module, lesson })
    }
}

/// Shape of a persisted [`LearnerProgress`] before its invariants are checked.
#[derive(Deserialize)]
struct StoredProgress {
    level: u32,
    xp: u32,
    xp_to_next_level: u32,
    streak: u32,
    #[serde(default)]
    last_active: Option<NaiveDate>,
    #[serde(default)]
    completed_lessons: BTreeSet<LessonKey>,
    #[serde(default)]
    passed_quizzes: BTreeSet<u32>,
    #[serde(default)]
    badges: BTreeSet<String>,
}

impl TryFrom<StoredProgress> for LearnerProgress {
    type Error = CoreError;

    fn try_from(stored: StoredProgress) -> Result<Self, Self::Error> {
        if stored.level == 0 {
            return Err(CoreError::InvalidProgress("level must be at least 1".to_string()));
        }
        if stored.xp_to_next_level == 0 {
            return Err(CoreError::InvalidProgress(
                "xp_to_next_level must be positive".to_string(),
            ));
        }
        Ok(Self {
            level: stored.level,
            xp: stored.xp,
            xp_to_next_level: stored.xp_to_next_level,
            streak: stored.streak,
            last_active: stored.last_active,
            completed_lessons: stored.completed_lessons,
            passed_quizzes: stored.passed_quizzes,
            badges: stored.badges,
        })
    }
}

impl Default for LearnerProgress {
    fn default() -> Self {
        Self::new(DEFAULT_XP_TO_NEXT_LEVEL)
    }
}

/// How the XP needed for the next level grows after each level-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum XpCurve {
    #[default]
    Constant,
    Linear {
        step: u32,
    },
    Geometric {
        factor: f64,
    },
}

impl XpCurve {
    /// Threshold for the level after one requiring `current`. Never below 1.
    pub fn next_threshold(&self, current: u32) -> u32 {
        let next = match *self {
            XpCurve::Constant => current,
            XpCurve::Linear { step } => current.saturating_add(step),
            XpCurve::Geometric { factor } => {
                let scaled = (f64::from(current) * factor).round();
                if scaled.is_finite() && scaled > 0.0 {
                    scaled.min(f64::from(u32::MAX)) as u32
                } else {
                    1
                }
            }
        };
        next.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Completed,
    /// Repeat completion; membership and XP are unchanged.
    AlreadyCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub status: CompletionStatus,
    pub xp_awarded: u32,
    pub levels_gained: u32,
    pub new_badges: Vec<String>,
}

impl ProgressUpdate {
    fn unchanged() -> Self {
        Self {
            status: CompletionStatus::AlreadyCompleted,
            xp_awarded: 0,
            levels_gained: 0,
            new_badges: Vec::new(),
        }
    }
}

pub struct ProgressEngine<'c> {
    progress: LearnerProgress,
    curriculum: &'c Curriculum,
    curve: XpCurve,
}

impl<'c> ProgressEngine<'c> {
    pub fn new(progress: LearnerProgress, curriculum: &'c Curriculum, curve: XpCurve) -> Self {
        Self {
            progress,
            curriculum,
            curve,
        }
    }

    pub fn progress(&self) -> &LearnerProgress {
        &self.progress
    }

    pub fn into_progress(self) -> LearnerProgress {
        self.progress
    }

    pub fn curriculum(&self) -> &'c Curriculum {
        self.curriculum
    }

    /// Marks a lesson complete. A repeat completion awards nothing and
    /// reports [`CompletionStatus::AlreadyCompleted`].
    pub fn complete_lesson(
        &mut self,
        module: u32,
        lesson: u32,
        xp_reward: u32,
    ) -> Result<ProgressUpdate, CoreError> {
        self.curriculum.lesson(module, lesson)?;

        if !self
            .progress
            .completed_lessons
            .insert(LessonKey { module, lesson })
        {
            debug!(module, lesson, "Lesson already completed");
            return Ok(ProgressUpdate::unchanged());
        }

        let levels_gained = self.award_xp(xp_reward);
        let new_badges = self.evaluate_badges();
        debug!(module, lesson, xp_reward, levels_gained, "Lesson completed");

        Ok(ProgressUpdate {
            status: CompletionStatus::Completed,
            xp_awarded: xp_reward,
            levels_gained,
            new_badges,
        })
    }

    /// Credits a passed quiz session. Each passing session earns its XP;
    /// the status tells whether this module's quiz was passed before.
    pub fn record_quiz_pass(
        &mut self,
        module: u32,
        xp_reward: u32,
    ) -> Result<ProgressUpdate, CoreError> {
        self.curriculum.module(module)?;

        let status = if self.progress.passed_quizzes.insert(module) {
            CompletionStatus::Completed
        } else {
            CompletionStatus::AlreadyCompleted
        };
        let levels_gained = self.award_xp(xp_reward);
        let new_badges = self.evaluate_badges();
        debug!(module, xp_reward, levels_gained, "Quiz passed");

        Ok(ProgressUpdate {
            status,
            xp_awarded: xp_reward,
            levels_gained,
            new_badges,
        })
    }

    /// Updates the daily streak for activity on `today`.
    pub fn record_activity(&mut self, today: NaiveDate) -> u32 {
        let progress = &mut self.progress;
        progress.streak = match progress.last_active {
            Some(last) if last == today => progress.streak.max(1),
            Some(last) if last.succ_opt() == Some(today) => progress.streak + 1,
            _ => 1,
        };
        progress.last_active = Some(today);
        progress.streak
    }

    /// A module is unlocked when every lesson of every earlier module is
    /// complete. The first module is always unlocked.
    pub fn is_unlocked(&self, module: u32) -> bool {
        if self.curriculum.module(module).is_err() {
            return false;
        }
        self.curriculum
            .modules
            .iter()
            .take_while(|m| m.id < module)
            .all(|m| self.is_module_completed(m.id))
    }

    pub fn unlocked_modules(&self) -> Vec<u32> {
        self.curriculum
            .modules
            .iter()
            .map(|m| m.id)
            .filter(|id| self.is_unlocked(*id))
            .collect()
    }

    /// Completed and total lesson counts for a module.
    pub fn module_progress(&self, module: u32) -> Result<(usize, usize), CoreError> {
        let lessons = &self.curriculum.module(module)?.lessons;
        let completed = lessons
            .iter()
            .filter(|l| self.progress.is_lesson_completed(module, l.id))
            .count();
        Ok((completed, lessons.len()))
    }

    pub fn overall_percentage(&self) -> f64 {
        let total = self.curriculum.total_lessons();
        if total == 0 {
            return 0.0;
        }
        let completed = self
            .curriculum
            .modules
            .iter()
            .flat_map(|m| m.lessons.iter().map(move |l| (m.id, l.id)))
            .filter(|(m, l)| self.progress.is_lesson_completed(*m, *l))
            .count();
        completed as f64 / total as f64 * 100.0
    }

    fn is_module_completed(&self, module: u32) -> bool {
        self.curriculum.module(module).is_ok_and(|m| {
            m.lessons
                .iter()
                .all(|l| self.progress.is_lesson_completed(module, l.id))
        })
    }

    fn award_xp(&mut self, xp: u32) -> u32 {
        let progress = &mut self.progress;
        progress.xp = progress.xp.saturating_add(xp);

        let mut levels_gained = 0;
        while progress.xp >= progress.xp_to_next_level {
            progress.xp -= progress.xp_to_next_level;
            progress.level += 1;
            progress.xp_to_next_level = self.curve.next_threshold(progress.xp_to_next_level);
            levels_gained += 1;
        }
        if levels_gained > 0 {
            debug!(level = progress.level, "Level up");
        }
        levels_gained
    }

    fn evaluate_badges(&mut self) -> Vec<String> {
        let earned: Vec<String> = self
            .curriculum
            .badges
            .iter()
            .filter(|rule| !self.progress.badges.contains(&rule.id))
            .filter(|rule| match &rule.trigger {
                BadgeTrigger::LessonsCompleted { count } => {
                    self.progress.completed_lessons.len() >= *count
                }
                BadgeTrigger::ModuleCompleted { module } => self.is_module_completed(*module),
                BadgeTrigger::QuizzesPassed { count } => {
                    self.progress.passed_quizzes.len() >= *count
                }
            })
            .map(|rule| rule.id.clone())
            .collect();

        for id in &earned {
            debug!(badge = %id, "Badge earned");
            self.progress.badges.insert(id.clone());
        }
        earned
    }
}
