use super::ui;
use crate::core::config::AppConfig;
use crate::core::curriculum::Curriculum;
use crate::core::progress::{LearnerProgress, ProgressEngine, ProgressUpdate};
use crate::store::ProgressStore;
use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use tracing::debug;

/// The built-in curriculum, or the one configured in its place.
pub fn load_curriculum(config: &AppConfig) -> Result<Curriculum> {
    match &config.learning.curriculum_path {
        Some(path) => Curriculum::load_from_path(path),
        None => Curriculum::builtin().context("Built-in curriculum is invalid"),
    }
}

/// Stored progress for the configured profile, or a fresh learner.
pub fn load_progress(config: &AppConfig, store: &dyn ProgressStore) -> Result<LearnerProgress> {
    let profile = &config.learning.profile;
    let progress = store
        .load(profile)
        .with_context(|| format!("Failed to load progress for {profile}"))?;
    Ok(progress.unwrap_or_else(|| {
        debug!(profile = %profile, "Starting a new learner");
        LearnerProgress::new(config.learning.initial_xp_to_next_level)
    }))
}

pub fn save_progress(
    config: &AppConfig,
    store: &dyn ProgressStore,
    progress: &LearnerProgress,
) -> Result<()> {
    store
        .save(&config.learning.profile, progress)
        .with_context(|| format!("Failed to save progress for {}", config.learning.profile))
}

/// One line per XP award, level-up and badge from an update.
pub fn describe_update(curriculum: &Curriculum, update: &ProgressUpdate) -> String {
    let mut lines = vec![ui::style_text(
        &format!("+{} XP", update.xp_awarded),
        ui::StyleType::Success,
    )];
    if update.levels_gained > 0 {
        lines.push(ui::style_text(
            &format!("Level up! (+{})", update.levels_gained),
            ui::StyleType::TotalValue,
        ));
    }
    for id in &update.new_badges {
        let name = curriculum
            .badges
            .iter()
            .find(|b| &b.id == id)
            .map_or(id.clone(), |b| format!("{} {}", b.icon, b.name));
        lines.push(format!("Badge earned: {name}"));
    }
    lines.join("\n")
}

impl ProgressEngine<'_> {
    pub fn display_dashboard(&self) -> String {
        let progress = self.progress();
        let curriculum = self.curriculum();

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Learning Dashboard", ui::StyleType::Title)
        );
        output.push_str(&format!(
            "Level {}  {} {}/{} XP\n",
            progress.level(),
            ui::text_bar(
                f64::from(progress.xp()),
                f64::from(progress.xp_to_next_level()),
                20
            ),
            progress.xp(),
            progress.xp_to_next_level()
        ));
        output.push_str(&format!("Streak: {} day(s)\n", progress.streak()));
        output.push_str(&format!(
            "Overall: {:.0}% of lessons complete\n",
            self.overall_percentage()
        ));

        let badges: Vec<String> = curriculum
            .badges
            .iter()
            .filter(|b| progress.badges().contains(&b.id))
            .map(|b| format!("{} {}", b.icon, b.name))
            .collect();
        output.push_str(&format!(
            "Badges: {}\n\n",
            if badges.is_empty() {
                ui::style_text("none yet", ui::StyleType::Subtle)
            } else {
                badges.join(", ")
            }
        ));

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Module"),
            ui::header_cell("Lessons"),
            ui::header_cell("Quiz"),
            ui::header_cell("Status"),
        ]);
        for module in &curriculum.modules {
            let (completed, total) = self.module_progress(module.id).unwrap_or((0, 0));
            let quiz = if progress.passed_quizzes().contains(&module.id) {
                Cell::new("Passed").fg(Color::Green)
            } else {
                Cell::new("-").fg(Color::DarkGrey)
            };
            let status = if self.is_unlocked(module.id) {
                Cell::new("Unlocked").fg(Color::Green)
            } else {
                Cell::new("Locked").fg(Color::DarkGrey)
            };
            table.add_row(vec![
                Cell::new(module.id),
                Cell::new(&module.title),
                Cell::new(format!("{completed}/{total}")),
                quiz,
                status,
            ]);
        }
        output.push_str(&table.to_string());
        output
    }
}

pub fn run(config: &AppConfig, store: &dyn ProgressStore) -> Result<()> {
    let curriculum = load_curriculum(config)?;
    let progress = load_progress(config, store)?;
    let engine = ProgressEngine::new(progress, &curriculum, config.learning.xp_curve);
    println!("{}", engine.display_dashboard());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryProgressStore;

    #[test]
    fn test_new_learner_dashboard() -> Result<()> {
        console::set_colors_enabled(false);
        let config = AppConfig::default();
        let store = MemoryProgressStore::new();
        let curriculum = load_curriculum(&config)?;
        let progress = load_progress(&config, &store)?;
        assert_eq!(progress.xp_to_next_level(), 500);

        let engine = ProgressEngine::new(progress, &curriculum, config.learning.xp_curve);
        let text = engine.display_dashboard();
        assert!(text.contains("Level 1"));
        assert!(text.contains("0/500 XP"));
        assert!(text.contains("none yet"));
        assert!(text.contains("Stock Market Basics"));
        assert!(text.contains("Locked"));
        Ok(())
    }

    #[test]
    fn test_dashboard_after_progress() -> Result<()> {
        console::set_colors_enabled(false);
        let config = AppConfig::default();
        let store = MemoryProgressStore::new();
        let curriculum = load_curriculum(&config)?;

        let mut engine =
            ProgressEngine::new(load_progress(&config, &store)?, &curriculum, config.learning.xp_curve);
        let update = engine.complete_lesson(1, 1, 50)?;
        assert!(describe_update(&curriculum, &update).contains("First Steps"));
        save_progress(&config, &store, engine.progress())?;

        let reloaded = load_progress(&config, &store)?;
        assert_eq!(reloaded.xp(), 50);
        let engine = ProgressEngine::new(reloaded, &curriculum, config.learning.xp_curve);
        let text = engine.display_dashboard();
        assert!(text.contains("1/5"));
        assert!(text.contains("First Steps"));
        Ok(())
    }

    #[test]
    fn test_custom_curriculum_path_missing() {
        let mut config = AppConfig::default();
        config.learning.curriculum_path = Some("/nonexistent/curriculum.yaml".to_string());
        assert!(load_curriculum(&config).is_err());
    }
}
