use super::learn::{describe_update, load_curriculum, load_progress, save_progress};
use super::ui;
use crate::core::config::AppConfig;
use crate::core::curriculum::{Lesson, NextStep, SectionBody};
use crate::core::progress::{CompletionStatus, ProgressEngine, ProgressUpdate};
use crate::store::ProgressStore;
use anyhow::{Result, bail};
use chrono::NaiveDate;

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  • {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Lesson {
    pub fn display(&self) -> String {
        let mut output = format!(
            "{}\n{}\n\n{}",
            ui::style_text(&self.title, ui::StyleType::Title),
            ui::style_text(
                &format!("{} · {} · {} XP", self.duration, self.difficulty, self.xp_reward),
                ui::StyleType::Subtle
            ),
            self.introduction
        );

        for section in &self.sections {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(&section.heading, ui::StyleType::TotalLabel)
            ));
            if let Some(text) = &section.text {
                output.push_str(&format!("\n{text}"));
            }
            let body = match &section.body {
                SectionBody::Text => None,
                SectionBody::Bullets { items } | SectionBody::Characteristics { items } => {
                    Some(bullet_list(items))
                }
                SectionBody::Example { example } => Some(format!("Example: {example}")),
                SectionBody::Note { note } => Some(format!("Note: {note}")),
                SectionBody::Tip { tip } => Some(format!("Tip: {tip}")),
                SectionBody::ProsCons { pros, cons } => Some(format!(
                    "Pros:\n{}\nCons:\n{}",
                    bullet_list(pros),
                    bullet_list(cons)
                )),
                SectionBody::Definition { term, definition } => Some(match term {
                    Some(term) => format!("{term}: {definition}"),
                    None => definition.clone(),
                }),
                SectionBody::Analogy { analogy } => Some(format!("Think of it this way: {analogy}")),
            };
            if let Some(body) = body {
                output.push_str(&format!("\n{body}"));
            }
        }
        output
    }
}

fn describe_next_step(step: NextStep) -> String {
    match step {
        NextStep::Lesson { module, lesson } => {
            format!("Next: stockcast lesson {module} {lesson}")
        }
        NextStep::Quiz { module } => format!("Next: test yourself with stockcast quiz {module}"),
        NextStep::ModuleDone { module } => format!("Module {module} complete"),
    }
}

/// Shows a lesson and marks it complete. Lessons of locked modules are
/// refused.
pub fn complete(
    engine: &mut ProgressEngine<'_>,
    module: u32,
    lesson: u32,
    today: NaiveDate,
) -> Result<(String, ProgressUpdate)> {
    if !engine.is_unlocked(module) {
        engine.curriculum().module(module)?;
        bail!("Module {module} is locked. Finish every lesson of the earlier modules first");
    }
    let curriculum = engine.curriculum();
    let content = curriculum.lesson(module, lesson)?;

    engine.record_activity(today);
    let update = engine.complete_lesson(module, lesson, content.xp_reward)?;

    let mut output = content.display();
    output.push_str("\n\n");
    match update.status {
        CompletionStatus::Completed => output.push_str(&describe_update(curriculum, &update)),
        CompletionStatus::AlreadyCompleted => output.push_str(&ui::style_text(
            "Already completed, no XP awarded",
            ui::StyleType::Subtle,
        )),
    }
    output.push_str(&format!(
        "\n{}",
        describe_next_step(curriculum.next_step(module, lesson)?)
    ));
    Ok((output, update))
}

pub fn run(
    config: &AppConfig,
    store: &dyn ProgressStore,
    module: u32,
    lesson: u32,
    today: NaiveDate,
) -> Result<()> {
    let curriculum = load_curriculum(config)?;
    let progress = load_progress(config, store)?;
    let mut engine = ProgressEngine::new(progress, &curriculum, config.learning.xp_curve);

    let (output, _) = complete(&mut engine, module, lesson, today)?;
    println!("{output}");
    save_progress(config, store, engine.progress())
}
