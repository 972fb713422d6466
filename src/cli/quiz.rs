use super::learn::{describe_update, load_curriculum, load_progress, save_progress};
use super::ui;
use crate::core::config::AppConfig;
use crate::core::progress::ProgressEngine;
use crate::core::quiz::{QuizOutcome, QuizSession, QuizState};
use crate::store::ProgressStore;
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use std::io::{BufRead, Write};

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, text: &str) -> Result<String> {
    write!(output, "{text}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read answer")? == 0 {
        bail!("Quiz aborted");
    }
    Ok(line.trim().to_string())
}

fn ask_question<R: BufRead, W: Write>(
    session: &mut QuizSession<'_>,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let question = session.current_question();
    writeln!(
        output,
        "\n{} {}",
        ui::style_text(
            &format!(
                "Question {}/{}:",
                session.question_index() + 1,
                session.quiz().total_questions()
            ),
            ui::StyleType::TotalLabel
        ),
        question.question
    )?;
    for (i, option) in question.options.iter().enumerate() {
        writeln!(output, "  {}) {option}", i + 1)?;
    }

    loop {
        let answer = prompt(input, output, "Your answer: ")?;
        let choice = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map(|index| session.select_answer(index));
        match choice {
            Some(Ok(())) => break,
            _ => writeln!(
                output,
                "{}",
                ui::style_text(
                    &format!("Enter a number from 1 to {}", question.options.len()),
                    ui::StyleType::Error
                )
            )?,
        }
    }

    if session.submit()? {
        writeln!(output, "{}", ui::style_text("Correct!", ui::StyleType::Success))?;
    } else {
        let correct = question
            .options
            .get(question.correct_answer)
            .map_or("", String::as_str);
        writeln!(
            output,
            "{} The answer is: {correct}",
            ui::style_text("Incorrect.", ui::StyleType::Error)
        )?;
    }
    writeln!(
        output,
        "{}",
        ui::style_text(&question.explanation, ui::StyleType::Subtle)
    )?;
    Ok(())
}

/// Runs the quiz of `module` interactively. A failed attempt can be
/// retaken straight away; XP is credited once per passing attempt.
pub fn take_quiz<R: BufRead, W: Write>(
    engine: &mut ProgressEngine<'_>,
    module: u32,
    today: NaiveDate,
    input: &mut R,
    output: &mut W,
) -> Result<QuizOutcome> {
    let curriculum = engine.curriculum();
    curriculum.module(module)?;
    if !engine.is_unlocked(module) {
        bail!("Module {module} is locked. Finish every lesson of the earlier modules first");
    }
    let quiz = curriculum
        .quiz(module)
        .ok_or_else(|| anyhow!("Module {module} has no quiz"))?;
    let mut session = QuizSession::new(quiz)?;
    engine.record_activity(today);

    writeln!(
        output,
        "{}\nPass mark: {}%",
        ui::style_text(&quiz.title, ui::StyleType::Title),
        quiz.passing_score
    )?;

    loop {
        while session.state() != QuizState::Complete {
            ask_question(&mut session, input, output)?;
            session.advance()?;
        }

        let outcome = session
            .outcome()
            .ok_or_else(|| anyhow!("Quiz ended before the last question"))?;
        let verdict = if outcome.passed {
            ui::style_text("Passed", ui::StyleType::Success)
        } else {
            ui::style_text("Not passed", ui::StyleType::Error)
        };
        writeln!(
            output,
            "\nScore: {}/{} ({:.0}%) {verdict}",
            outcome.score, outcome.total, outcome.score_percentage
        )?;

        if let Some(update) = session.claim_reward(engine)? {
            writeln!(output, "{}", describe_update(curriculum, &update))?;
        }
        if outcome.passed {
            return Ok(outcome);
        }

        let retake = prompt(input, output, "Retake the quiz? [y/N] ")?;
        if !retake.eq_ignore_ascii_case("y") {
            return Ok(outcome);
        }
        session.retake();
    }
}

pub fn run<R: BufRead, W: Write>(
    config: &AppConfig,
    store: &dyn ProgressStore,
    module: u32,
    today: NaiveDate,
    input: &mut R,
    output: &mut W,
) -> Result<QuizOutcome> {
    let curriculum = load_curriculum(config)?;
    let progress = load_progress(config, store)?;
    let mut engine = ProgressEngine::new(progress, &curriculum, config.learning.xp_curve);

    let outcome = take_quiz(&mut engine, module, today, input, output)?;
    save_progress(config, store, engine.progress())?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::curriculum::Curriculum;
    use crate::core::progress::{LearnerProgress, XpCurve};
    use crate::store::memory::MemoryProgressStore;
    use std::io::Cursor;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    /// Input lines answering every question of `module`, right or wrong.
    fn answers(curriculum: &Curriculum, module: u32, correct: bool) -> String {
        curriculum
            .quiz(module)
            .unwrap()
            .questions
            .iter()
            .map(|q| {
                let index = if correct {
                    q.correct_answer
                } else {
                    (q.correct_answer + 1) % q.options.len()
                };
                format!("{}\n", index + 1)
            })
            .collect()
    }

    #[test]
    fn test_perfect_run_awards_xp() {
        console::set_colors_enabled(false);
        let curriculum = Curriculum::builtin().unwrap();
        let mut engine =
            ProgressEngine::new(LearnerProgress::new(10_000), &curriculum, XpCurve::Constant);
        let mut input = Cursor::new(answers(&curriculum, 1, true));
        let mut output = Vec::<u8>::new();

        let outcome = take_quiz(&mut engine, 1, today(), &mut input, &mut output).unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.score, outcome.total);
        assert_eq!(engine.progress().xp(), curriculum.quiz(1).unwrap().xp_reward);
        assert!(engine.progress().passed_quizzes().contains(&1));

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Correct!"));
        assert!(text.contains("(100%) Passed"));
        assert!(text.contains("Quiz Champion"));
    }

    #[test]
    fn test_failed_run_can_be_retaken() {
        console::set_colors_enabled(false);
        let curriculum = Curriculum::builtin().unwrap();
        let mut engine =
            ProgressEngine::new(LearnerProgress::new(10_000), &curriculum, XpCurve::Constant);
        let script = format!(
            "{}y\n{}",
            answers(&curriculum, 1, false),
            answers(&curriculum, 1, true)
        );
        let mut input = Cursor::new(script);
        let mut output = Vec::<u8>::new();

        let outcome = take_quiz(&mut engine, 1, today(), &mut input, &mut output).unwrap();
        assert!(outcome.passed);
        assert_eq!(engine.progress().xp(), curriculum.quiz(1).unwrap().xp_reward);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Not passed"));
        assert!(text.contains("Incorrect."));
    }

    #[test]
    fn test_declining_retake_keeps_failure() {
        let curriculum = Curriculum::builtin().unwrap();
        let mut engine =
            ProgressEngine::new(LearnerProgress::default(), &curriculum, XpCurve::Constant);
        let mut input = Cursor::new(format!("{}n\n", answers(&curriculum, 1, false)));
        let mut output = Vec::<u8>::new();

        let outcome = take_quiz(&mut engine, 1, today(), &mut input, &mut output).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.score, 0);
        assert_eq!(engine.progress().xp(), 0);
    }

    #[test]
    fn test_invalid_input_is_asked_again() {
        console::set_colors_enabled(false);
        let curriculum = Curriculum::builtin().unwrap();
        let mut engine =
            ProgressEngine::new(LearnerProgress::new(10_000), &curriculum, XpCurve::Constant);
        let mut input = Cursor::new(format!("abc\n0\n99\n{}", answers(&curriculum, 1, true)));
        let mut output = Vec::<u8>::new();

        let outcome = take_quiz(&mut engine, 1, today(), &mut input, &mut output).unwrap();
        assert!(outcome.passed);
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Enter a number from 1 to").count(), 3);
    }

    #[test]
    fn test_end_of_input_aborts() {
        let curriculum = Curriculum::builtin().unwrap();
        let mut engine =
            ProgressEngine::new(LearnerProgress::default(), &curriculum, XpCurve::Constant);
        let mut input = Cursor::new("1\n");
        let mut output = Vec::<u8>::new();
        let err = take_quiz(&mut engine, 1, today(), &mut input, &mut output).unwrap_err();
        assert!(err.to_string().contains("aborted"));
    }

    #[test]
    fn test_locked_quiz_is_refused() {
        let curriculum = Curriculum::builtin().unwrap();
        let mut engine =
            ProgressEngine::new(LearnerProgress::default(), &curriculum, XpCurve::Constant);
        let mut output = Vec::<u8>::new();
        let err = take_quiz(&mut engine, 3, today(), &mut Cursor::new(""), &mut output)
            .unwrap_err();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_run_saves_passed_quiz() {
        let config = AppConfig::default();
        let store = MemoryProgressStore::new();
        let curriculum = Curriculum::builtin().unwrap();
        let mut input = Cursor::new(answers(&curriculum, 1, true));

        run(&config, &store, 1, today(), &mut input, &mut Vec::<u8>::new()).unwrap();
        let saved = store.load("default").unwrap().unwrap();
        assert!(saved.passed_quizzes().contains(&1));
        assert_eq!(saved.streak(), 1);
    }
}
