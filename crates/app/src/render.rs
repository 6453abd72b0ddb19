//! Plain-text rendering of session events.

use std::fmt::Write as _;

use backend::ResultSummary;
use quiz_core::model::{DifficultyTier, SessionReport, Termination};
use services::{AbortReason, QuestionView, RecordedAnswer, SessionEvent};

const RULE: &str = "────────────────────────────────────────";

pub fn event(event: &SessionEvent) {
    match event {
        SessionEvent::Started {
            questions,
            starting_level,
            ..
        } => println!("Loaded {questions} questions. Starting at {}.", starting_level.label()),
        SessionEvent::Question(view) => print!("{}", format_question(view)),
        SessionEvent::Tick { remaining } => {
            if let Some(line) = tick_line(*remaining) {
                println!("{line}");
            }
        }
        SessionEvent::Answered(recorded) => println!("{}", format_answer(recorded)),
        SessionEvent::Rejected { index, len } => {
            println!("Option {} does not exist; choose 1-{len}.", index + 1);
        }
        SessionEvent::Submitting {
            answered,
            termination,
        } => println!("{}", submitting_line(*answered, *termination)),
        SessionEvent::SubmitFailed { attempts, error } => {
            println!("Submission failed (attempt {attempts}): {error}");
        }
        SessionEvent::Finished { result, report } => {
            print!("{}", format_result(result, report.as_ref()));
        }
        SessionEvent::Aborted { reason } => println!("{}", aborted_line(*reason)),
    }
}

pub fn choice_hint(options: usize) {
    if options == 0 {
        println!("Waiting for the next question...");
    } else {
        println!("Type a number from 1 to {options} and press Enter.");
    }
}

pub fn retry_prompt() {
    println!("Retry submission? [Y/n]");
}

#[must_use]
pub fn format_question(view: &QuestionView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(
        out,
        "Question {}/{}  |  {}  |  {}",
        view.number,
        view.limit,
        view.topic,
        view.tier.label()
    );
    let _ = writeln!(out, "Insight: {}", view.insight);
    let _ = writeln!(out, "\n{}\n", view.prompt);
    for (i, option) in view.options.iter().enumerate() {
        let _ = writeln!(out, "  {}. {option}", i + 1);
    }
    let _ = writeln!(out, "\n{}s to answer.", view.remaining_secs);
    out
}

/// Countdown lines are printed sparingly: at 30 and 10 seconds and for the
/// last five.
#[must_use]
pub fn tick_line(remaining: u32) -> Option<String> {
    match remaining {
        30 | 10 => Some(format!("  {remaining}s left")),
        1..=5 => Some(format!("  {remaining}...")),
        _ => None,
    }
}

#[must_use]
pub fn format_answer(recorded: &RecordedAnswer) -> String {
    let item = &recorded.item;
    let verdict = if item.selected().is_timeout() {
        "Time's up.".to_owned()
    } else if item.is_correct() {
        format!("Correct! ({}s)", item.seconds_taken())
    } else {
        format!("Not quite. ({}s)", item.seconds_taken())
    };
    format!("{verdict} {}", recorded.transition.rationale)
}

fn submitting_line(answered: usize, termination: Termination) -> String {
    match termination {
        Termination::LimitReached => format!("Submitting {answered} answers..."),
        Termination::PoolExhausted => {
            format!("No questions left after {answered} answers. Submitting early...")
        }
    }
}

fn aborted_line(reason: AbortReason) -> &'static str {
    match reason {
        AbortReason::FetchFailed => "Could not load questions.",
        AbortReason::Cancelled => "Session cancelled.",
    }
}

#[must_use]
pub fn format_result(result: &ResultSummary, report: Option<&SessionReport>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{RULE}\nResults\n{RULE}");

    // Older servers may answer with an empty summary; fall back to local counts.
    let (score, correct, total) = match report {
        Some(report) if result.total == 0 && report.total() > 0 => (
            f64::from(report.score_percent()),
            report.correct(),
            report.total(),
        ),
        _ => (result.score, result.correct, result.total),
    };
    let _ = writeln!(out, "Score: {score:.1}% ({correct}/{total})");

    if !result.topic_performance.is_empty() {
        let _ = writeln!(out, "\nBy topic:");
        for topic in &result.topic_performance {
            let _ = writeln!(out, "  {:<20} {:>5.1}%", topic.topic, topic.accuracy);
        }
    } else if let Some(report) = report {
        let mut topics = report.topics().peekable();
        if topics.peek().is_some() {
            let _ = writeln!(out, "\nBy topic:");
        }
        for (topic, tally) in topics {
            let _ = writeln!(
                out,
                "  {topic:<20} {:>3}% ({}/{})",
                tally.accuracy_percent(),
                tally.correct,
                tally.asked
            );
        }
    }

    if let Some(report) = report {
        let _ = writeln!(out, "\nBy level:");
        for tier in DifficultyTier::ALL {
            let tally = report.tier(tier);
            if tally.asked > 0 {
                let _ = writeln!(out, "  {:<8} {}/{}", tier.label(), tally.correct, tally.asked);
            }
        }
        let _ = writeln!(out, "Finished at {} level.", report.final_level().label());
        if report.timeouts() > 0 {
            let _ = writeln!(out, "Timed out on {} question(s).", report.timeouts());
        }
    }

    if let Some(recommendation) = &result.recommendation {
        let _ = writeln!(out, "\nRecommendation: {recommendation}");
    }

    if !result.question_results.is_empty() {
        let _ = writeln!(out, "\nReview:");
        for (i, line) in result.question_results.iter().enumerate() {
            let mark = if line.is_correct { "+" } else { "-" };
            let _ = writeln!(out, "{mark} {}. {}", i + 1, line.question);
            let _ = writeln!(
                out,
                "    your answer: {}",
                line.selected_text().unwrap_or("(no answer)")
            );
            if !line.is_correct {
                if let Some(correct) = line.correct_text() {
                    let _ = writeln!(out, "    correct:     {correct}");
                }
            }
            if let Some(explanation) = &line.explanation {
                let _ = writeln!(out, "    {explanation}");
            }
        }
    }
    out
}
