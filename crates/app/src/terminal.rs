//! Line-oriented presentation layer.

use std::error::Error;
use std::io::{self, Write};

use services::session::{ContentView, OptionState};
use services::{
    Advance, QuestionView, QuizLoopService, QuizSession, SessionError, SessionSummary,
    StartNotice, StartedSession,
};

const SESSION_HELP: &str = "1-4 answer | r reveal | n next | b back | c bookmark | \
                            e <text> note | y copy | f finish | q quit";

/// Read one trimmed line; `None` on end of input.
fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_owned()))
}

/// Show recoverable errors and keep going; storage failures end the loop.
fn report(err: SessionError) -> Result<(), Box<dyn Error>> {
    match err {
        SessionError::Storage(err) => Err(err.into()),
        other => {
            println!("! {other}");
            Ok(())
        }
    }
}

fn content_text(content: &ContentView) -> String {
    match content {
        ContentView::Text(text) => text.clone(),
        ContentView::Image { url } => format!("[image: {url}]"),
    }
}

fn print_question(view: &QuestionView) {
    let mark = if view.is_checked { " *" } else { "" };
    println!();
    println!(
        "[{}/{}] {} ({}){mark}",
        view.position, view.total, view.key, view.subject
    );
    println!("{}", view.body);
    if let Some(reference) = &view.reference {
        println!("  <Reference> {}", content_text(reference));
    }
    for option in &view.options {
        let marker = match option.state {
            OptionState::Open | OptionState::Dimmed => " ",
            OptionState::Correct => "o",
            OptionState::WrongSelection => "x",
        };
        println!("  {marker} {}. {}", option.choice, content_text(&option.content));
    }
    if view.answered {
        match (view.is_correct, view.correct_choice) {
            (true, _) => println!("Correct."),
            (false, Some(choice)) => println!("Incorrect. The answer is {choice}."),
            (false, None) => println!("Incorrect. This question has no usable answer."),
        }
        if let Some(explanation) = &view.explanation {
            println!("Explanation: {explanation}");
        }
    }
    if let Some(note) = &view.note {
        println!("Note: {note}");
    }
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!(
        "Result: {}/{} ({:.1}%)",
        summary.score,
        summary.total,
        summary.percentage()
    );
    for question in &summary.incorrect {
        println!("  missed {} ({})", question.key(), question.subject());
    }
}

fn announce(started: &StartedSession) {
    if let Some(StartNotice::RestartedFromBeginning { saved_index, total }) = started.notice {
        println!(
            "Saved position {} is past the end of {total} questions; starting from the first.",
            saved_index + 1
        );
    }
    println!("{SESSION_HELP}");
}

/// Run a session until the learner quits or input ends.
///
/// # Errors
///
/// Returns an error on terminal I/O or storage failures.
pub async fn run_session(
    svc: &QuizLoopService,
    started: StartedSession,
) -> Result<(), Box<dyn Error>> {
    announce(&started);
    let mut session = started.session;

    loop {
        if session.is_complete() {
            let summary = svc.session_summary(&session);
            print_summary(&summary);
            let Some(input) = prompt("[v] review incorrect  [x] next round  [q] quit > ")? else {
                return Ok(());
            };
            let next = match input.as_str() {
                "v" => svc.start_review(&summary).await,
                "x" => svc.start_next_round(&session).await,
                "q" => return Ok(()),
                _ => continue,
            };
            match next {
                Ok(started) => {
                    announce(&started);
                    session = started.session;
                }
                Err(err) => report(err)?,
            }
            continue;
        }

        if let Some(view) = svc.question_view(&session).await? {
            print_question(&view);
        }
        let Some(input) = prompt("> ")? else {
            return Ok(());
        };
        if !step(svc, &mut session, &input).await? {
            return Ok(());
        }
    }
}

/// Apply one command. Returns `false` when the learner quits.
async fn step(
    svc: &QuizLoopService,
    session: &mut QuizSession,
    input: &str,
) -> Result<bool, Box<dyn Error>> {
    let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
    let result = match command {
        "1" | "2" | "3" | "4" => {
            let n = command.parse().unwrap_or_default();
            svc.select_option(session, n).map(|_| ())
        }
        "r" => svc.reveal(session).map(|_| ()),
        "n" => svc.advance(session).await.map(|step| {
            if step == Advance::Completed {
                println!("That was the last question.");
            }
        }),
        "b" => svc.back(session).await.map(|_| ()),
        "f" => svc.finish(session).await.map(|_| ()),
        "c" | "e" | "y" => {
            let Some(entry) = session.current_question() else {
                return Ok(true);
            };
            let question = std::sync::Arc::clone(&entry.question);
            match command {
                "c" => {
                    let checked = svc.toggle_checked(question.key()).await?;
                    println!("{}", if checked { "Bookmarked." } else { "Bookmark removed." });
                }
                "e" => {
                    svc.save_explanation(question.key().clone(), rest).await?;
                }
                _ => println!("{}", svc.clipboard_text(&question)),
            }
            Ok(())
        }
        "q" => return Ok(false),
        "" => Ok(()),
        _ => {
            println!("{SESSION_HELP}");
            Ok(())
        }
    };
    if let Err(err) = result {
        report(err)?;
    }
    Ok(true)
}
