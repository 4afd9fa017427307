//! Terminal front end for the practice loop and the topic picker.

use std::io;

use practice_core::model::{Attempt, AttemptStatus, ChoiceId, Feedback, Question, QuestionId};
use practice_core::next_up::{NextUpAction, NextUpMenu};
use practice_core::visibility::RenderState;
use services::{AppServices, NextUpOutcome, PracticeLoopService, PracticeSession, TopicsView};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::args::{BookmarksCommand, TopicsCommand};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

struct Terminal<R> {
    lines: Lines<R>,
}

impl Terminal<BufReader<Stdin>> {
    fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Terminal<R> {
    fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// `None` at end of input.
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// What the user typed while answering.
enum AnswerInput {
    Submit { text: String, choices: Vec<ChoiceId> },
    Skip { text: String, choices: Vec<ChoiceId> },
    /// Leave with the attempt stored for next time.
    Quit,
}

pub async fn practice(services: &AppServices) -> AppResult<()> {
    practice_with(services, &mut Terminal::stdin()).await
}

async fn practice_with<R: AsyncBufRead + Unpin>(
    services: &AppServices,
    terminal: &mut Terminal<R>,
) -> AppResult<()> {
    let loop_svc = services.practice();
    let bookmarks = services.bookmarks();

    let mut session = loop_svc.start_or_resume().await?;
    debug!(scope = ?session.context().topic_scope, "practice session open");
    if session.was_resumed() {
        println!("Resuming your unfinished question.");
    }

    loop {
        let Some(question) = session.question().cloned() else {
            break;
        };

        let menu = match session.next_up() {
            Some(menu) => menu,
            None => {
                print_question(&question, session.attempt());
                match read_answer(terminal, &loop_svc, &mut session, &question).await? {
                    AnswerInput::Quit => {
                        println!("Saved. Run `app practice` to pick up where you left off.");
                        return Ok(());
                    }
                    AnswerInput::Skip { text, choices } => {
                        let menu = loop_svc.skip(&mut session, text, choices).await?;
                        println!("Skipped.");
                        menu
                    }
                    AnswerInput::Submit { text, choices } => {
                        let (feedback, menu) =
                            loop_svc.submit(&mut session, text, choices).await?;
                        print_feedback(&feedback);
                        menu
                    }
                }
            }
        };

        let action = loop {
            print_menu(&menu);
            let Some(line) = terminal.read_line().await? else {
                return Ok(());
            };
            let line = line.trim();
            if line == ":bookmark" {
                let marked = bookmarks.toggle(&question.id).await?;
                println!("{}", if marked { "Bookmarked." } else { "Bookmark removed." });
                continue;
            }
            match pick_option(&menu, line) {
                Some(action) => break action,
                None => println!("Pick a number from 1 to 5."),
            }
        };

        match loop_svc.choose_next(&mut session, action).await? {
            NextUpOutcome::Ended => println!("Session ended. Nice work."),
            NextUpOutcome::Loaded {
                topic_change_requested: true,
            } => println!("Tip: run `app topics` to pick a different focus."),
            NextUpOutcome::Loaded { .. } => {}
        }
    }
    Ok(())
}

/// Every accepted line is stored on the attempt, so leaving mid-answer keeps the
/// draft.
async fn read_answer<R: AsyncBufRead + Unpin>(
    terminal: &mut Terminal<R>,
    loop_svc: &PracticeLoopService,
    session: &mut PracticeSession,
    question: &Question,
) -> AppResult<AnswerInput> {
    if question.format.is_multiple_choice() {
        println!(
            "Enter choice id{} (comma separated), `:skip` or `:quit`:",
            if question.multi_select { "s" } else { "" }
        );
        let Some(line) = terminal.read_line().await? else {
            return Ok(AnswerInput::Quit);
        };
        let line = line.trim();
        return Ok(match line {
            ":quit" => AnswerInput::Quit,
            ":skip" => AnswerInput::Skip {
                text: String::new(),
                choices: Vec::new(),
            },
            _ => {
                let choices = parse_choices(line);
                loop_svc
                    .record_answer(session, String::new(), choices.clone())
                    .await?;
                AnswerInput::Submit {
                    text: String::new(),
                    choices,
                }
            }
        });
    }

    println!("Type your answer. Finish with an empty line; `:skip` or `:quit` on a line alone.");
    let mut text: Vec<String> = session
        .attempt()
        .and_then(Attempt::answer_text)
        .map(|draft| draft.lines().map(str::to_owned).collect())
        .unwrap_or_default();
    loop {
        let Some(line) = terminal.read_line().await? else {
            return Ok(AnswerInput::Quit);
        };
        match line.trim() {
            "" => break,
            ":quit" => return Ok(AnswerInput::Quit),
            ":skip" => {
                return Ok(AnswerInput::Skip {
                    text: text.join("\n"),
                    choices: Vec::new(),
                });
            }
            _ => {
                text.push(line);
                loop_svc
                    .record_answer(session, text.join("\n"), Vec::new())
                    .await?;
            }
        }
    }
    Ok(AnswerInput::Submit {
        text: text.join("\n"),
        choices: Vec::new(),
    })
}

fn parse_choices(line: &str) -> Vec<ChoiceId> {
    line.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ChoiceId::new)
        .collect()
}

fn pick_option(menu: &NextUpMenu, line: &str) -> Option<NextUpAction> {
    let index: usize = line.parse().ok()?;
    menu.options()
        .get(index.checked_sub(1)?)
        .map(|option| option.action)
}

fn print_question(question: &Question, attempt: Option<&Attempt>) {
    println!();
    println!(
        "[{}] {} · difficulty {}{}",
        question.role,
        question.topic_path.join(" / "),
        question.difficulty.value(),
        if question.is_review_injection { " · review" } else { "" }
    );
    println!("{}", question.prompt);
    for choice in &question.choices {
        println!("  {}) {}", choice.id, choice.text);
    }
    if let Some(draft) = attempt.and_then(Attempt::answer_text).filter(|t| !t.is_empty()) {
        println!("Draft so far:\n{draft}");
    }
}

fn print_feedback(feedback: &Feedback) {
    println!();
    println!(
        "Score {} / 100 · band {} · confidence {:?}",
        feedback.overall_score(),
        feedback.overall_band().value(),
        feedback.confidence()
    );
    for row in feedback.rubric() {
        println!("  {:<18} {}  {}", row.category.label(), row.band.value(), row.rationale);
    }
    for item in feedback.went_well() {
        println!("  + {item}");
    }
    for item in feedback.missing() {
        println!("  - {item}");
    }
    println!("Exemplar: {}", feedback.exemplar_answer());
}

fn print_menu(menu: &NextUpMenu) {
    println!();
    println!("Next up (`:bookmark` toggles a bookmark):");
    for (i, option) in menu.iter().enumerate() {
        println!("  {}. {:<13} {}", i + 1, option.title, option.description);
    }
}

// ─── TOPICS ─────────────────────────────────────────────────────────────────────

pub async fn topics(services: &AppServices, command: TopicsCommand) -> AppResult<()> {
    let svc = services.topics();
    let state = match command {
        TopicsCommand::Show => svc.load().await?,
        TopicsCommand::Select(id) => svc.select(&id).await?,
        TopicsCommand::Remove(id) => {
            let (state, removed) = svc.remove(&id).await?;
            if removed > 0 {
                println!("Also cleared {removed} selected subtopic(s).");
            }
            state
        }
        TopicsCommand::IncludeChildren(id, on) => svc.set_include_children(&id, on).await?,
        TopicsCommand::ActiveRole(role) => svc.set_active_role(role).await?,
        TopicsCommand::ToggleRole(role) => svc.toggle_role(role).await?,
        TopicsCommand::Add {
            level,
            label,
            parent,
        } => {
            let (state, node) = svc.add_custom_topic(level, &label, parent).await?;
            println!("Added {} ({}).", node.label, node.id);
            state
        }
        TopicsCommand::Practice(topic) => {
            let context = match topic {
                Some(id) => svc.practice_topic(&id).await?,
                None => svc.practice_selection().await?,
            };
            let scope = if context.topic_scope.is_empty() {
                "everything".to_string()
            } else {
                context.topic_scope.join(", ")
            };
            println!("Practice scope for {}: {scope}", context.role.label());
            return Ok(());
        }
    };

    let roles: Vec<String> = state
        .selected_roles()
        .iter()
        .map(|r| {
            if *r == state.active_role() {
                format!("*{r}")
            } else {
                r.to_string()
            }
        })
        .collect();
    println!("Roles: {}", roles.join(" "));
    print_view(&svc.view(&state), &svc.graph(&state, state.active_role()));
    Ok(())
}

fn print_view(view: &TopicsView, graph: &practice_core::TopicGraph) {
    for level in &view.levels {
        println!("Level {}:", level.level);
        for id in &level.topic_ids {
            let marker = match view.render.get(id) {
                Some(RenderState::Explicit) => "[x]",
                Some(RenderState::Implicit) => "[~]",
                _ => "[ ]",
            };
            let label = graph.get(id).map_or("", |n| n.label.as_str());
            println!("  {marker} {label:<20} {id}");
        }
    }
}

// ─── HISTORY & BOOKMARKS ────────────────────────────────────────────────────────

pub async fn history(services: &AppServices, limit: usize) -> AppResult<()> {
    let items = services.history().list(limit).await?;
    if items.is_empty() {
        println!("No attempts yet.");
    }
    for item in items {
        let prompt = item
            .question
            .as_ref()
            .map_or("(question no longer available)", |q| q.prompt.as_str());
        let score = item
            .attempt
            .feedback()
            .map_or_else(|| "-".to_string(), |f| f.overall_score().to_string());
        println!(
            "{}  {:<9} {:>3}  {}",
            item.attempt.updated_at().format("%Y-%m-%d %H:%M"),
            status_label(item.attempt.status()),
            score,
            first_line(prompt)
        );
    }
    Ok(())
}

pub async fn bookmarks(services: &AppServices, command: BookmarksCommand) -> AppResult<()> {
    let svc = services.bookmarks();
    match command {
        BookmarksCommand::Toggle(raw) => {
            let marked = svc.toggle(&QuestionId::new(raw)).await?;
            println!("{}", if marked { "Bookmarked." } else { "Bookmark removed." });
        }
        BookmarksCommand::List => {
            let questions = svc.list_bookmarked_questions().await?;
            if questions.is_empty() {
                println!("No bookmarks.");
            }
            for q in questions {
                println!("{:<12} {}", q.id, first_line(&q.prompt));
            }
        }
    }
    Ok(())
}

fn status_label(status: AttemptStatus) -> &'static str {
    match status {
        AttemptStatus::InProgress => "open",
        AttemptStatus::SubmittedUnresolved => "submitted",
        AttemptStatus::SkippedUnresolved => "skipped",
        AttemptStatus::Resolved => "done",
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::model::{Difficulty, QuestionFormat, Role};
    use practice_core::next_up::build_options;
    use practice_core::time::fixed_clock;
    use services::{InMemoryCatalog, PracticeConfig};
    use std::sync::Arc;

    fn question() -> Question {
        Question {
            id: QuestionId::new("q"),
            role: Role::DataEngineer,
            topic_path: vec!["SQL".into()],
            difficulty: Difficulty::new(2).unwrap(),
            format: QuestionFormat::Short,
            prompt: "p".into(),
            choices: Vec::new(),
            multi_select: false,
            sequence: None,
            is_review_injection: false,
        }
    }

    #[test]
    fn menu_numbers_map_to_slots() {
        let menu = build_options(&question());
        assert_eq!(pick_option(&menu, "1"), Some(NextUpAction::NewRandom));
        assert_eq!(pick_option(&menu, "5"), Some(NextUpAction::EndSession));
        assert_eq!(pick_option(&menu, "0"), None);
        assert_eq!(pick_option(&menu, "6"), None);
        assert_eq!(pick_option(&menu, "x"), None);
    }

    #[test]
    fn choices_are_split_and_trimmed() {
        assert_eq!(
            parse_choices(" a, b ,,c"),
            vec![ChoiceId::new("a"), ChoiceId::new("b"), ChoiceId::new("c")]
        );
    }

    const CATALOG: &str = r#"{
        "questions": [
            {"id": "q_sql_001", "role": "DE", "topic_path": ["SQL", "Joins"], "difficulty": 2,
             "format": "short", "prompt": "Explain LEFT JOIN vs INNER JOIN."}
        ]
    }"#;

    fn services() -> AppServices {
        let catalog = Arc::new(InMemoryCatalog::from_json(CATALOG).unwrap());
        let config = PracticeConfig {
            review_injection_rate: 0.0,
            ..PracticeConfig::default()
        };
        AppServices::in_memory(fixed_clock(), config, catalog)
    }

    #[tokio::test]
    async fn quitting_mid_answer_keeps_the_draft() {
        let services = services();
        let mut terminal = Terminal::from_reader(&b"LEFT keeps unmatched rows\n:quit\n"[..]);
        practice_with(&services, &mut terminal).await.unwrap();

        let resumed = services.practice().start_or_resume().await.unwrap();
        assert!(resumed.was_resumed());
        let attempt = resumed.attempt().unwrap();
        assert_eq!(attempt.status(), AttemptStatus::InProgress);
        assert_eq!(attempt.answer_text(), Some("LEFT keeps unmatched rows"));
    }

    #[tokio::test]
    async fn end_of_input_keeps_the_draft_and_resume_appends() {
        let services = services();
        let loop_svc = services.practice();
        let mut session = loop_svc.start_or_resume().await.unwrap();
        let question = session.question().cloned().unwrap();
        let mut terminal = Terminal::from_reader(&b"first line\n"[..]);
        let input = read_answer(&mut terminal, &loop_svc, &mut session, &question)
            .await
            .unwrap();
        assert!(matches!(input, AnswerInput::Quit));

        let mut session = loop_svc.start_or_resume().await.unwrap();
        let mut terminal = Terminal::from_reader(&b"second line\n\n"[..]);
        let input = read_answer(&mut terminal, &loop_svc, &mut session, &question)
            .await
            .unwrap();
        match input {
            AnswerInput::Submit { text, .. } => assert_eq!(text, "first line\nsecond line"),
            _ => panic!("expected a submit"),
        }
        assert_eq!(
            session.attempt().and_then(Attempt::answer_text),
            Some("first line\nsecond line")
        );
    }
}
