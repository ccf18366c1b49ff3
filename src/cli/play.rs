//! `petsync play`: the live home screen.
//!
//! The main thread owns the session and ticks it. Stdin is read on its own
//! thread and arrives as lines over a channel. Flush requests go out on a
//! worker thread and their results come back over a second channel, so the
//! pet keeps animating while a sync is outstanding.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use jiff::Timestamp;
use rand::thread_rng;
use tracing::{debug, warn};

use crate::animation::RandomDice;
use crate::api::{self, BatchRequest, HttpClient, SyncClient};
use crate::model::{ActionKind, Goodie, PartialPetState};
use crate::session::{ActionOutcome, FlushOutcome};
use crate::store::StoreError;

use super::CliSession;
use super::format::{describe_frame, format_flush, format_frame, format_status};

const PLAY_HELP: &str =
    "commands: feed, toy, treat, pet, tap, flush, reload, status, look, help, quit";

/// A line of input, understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Act(ActionKind),
    Tap,
    Flush,
    Reload,
    Status,
    Look,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let word = line.trim().to_ascii_lowercase();
    match word.as_str() {
        "" => None,
        "tap" => Some(Input::Tap),
        "flush" | "sync" => Some(Input::Flush),
        "reload" | "r" => Some(Input::Reload),
        "status" | "s" => Some(Input::Status),
        "look" | "l" => Some(Input::Look),
        "help" | "?" => Some(Input::Help),
        "quit" | "q" | "exit" => Some(Input::Quit),
        other => other.parse().ok().map(Input::Act),
    }
}

type FlushResult = api::Result<PartialPetState>;

/// Runs the loop until `quit` or end of input, then leaves the session.
pub(super) fn run(
    mut session: CliSession<'_>,
    client: &HttpClient,
    worn: &[Goodie],
    tick: Duration,
) -> Result<(), String> {
    let lines = spawn_stdin_reader();
    let (flush_tx, flush_rx) = mpsc::channel::<FlushResult>();
    let mut dice = RandomDice(thread_rng());
    let mut shown = session.animation();

    println!("{}", format_status(session.state(), shown));
    eprintln!(
        "Playing as {} in {}. {PLAY_HELP}",
        session.session().user,
        session.session().space
    );

    loop {
        if let Ok(result) = flush_rx.try_recv() {
            report(session.complete_flush(result));
        }

        let input = match lines.recv_timeout(tick) {
            Ok(line) => parse_input(&line),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Input::Quit),
        };

        let now = Timestamp::now();
        match input {
            Some(Input::Act(action)) => act(session.perform_action(action, now), &session),
            Some(Input::Tap) => act(session.tap(now), &session),
            Some(Input::Flush) => match session.begin_flush() {
                Some(request) => send(request, client, &flush_tx),
                None if session.is_flushing() => report(FlushOutcome::InFlight),
                None => eprintln!("Nothing to sync"),
            },
            Some(Input::Reload) => match session.reload(now) {
                Ok(true) => println!("{}", format_status(session.state(), session.animation())),
                Ok(false) => eprintln!("{} is no longer in this space", session.state().pet),
                Err(e) => eprintln!("reload failed: {e}"),
            },
            Some(Input::Status) => println!("{}", format_status(session.state(), session.animation())),
            Some(Input::Look) => {
                for line in describe_frame(&session.frame(now), session.state().breed, worn) {
                    println!("{line}");
                }
            }
            Some(Input::Help) => eprintln!("{PLAY_HELP}"),
            Some(Input::Quit) => break,
            None => {}
        }

        if let Some(request) = session.tick(now, &mut dice) {
            send(request, client, &flush_tx);
        }

        let state = session.animation();
        if state != shown {
            shown = state;
            println!("{}", format_frame(&session.frame(now), session.state().breed));
        }
    }

    // The teardown flush must not race an outstanding one.
    if session.is_flushing() {
        debug!("waiting for in-flight flush before leaving");
        match flush_rx.recv() {
            Ok(result) => report(session.complete_flush(result)),
            Err(e) => warn!(error = %e, "flush worker went away"),
        }
    }
    report(session.leave());
    Ok(())
}

fn act(outcome: Result<ActionOutcome, StoreError>, session: &CliSession<'_>) {
    match outcome {
        Ok(ActionOutcome::Applied) => {}
        Ok(ActionOutcome::Locked) => eprintln!("{} is busy", session.state().pet),
        Err(e) => warn!(error = %e, "failed to persist action"),
    }
}

/// Sends a batch from a worker thread; the result comes back over `results`.
fn send(request: BatchRequest, client: &HttpClient, results: &Sender<FlushResult>) {
    let client = client.clone();
    let results = results.clone();
    thread::spawn(move || {
        let result = client.batch_action_update(&request);
        // The receiver only disappears when the loop has already exited.
        let _ = results.send(result);
    });
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn report(outcome: FlushOutcome) {
    if let Some(message) = format_flush(outcome) {
        eprintln!("{message}");
    }
}
