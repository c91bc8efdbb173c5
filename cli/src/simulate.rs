//! Scripted session run
//!
//! Drives one session end to end through the engine facade: participants
//! join, contribute ideas from a fixed bank, vote, hear from the assistant,
//! and the session ends with a summary.

use anyhow::Result;
use huddle_application::{CollabEngine, CreateSession, JoinRequest};
use huddle_domain::{OutputFormat, ParticipantId, Role, SessionEvent, SessionId};
use huddle_presentation::{ConsoleFormatter, SimulateArgs};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

const NAMES: &[&str] = &["Ada", "Grace", "Linus", "Barbara", "Ken", "Margaret"];

const IDEA_BANK: &[&str] = &[
    "Cache the search results for anonymous visitors",
    "We should add an index on the search table",
    "Invalidate the search cache on every deploy?",
    "TODO: measure p95 latency of the search endpoint",
    "Paginate search results server side",
    "Move the onboarding checklist into the sidebar",
    "Let's timebox the caching spike to two days",
    "Who owns the latency dashboard?",
    "Precompute the popular search queries nightly",
    "Action: write the rollout plan for the search cache",
    "Drop the legacy export job",
    "Share the onboarding survey results with the team",
];

pub async fn run(engine: &CollabEngine, args: &SimulateArgs, format: OutputFormat) -> Result<()> {
    let participants: Vec<ParticipantId> = (1..=args.participants)
        .map(|i| ParticipantId::new(format!("p{i}")))
        .collect();

    let session = engine
        .create_session(CreateSession::new(args.workspace.as_str(), args.title.as_str()))
        .await?;
    info!(session_id = %session, "Simulated session created");

    let printer = spawn_printer(engine, &session, format).await?;

    for (i, participant) in participants.iter().enumerate() {
        let role = if i == 0 { Role::Initiator } else { Role::Contributor };
        let name = NAMES[i % NAMES.len()];
        engine
            .join(&session, JoinRequest::new(participant.clone(), name).as_role(role))
            .await?;
    }

    let mut ideas = Vec::with_capacity(args.ideas);
    for i in 0..args.ideas {
        let contributor = &participants[i % participants.len()];
        let text = IDEA_BANK[i % IDEA_BANK.len()];
        ideas.push(engine.contribute_idea(&session, contributor, text).await?);
    }

    // Everyone backs the first idea; the rest is spread around
    for (p, voter) in participants.iter().enumerate() {
        for (i, idea) in ideas.iter().enumerate() {
            if i == 0 || (i + p) % 3 == 0 {
                engine.vote(&session, voter, &idea.id).await?;
            }
        }
    }

    if args.request_assistant
        && let Some(invocation) = engine.request_assistant(&session, &participants[0]).await?
    {
        let outcome = invocation.task.await?;
        debug!(?outcome, "Requested invocation finished");
    }
    wait_for_assistant(engine, &session).await?;

    let snapshot = engine.snapshot(&session).await?;
    if let (Some(contribution), Some(reader)) =
        (snapshot.assistant_tail.last(), participants.last())
    {
        engine
            .annotate_feedback(&session, &contribution.id, reader, true, None)
            .await?;
    }

    let summary = engine.end(&session).await?;
    // The printer stops at SummaryReady
    printer.await?;

    match format {
        OutputFormat::Full => println!("{}", ConsoleFormatter::format(&summary)),
        OutputFormat::Brief => println!("{}", ConsoleFormatter::format_brief(&summary)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&summary)),
    }

    Ok(())
}

/// Print events live in full mode; always drain until the summary arrives.
async fn spawn_printer(
    engine: &CollabEngine,
    session: &SessionId,
    format: OutputFormat,
) -> Result<tokio::task::JoinHandle<()>> {
    let mut events = engine.subscribe(session).await?;
    Ok(tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if format == OutputFormat::Full {
                        println!("{}", ConsoleFormatter::format_event(&event));
                    }
                    if matches!(event, SessionEvent::SummaryReady { .. }) {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!(missed, "Event printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }))
}

/// Let an automatic invocation finish before the session ends.
async fn wait_for_assistant(engine: &CollabEngine, session: &SessionId) -> Result<()> {
    let deadline = engine.config().assistant_request_deadline;
    let settled = tokio::time::timeout(deadline, async {
        loop {
            match engine.snapshot(session).await {
                Ok(snapshot) if snapshot.assistant_pending => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                Ok(_) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    })
    .await;

    match settled {
        Ok(result) => Ok(result?),
        Err(_) => {
            debug!("Assistant still pending at the deadline");
            Ok(())
        }
    }
}
