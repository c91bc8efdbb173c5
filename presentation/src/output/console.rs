//! Console output formatter for session events and summaries

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use huddle_domain::{
    ConnectionStatus, DropReason, HeadlineBasis, SafetyTarget, SessionEvent, SessionSummary,
    VoteChange,
};

/// Formats session output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Force colored output on or off for the whole process
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// One line describing an event
    pub fn format_event(event: &SessionEvent) -> String {
        match event {
            SessionEvent::ParticipantJoined {
                participant,
                outcome,
            } => format!(
                "{} {} ({}) {:?}",
                "+".green().bold(),
                participant.display_name.bold(),
                participant.role,
                outcome
            ),
            SessionEvent::ParticipantStatusChanged(change) => {
                let to = match change.to {
                    ConnectionStatus::Connected => change.to.to_string().green(),
                    ConnectionStatus::Disconnected => change.to.to_string().yellow(),
                    ConnectionStatus::Left => change.to.to_string().red(),
                };
                format!("{} {} is {}", "~".dimmed(), change.participant_id, to)
            }
            SessionEvent::StatusChanged { from, to, .. } => format!(
                "{} session {} -> {}",
                "*".cyan().bold(),
                from,
                to.to_string().cyan().bold()
            ),
            SessionEvent::IdeaAppended { idea } => {
                let revises = if idea.revises.is_some() {
                    " (revision)".dimmed().to_string()
                } else {
                    String::new()
                };
                format!(
                    "{} {}: {}{}",
                    format!("#{}", idea.sequence).yellow().bold(),
                    idea.contributor,
                    idea.preview(80),
                    revises
                )
            }
            SessionEvent::VoteTallied {
                idea_id,
                voter,
                change,
                votes,
                consensus_score,
            } => {
                let verb = match change {
                    VoteChange::Counted => "voted for",
                    VoteChange::AlreadyCounted => "already voted for",
                    VoteChange::Retracted => "retracted vote on",
                    VoteChange::NotPresent => "had no vote on",
                };
                format!(
                    "{} {} {} {} ({} votes, consensus {:.2})",
                    "^".blue(),
                    voter,
                    verb,
                    idea_id,
                    votes,
                    consensus_score
                )
            }
            SessionEvent::AssistantComposing { trigger, .. } => format!(
                "{} {}",
                "assistant".magenta().bold(),
                format!("is composing ({trigger})").dimmed()
            ),
            SessionEvent::AssistantContributed { contribution, .. } => format!(
                "{} {} {}",
                "assistant:".magenta().bold(),
                contribution.text,
                format!(
                    "[cites {}, confidence {:.2}]",
                    contribution.referenced_ideas.len(),
                    contribution.confidence
                )
                .dimmed()
            ),
            SessionEvent::AssistantDropped { reason, .. } => {
                let reason = match reason {
                    DropReason::SessionClosed => reason.to_string().dimmed(),
                    _ => reason.to_string().red(),
                };
                format!("{} gave up: {}", "assistant".magenta().bold(), reason)
            }
            SessionEvent::FeedbackRecorded {
                participant_id,
                feedback,
                ..
            } => format!(
                "{} {} found the assistant {}",
                "?".dimmed(),
                participant_id,
                if feedback.helpful { "helpful" } else { "unhelpful" }
            ),
            SessionEvent::SafetyFlagged { target, report } => {
                let target = match target {
                    SafetyTarget::Idea(id) => format!("idea {id}"),
                    SafetyTarget::Contribution(id) => format!("contribution {id}"),
                };
                format!(
                    "{} {} flagged: {}{}",
                    "!".red().bold(),
                    target,
                    report.flags.join(", "),
                    if report.requires_review { " (review)" } else { "" }
                )
            }
            SessionEvent::SummaryReady { summary } => format!(
                "{} summary ready: {}",
                "*".cyan().bold(),
                summary.title.bold()
            ),
        }
    }

    /// Format the complete summary
    pub fn format(summary: &SessionSummary) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&summary.title));
        output.push('\n');

        output.push_str(&format!(
            "{} {}s, {} participants ({} voting)\n",
            "Duration:".cyan().bold(),
            summary.duration_secs,
            summary.participant_count,
            summary.voting_members
        ));
        output.push_str(&format!(
            "{} {} ideas, {} votes, consensus {:.2}\n",
            "Activity:".cyan().bold(),
            summary.total_ideas,
            summary.total_votes,
            summary.consensus_score
        ));

        let basis = match summary.headline_basis {
            HeadlineBasis::Consensus => format!("reached {}", summary.headline_rule),
            HeadlineBasis::TopByCount => "no consensus, top ideas by votes".to_string(),
        };
        output.push_str(&Self::section_header(&format!("Headline ({basis})")));
        for idea in &summary.headline {
            output.push_str(&format!(
                "  {} {} ({} votes)\n",
                format!("#{}", idea.sequence).yellow(),
                idea.text,
                idea.votes
            ));
        }

        if !summary.top_rated.is_empty() {
            output.push_str(&Self::section_header("Top rated"));
            for idea in &summary.top_rated {
                output.push_str(&format!(
                    "  {} {} ({} votes)\n",
                    format!("#{}", idea.sequence).yellow(),
                    idea.text,
                    idea.votes
                ));
            }
        }

        output.push_str(&Self::section_header(&format!(
            "Assistant ({} contributions)",
            summary.assistant_contribution_count
        )));
        for highlight in &summary.brief.assistant_highlights {
            output.push_str(&format!("  * {}\n", highlight));
        }

        output.push_str(&Self::section_header("Action items"));
        if summary.action_items_degraded {
            output.push_str(&format!("  {}\n", "(extraction unavailable)".yellow()));
        }
        for item in &summary.action_items {
            match &item.owner {
                Some(owner) => output.push_str(&format!("  - {} ({})\n", item.text, owner)),
                None => output.push_str(&format!("  - {}\n", item.text)),
            }
        }

        if !summary.flagged_ideas.is_empty() {
            output.push_str(&format!(
                "\n{} {} idea(s) need review\n",
                "!".red().bold(),
                summary.flagged_ideas.len()
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(summary: &SessionSummary) -> String {
        serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the content brief only
    pub fn format_brief(summary: &SessionSummary) -> String {
        let brief = &summary.brief;
        let mut output = format!("{}\n", format!("=== {} ===", brief.title).cyan().bold());

        for point in &brief.key_points {
            output.push_str(&format!("  * {}\n", point));
        }
        if !brief.open_questions.is_empty() {
            output.push_str(&format!("\n{}\n", "Open questions:".bold()));
            for question in &brief.open_questions {
                output.push_str(&format!("  ? {}\n", question));
            }
        }
        if !summary.action_items.is_empty() {
            output.push_str(&format!("\n{}\n", "Next steps:".bold()));
            for item in &summary.action_items {
                output.push_str(&format!("  - {}\n", item.text));
            }
        }

        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_event(&self, event: &SessionEvent) -> String {
        Self::format_event(event)
    }

    fn format(&self, summary: &SessionSummary) -> String {
        Self::format(summary)
    }

    fn format_json(&self, summary: &SessionSummary) -> String {
        Self::format_json(summary)
    }

    fn format_brief(&self, summary: &SessionSummary) -> String {
        Self::format_brief(summary)
    }
}
