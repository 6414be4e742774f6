use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use attest_api::client::AssessmentApi;
use attest_api::http::HttpAssessmentApi;
use attest_api::types::AssessmentProfile;
use attest_engine::draft::{DraftKey, DraftStore, SqliteDraftStore};
use attest_engine::error::EngineError;
use attest_engine::response::{PhaseStatus, QualitativeStatus, QuantitativeStatus};
use attest_engine::round::{RoundHandoff, RoundManager};
use attest_engine::session::{Advance, SessionController};

use crate::config::CliConfig;
use crate::error::CliError;

const QUANTITATIVE_CHOICES: &str =
    "y=fulfilled, n=unfulfilled, na=not applicable, c=needs consultation";
const QUALITATIVE_CHOICES: &str = "c=needs consultation, na=not applicable";
const COMMANDS: &str = "next (or empty line), back, comment <text>, attach <path>, detach, submit, quit";

/// Wires the HTTP backend and the on-disk draft store into assessment runs
pub struct AssessmentRunner {
    api: Arc<dyn AssessmentApi>,
    drafts: Arc<dyn DraftStore>,
}

impl AssessmentRunner {
    pub fn from_config(config: &CliConfig) -> Result<Self, CliError> {
        let api = HttpAssessmentApi::new(&config.backend.base_url)?;
        let drafts = SqliteDraftStore::open(&config.storage.drafts_path)?;
        Ok(AssessmentRunner {
            api: Arc::new(api),
            drafts: Arc::new(drafts),
        })
    }

    /// Run one full diagnosis round: registration check, both question
    /// phases and the final completion call
    pub async fn run_round(
        &self,
        system_id: i64,
        user_id: i64,
        profile_path: Option<&Path>,
    ) -> Result<(), CliError> {
        let manager = RoundManager::new(
            Arc::clone(&self.api),
            Arc::clone(&self.drafts),
            system_id,
            user_id,
        )?;
        self.ensure_registered(&manager, profile_path).await?;

        let mut quantitative = manager.start_round().await?;
        println!(
            "Diagnosis round {} for system {}",
            quantitative.context().diagnosis_round,
            system_id
        );
        let Some(handoff) = self
            .drive_session(&mut quantitative, parse_quantitative_status, QUANTITATIVE_CHOICES)
            .await?
        else {
            println!("Stopped. Your draft is saved; run again to pick up where you left off.");
            return Ok(());
        };

        let mut qualitative = manager.enter_qualitative(handoff).await?;
        let Some(handoff) = self
            .drive_session(&mut qualitative, parse_qualitative_status, QUALITATIVE_CHOICES)
            .await?
        else {
            println!("Stopped. Your draft is saved; run again to pick up where you left off.");
            return Ok(());
        };

        manager.complete_round(&handoff).await?;
        println!("Diagnosis round {} completed.", handoff.diagnosis_round);
        Ok(())
    }

    /// Print draft presence for both phases of one round
    pub async fn show_status(
        &self,
        system_id: i64,
        user_id: i64,
        round: Option<u32>,
    ) -> Result<(), CliError> {
        let round = match round {
            Some(round) => round,
            None => self.api.next_round(system_id).await?,
        };
        println!("Drafts for system {system_id}, user {user_id}, round {round}:");
        self.print_draft_line::<QuantitativeStatus>(system_id, user_id, round);
        self.print_draft_line::<QualitativeStatus>(system_id, user_id, round);
        Ok(())
    }

    fn print_draft_line<S: PhaseStatus>(&self, system_id: i64, user_id: i64, round: u32) {
        let key = DraftKey::new(system_id, user_id, round, S::PHASE);
        match self.drafts.load(&key) {
            Ok(Some(stored)) => match stored.decode::<S>(&key) {
                Some(saved) => println!(
                    "  {}: {} answers, saved {}",
                    S::PHASE,
                    saved.len(),
                    stored.saved_at.to_rfc3339()
                ),
                None => println!("  {}: unreadable draft", S::PHASE),
            },
            Ok(None) => println!("  {}: no draft", S::PHASE),
            Err(err) => println!("  {}: draft store error ({err})", S::PHASE),
        }
    }

    async fn ensure_registered(
        &self,
        manager: &RoundManager,
        profile_path: Option<&Path>,
    ) -> Result<(), CliError> {
        let profile = match profile_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                serde_json::from_str(&raw)?
            }
            None => AssessmentProfile::default(),
        };

        match manager.ensure_registered(&profile).await {
            Ok(true) => {
                println!("Assessment profile registered.");
                Ok(())
            }
            Ok(false) => Ok(()),
            // First run without a profile file: fall back to the survey
            Err(EngineError::ProfileIncomplete { .. }) if profile_path.is_none() => {
                println!("No assessment registered yet. Answer the profile survey first.");
                let profile = prompt_profile()?;
                manager.ensure_registered(&profile).await?;
                println!("Assessment profile registered.");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Question-by-question loop for one phase
    ///
    /// Returns the round hand-off once the batch is submitted, or `None`
    /// when the user quits with the draft left in place.
    async fn drive_session<S: PhaseStatus>(
        &self,
        session: &mut SessionController<S>,
        parse_status: fn(&str) -> Option<S>,
        choices: &str,
    ) -> Result<Option<RoundHandoff>, CliError> {
        println!();
        println!(
            "=== {} phase: {} questions ({}) ===",
            session.phase(),
            session.total_steps(),
            choices
        );

        loop {
            let step = session.current_step();
            print_question(session);

            let line = read_line("> ")?;
            let input = line.trim();
            let (word, rest) = split_command(input);
            match word {
                "" | "next" => match session.advance()? {
                    Advance::Moved(_) => {}
                    Advance::AtEnd => {
                        println!("Last question reached. Type 'submit' to send the batch.")
                    }
                },
                "back" | "prev" => {
                    session.previous()?;
                }
                "comment" => {
                    if rest.is_empty() {
                        println!("Usage: comment <text>");
                    } else {
                        session.set_comment(step, rest)?;
                        let kept = session
                            .response(step)
                            .map(|r| r.additional_comment == rest)
                            .unwrap_or(false);
                        if !kept {
                            println!("Comments are kept only while the answer asks for consultation.");
                        }
                    }
                }
                "attach" => {
                    if rest.is_empty() {
                        println!("Usage: attach <path>");
                    } else {
                        self.attach(session, step, rest).await;
                    }
                }
                "detach" => {
                    session.clear_attachment(step)?;
                    println!("Attachment removed.");
                }
                "submit" => match session.submit().await {
                    Ok(handoff) => {
                        println!("{} responses submitted.", session.phase());
                        return Ok(Some(handoff));
                    }
                    Err(err @ EngineError::SubmissionFailed { .. }) => {
                        println!("{err}. Your answers are kept; type 'submit' to retry.");
                    }
                    Err(err) => return Err(err.into()),
                },
                "quit" | "exit" => return Ok(None),
                "help" => {
                    println!("Answers: {choices}");
                    println!("Commands: {COMMANDS}");
                }
                _ => match parse_status(word) {
                    Some(status) if rest.is_empty() => session.set_status(step, status)?,
                    _ => {
                        println!("Unrecognized input '{input}'. Answers: {choices}; commands: {COMMANDS}");
                    }
                },
            }
        }
    }

    async fn attach<S: PhaseStatus>(
        &self,
        session: &mut SessionController<S>,
        step: u32,
        raw_path: &str,
    ) {
        let path = Path::new(raw_path);
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            println!("Not a file path: {raw_path}");
            return;
        };
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                println!("Cannot read {raw_path}: {err}");
                return;
            }
        };
        // A rejected or failed upload leaves the previous attachment alone
        match session.attach_file(step, file_name, bytes).await {
            Ok(stored) => println!("Attached {stored}"),
            Err(err) => println!("{err}"),
        }
    }
}

fn print_question<S: PhaseStatus>(session: &SessionController<S>) {
    let step = session.current_step();
    let Some(question) = session.current_question() else {
        return;
    };
    println!();
    println!("[{step}/{}] {}", session.total_steps(), question.prompt);
    if !question.evaluation_criteria.is_empty() {
        println!("  criteria: {}", question.evaluation_criteria);
    }
    if let Some(basis) = &question.legal_basis {
        println!("  legal basis: {basis}");
    }
    if let Some(definition) = &question.indicator_definition {
        println!("  definition: {definition}");
    }
    if let Some(reference) = &question.reference_info {
        println!("  reference: {reference}");
    }
    if let Some(response) = session.response(step) {
        println!("  answer: {}", response.status);
        if !response.additional_comment.is_empty() {
            println!("  comment: {}", response.additional_comment);
        }
        if let Some(attachment) = &response.attachment {
            println!("  attachment: {attachment}");
        }
    }
}

fn prompt_profile() -> Result<AssessmentProfile, CliError> {
    Ok(AssessmentProfile {
        organization: read_line("Organization type: ")?,
        user_group: read_line("User head count bracket: ")?,
        personal_info_system: read_line("Dedicated personal-information system (yes/no): ")?,
        member_info_homepage: read_line("Member data handled via homepage (yes/no): ")?,
        external_data_provision: read_line("Personal data provided externally (yes/no): ")?,
        cctv_operation: read_line("CCTV in operation (yes/no): ")?,
        task_outsourcing: read_line("Personal-data handling outsourced (yes/no): ")?,
        personal_info_disposal: read_line("Disposal process in place (yes/no): ")?,
    })
}

fn read_line(prompt: &str) -> Result<String, CliError> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    let bytes = std::io::stdin().read_line(&mut line)?;
    if bytes == 0 {
        return Err(CliError::Input("standard input closed".to_string()));
    }
    Ok(line.trim().to_string())
}

fn split_command(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn parse_quantitative_status(input: &str) -> Option<QuantitativeStatus> {
    match input {
        "y" | "yes" | "fulfilled" => Some(QuantitativeStatus::Fulfilled),
        "n" | "no" | "unfulfilled" => Some(QuantitativeStatus::Unfulfilled),
        "na" | "not_applicable" => Some(QuantitativeStatus::NotApplicable),
        "c" | "consult" | "needs_consultation" => Some(QuantitativeStatus::NeedsConsultation),
        _ => None,
    }
}

fn parse_qualitative_status(input: &str) -> Option<QualitativeStatus> {
    match input {
        "c" | "consult" | "needs_consultation" => Some(QualitativeStatus::NeedsConsultation),
        "na" | "not_applicable" => Some(QualitativeStatus::NotApplicable),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantitative_status() {
        assert_eq!(
            parse_quantitative_status("y"),
            Some(QuantitativeStatus::Fulfilled)
        );
        assert_eq!(
            parse_quantitative_status("unfulfilled"),
            Some(QuantitativeStatus::Unfulfilled)
        );
        assert_eq!(
            parse_quantitative_status("na"),
            Some(QuantitativeStatus::NotApplicable)
        );
        assert_eq!(
            parse_quantitative_status("c"),
            Some(QuantitativeStatus::NeedsConsultation)
        );
        assert_eq!(parse_quantitative_status("maybe"), None);
    }

    #[test]
    fn test_parse_qualitative_status() {
        assert_eq!(
            parse_qualitative_status("c"),
            Some(QualitativeStatus::NeedsConsultation)
        );
        assert_eq!(
            parse_qualitative_status("na"),
            Some(QualitativeStatus::NotApplicable)
        );
        // The checklist-only answers mean nothing in the survey phase
        assert_eq!(parse_qualitative_status("y"), None);
        assert_eq!(parse_qualitative_status("n"), None);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("attach ./evidence.pdf"), ("attach", "./evidence.pdf"));
        assert_eq!(
            split_command("comment need legal review"),
            ("comment", "need legal review")
        );
        assert_eq!(split_command("submit"), ("submit", ""));
        assert_eq!(split_command(""), ("", ""));
    }
}
