//! Interactive ledger shell
//!
//! Reads commands and prompted field values line by line, builds payloads,
//! and drives the ledger. Generic over its input and output so it can be
//! scripted.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

use super::command::{Command, ParseOutcome, HELP_TEXT};
use crate::constants::MAX_CONFIGURED_DIFFICULTY;
use crate::display::{render_json, render_text};
use crate::node::Ledger;
use crate::storage::StorageError;
use crate::validation::{
    not_applicable, read_amount, validate_id, DiagnosisCode, EventKind, Identifier, InputError,
    Notes, Payload,
};

/// Notes recorded with every premium payment
pub const PAYMENT_NOTES: &str = "Premium payment received";

/// Provider recorded with every premium payment
pub const PAYMENT_PROVIDER: &str = "INSURER";

/// How the shell gets its first chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Mine a new genesis block at this difficulty
    Fresh(u32),
    /// Load the data file, falling back to a fresh chain at this difficulty
    Load(u32),
}

/// Result of a single prompt
enum Answer<T> {
    Value(T),
    Rejected,
    Eof,
}

pub struct Shell<R, W> {
    ledger: Ledger,
    data_file: PathBuf,
    /// Set when the data file exists but could not be loaded. The implicit
    /// save on exit is skipped so the file is never replaced unseen.
    keep_data_file: bool,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(ledger: Ledger, data_file: PathBuf, input: R, out: W) -> Self {
        Self {
            ledger,
            data_file,
            keep_data_file: false,
            input,
            out,
        }
    }

    pub fn into_parts(self) -> (Ledger, W) {
        (self.ledger, self.out)
    }

    /// Bring up the first chain and print the banner
    pub fn boot(&mut self, startup: Startup) -> io::Result<()> {
        writeln!(self.out, "=== HEALTH INSURANCE BLOCKCHAIN SYSTEM ===")?;
        let difficulty = match startup {
            Startup::Fresh(d) => d,
            Startup::Load(d) => {
                self.load()?;
                if self.ledger.is_initialized() {
                    return self.help();
                }
                d
            }
        };
        writeln!(self.out, "Initializing blockchain with difficulty {difficulty}...\n")?;
        if let Err(err) = self.ledger.initialize(difficulty) {
            writeln!(self.out, "Error: {err}")?;
        }
        self.help()
    }

    /// Process commands until `exit` or end of input; both save the ledger
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                writeln!(self.out)?;
                return self.exit();
            };
            match Command::parse(&line) {
                Ok(Command::Exit) => return self.exit(),
                Ok(command) => self.dispatch(command)?,
                Err(ParseOutcome::Empty) => {}
                Err(outcome) => writeln!(self.out, "{outcome}")?,
            }
        }
    }

    /// Execute one command
    pub fn dispatch(&mut self, command: Command) -> io::Result<()> {
        debug!(?command, "dispatch");
        match command {
            Command::Enroll => self.enroll(),
            Command::Pay => self.pay(),
            Command::Preauth => self.event_with_amount(
                EventKind::PreauthRequest,
                "Enter Estimated Amount: $",
                "Enter Notes: ",
            ),
            Command::ClaimSubmit => self.event_with_amount(
                EventKind::ClaimSubmission,
                "Enter Claim Amount: $",
                "Enter Notes: ",
            ),
            Command::ClaimDecide => self.event_with_amount(
                EventKind::ClaimDecision,
                "Enter Approved Amount: $",
                "Enter Decision Notes (APPROVED/DENIED/PARTIAL): ",
            ),
            Command::View => self.view(),
            Command::ViewJson => self.view_json(),
            Command::Verify => self.verify(),
            Command::Save => self.save(),
            Command::Load => self.load(),
            Command::Help => self.help(),
            Command::Exit => self.exit(),
        }
    }

    fn enroll(&mut self) -> io::Result<()> {
        let Answer::Value((policy, member, provider)) = self.ask_parties()? else {
            return Ok(());
        };
        let Answer::Value(notes) = self.ask_notes("Enter Notes: ")? else {
            return Ok(());
        };
        let payload = Payload::new(EventKind::Enrollment, policy, member, provider).with_notes(notes);
        self.append(payload)
    }

    fn pay(&mut self) -> io::Result<()> {
        let Answer::Value(policy) = self.ask_id("Enter Policy ID: ")? else {
            return Ok(());
        };
        let Answer::Value(member) = self.ask_id("Enter Member ID: ")? else {
            return Ok(());
        };
        let Answer::Value(amount) = self.ask_amount("Enter Payment Amount: $")? else {
            return Ok(());
        };
        let payload = Payload::new(
            EventKind::PremiumPayment,
            policy,
            member,
            fixed(PAYMENT_PROVIDER),
        )
        .with_amount(amount)
        .with_notes(fixed(PAYMENT_NOTES));
        self.append(payload)
    }

    fn event_with_amount(
        &mut self,
        kind: EventKind,
        amount_prompt: &str,
        notes_prompt: &str,
    ) -> io::Result<()> {
        let Answer::Value((policy, member, provider)) = self.ask_parties()? else {
            return Ok(());
        };
        let Answer::Value(amount) = self.ask_amount(amount_prompt)? else {
            return Ok(());
        };
        let Answer::Value(diagnosis) = self.ask_diagnosis()? else {
            return Ok(());
        };
        let Answer::Value(notes) = self.ask_notes(notes_prompt)? else {
            return Ok(());
        };
        let payload = Payload::new(kind, policy, member, provider)
            .with_amount(amount)
            .with_diagnosis(diagnosis)
            .with_notes(notes);
        self.append(payload)
    }

    fn append(&mut self, payload: Payload) -> io::Result<()> {
        let Some(next) = self.ledger.chain().map(|c| c.len()) else {
            return writeln!(self.out, "Error: Blockchain not initialized");
        };
        writeln!(self.out, "Mining block {next}...")?;
        match self.ledger.append(payload) {
            Ok(block) => {
                let digest = block.digest.clone();
                writeln!(self.out, "Block mined! Hash: {digest}")
            }
            Err(err) => writeln!(self.out, "Error: {err}"),
        }
    }

    fn view(&mut self) -> io::Result<()> {
        match self.ledger.chain() {
            Some(chain) => {
                let text = render_text(chain);
                write!(self.out, "{text}")
            }
            None => writeln!(self.out, "Blockchain is empty"),
        }
    }

    fn view_json(&mut self) -> io::Result<()> {
        let Some(chain) = self.ledger.chain() else {
            return writeln!(self.out, "Blockchain is empty");
        };
        match render_json(chain) {
            Ok(json) => writeln!(self.out, "{json}"),
            Err(err) => writeln!(self.out, "Error: could not render view: {err}"),
        }
    }

    fn verify(&mut self) -> io::Result<()> {
        match self.ledger.verify() {
            Ok(blocks) => writeln!(
                self.out,
                "Blockchain verified successfully! All {blocks} blocks are valid."
            ),
            Err(err) => writeln!(self.out, "{err}"),
        }
    }

    fn save(&mut self) -> io::Result<()> {
        match self.ledger.save(&self.data_file) {
            Ok(_) => {
                self.keep_data_file = false;
                writeln!(self.out, "Blockchain saved to {}", self.data_file.display())
            }
            Err(err) => writeln!(self.out, "Error: save failed: {err}"),
        }
    }

    fn load(&mut self) -> io::Result<()> {
        match self.ledger.load(&self.data_file) {
            Ok(report) => {
                writeln!(
                    self.out,
                    "Blockchain loaded from {} ({} blocks)",
                    self.data_file.display(),
                    report.blocks
                )?;
                self.keep_data_file = false;
                if let Err(err) = report.integrity {
                    writeln!(self.out, "Warning: {err}")?;
                }
                self.warn_stored_difficulty()
            }
            Err(StorageError::FileNotFound(_)) => {
                writeln!(self.out, "No existing blockchain found. Starting fresh.")
            }
            Err(err) => {
                self.keep_data_file = true;
                writeln!(self.out, "Error: load failed: {err}")?;
                writeln!(
                    self.out,
                    "Warning: {} will not be overwritten on exit; use 'save' to replace it",
                    self.data_file.display()
                )
            }
        }
    }

    fn warn_stored_difficulty(&mut self) -> io::Result<()> {
        let Some(difficulty) = self.ledger.chain().map(|c| c.difficulty()) else {
            return Ok(());
        };
        if difficulty > MAX_CONFIGURED_DIFFICULTY {
            writeln!(
                self.out,
                "Warning: stored difficulty {difficulty} exceeds {MAX_CONFIGURED_DIFFICULTY}; \
                 the next block may take very long to mine"
            )?;
        }
        Ok(())
    }

    fn help(&mut self) -> io::Result<()> {
        writeln!(self.out, "{HELP_TEXT}")
    }

    fn exit(&mut self) -> io::Result<()> {
        if self.keep_data_file {
            writeln!(
                self.out,
                "Not saving: {} could not be loaded and is left untouched.",
                self.data_file.display()
            )?;
        } else if self.ledger.is_initialized() {
            writeln!(self.out, "Saving blockchain before exit...")?;
            self.save()?;
        }
        self.out.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        self.read_line()
    }

    fn reject(&mut self, err: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "Error: {err}")
    }

    fn ask_id(&mut self, prompt: &str) -> io::Result<Answer<Identifier>> {
        let Some(raw) = self.prompt(prompt)? else {
            return Ok(Answer::Eof);
        };
        let raw = raw.trim();
        if let Err(err) = validate_id(raw) {
            self.reject(err)?;
            return Ok(Answer::Rejected);
        }
        match Identifier::new(raw) {
            Ok(id) => Ok(Answer::Value(id)),
            Err(err) => {
                self.reject(err)?;
                Ok(Answer::Rejected)
            }
        }
    }

    /// Policy, member and provider ids, in that order
    fn ask_parties(&mut self) -> io::Result<Answer<(Identifier, Identifier, Identifier)>> {
        let policy = match self.ask_id("Enter Policy ID: ")? {
            Answer::Value(v) => v,
            Answer::Rejected => return Ok(Answer::Rejected),
            Answer::Eof => return Ok(Answer::Eof),
        };
        let member = match self.ask_id("Enter Member ID: ")? {
            Answer::Value(v) => v,
            Answer::Rejected => return Ok(Answer::Rejected),
            Answer::Eof => return Ok(Answer::Eof),
        };
        let provider = match self.ask_id("Enter Provider ID: ")? {
            Answer::Value(v) => v,
            Answer::Rejected => return Ok(Answer::Rejected),
            Answer::Eof => return Ok(Answer::Eof),
        };
        Ok(Answer::Value((policy, member, provider)))
    }

    fn ask_amount(&mut self, prompt: &str) -> io::Result<Answer<f64>> {
        let Some(raw) = self.prompt(prompt)? else {
            return Ok(Answer::Eof);
        };
        match read_amount(&raw) {
            Ok(amount) => Ok(Answer::Value(amount)),
            Err(err) => {
                self.reject(err)?;
                Ok(Answer::Rejected)
            }
        }
    }

    fn ask_diagnosis(&mut self) -> io::Result<Answer<DiagnosisCode>> {
        let Some(raw) = self.prompt("Enter Diagnosis Code: ")? else {
            return Ok(Answer::Eof);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Answer::Value(not_applicable()));
        }
        match DiagnosisCode::new(raw) {
            Ok(code) => Ok(Answer::Value(code)),
            Err(_) => {
                self.reject(InputError::TooLong {
                    field: "Diagnosis code",
                    max: DiagnosisCode::MAX_LEN,
                })?;
                Ok(Answer::Rejected)
            }
        }
    }

    fn ask_notes(&mut self, prompt: &str) -> io::Result<Answer<Notes>> {
        let Some(raw) = self.prompt(prompt)? else {
            return Ok(Answer::Eof);
        };
        match Notes::new(raw.trim()) {
            Ok(notes) => Ok(Answer::Value(notes)),
            Err(_) => {
                self.reject(InputError::TooLong {
                    field: "Notes",
                    max: Notes::MAX_LEN,
                })?;
                Ok(Answer::Rejected)
            }
        }
    }
}

/// Bounded text from a constant known to fit
fn fixed<const CAP: usize>(text: &str) -> crate::validation::FixedText<CAP> {
    crate::validation::FixedText::new(text).unwrap_or_default()
}
