//! Shell command parsing

use std::fmt;

/// One line of shell input, parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Enroll,
    Pay,
    Preauth,
    ClaimSubmit,
    ClaimDecide,
    View,
    ViewJson,
    Verify,
    Save,
    Load,
    Help,
    Exit,
}

/// Why a line did not parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Empty,
    UnknownClaimSubcommand,
    Unknown(String),
}

impl fmt::Display for ParseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseOutcome::Empty => Ok(()),
            ParseOutcome::UnknownClaimSubcommand => {
                f.write_str("Unknown claim subcommand. Use 'submit' or 'decide'")
            }
            ParseOutcome::Unknown(_) => {
                f.write_str("Unknown command. Type 'help' for available commands.")
            }
        }
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseOutcome> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Err(ParseOutcome::Empty);
        };
        let second = words.next();
        let command = match (first, second) {
            ("enroll", _) => Command::Enroll,
            ("pay", _) => Command::Pay,
            ("preauth", _) => Command::Preauth,
            ("claim", Some("submit")) => Command::ClaimSubmit,
            ("claim", Some("decide")) => Command::ClaimDecide,
            ("claim", _) => return Err(ParseOutcome::UnknownClaimSubcommand),
            ("view", Some("json")) => Command::ViewJson,
            ("view", _) => Command::View,
            ("verify", _) => Command::Verify,
            ("save", _) => Command::Save,
            ("load", _) => Command::Load,
            ("help", _) => Command::Help,
            ("exit", _) | ("quit", _) => Command::Exit,
            (other, _) => return Err(ParseOutcome::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

pub const HELP_TEXT: &str = "
=== HEALTH INSURANCE BLOCKCHAIN CLI ===

Commands:
  enroll       - Create new policy/member enrollment
  pay          - Record premium payment
  preauth      - Submit pre-authorization request
  claim submit - Submit insurance claim
  claim decide - Record claim decision
  view         - Display entire blockchain (sensitive data masked)
  view json    - Same as view, as JSON
  verify       - Verify blockchain integrity
  save         - Save blockchain to file
  load         - Load blockchain from file
  help         - Show this help message
  exit         - Save and exit program
";
