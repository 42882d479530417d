//! Line-oriented command language for driving a session registry.
//!
//! ```text
//! # comments and blank lines are ignored
//! admin create                  # -> session id
//! alice nominate 0 alice
//! admin open 0
//! v1 vote 0 alice
//! admin close 0
//! votes 0 alice
//! winners 0
//! candidates 0
//! phase 0
//! show 0                        # JSON view of the session
//! sessions
//! advance 121                   # simulated clock only
//! now
//! ```
//!
//! Mutating commands start with the caller's account id; queries start with
//! the query keyword. Query keywords therefore cannot be used as caller names.

use agora_types::{AccountId, ParseError, SessionId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("{command}: expected {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("invalid number of seconds: {0:?}")]
    InvalidSeconds(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Create {
        caller: AccountId,
    },
    Nominate {
        caller: AccountId,
        session: SessionId,
        candidate: AccountId,
    },
    Open {
        caller: AccountId,
        session: SessionId,
    },
    Vote {
        caller: AccountId,
        session: SessionId,
        candidate: AccountId,
    },
    Close {
        caller: AccountId,
        session: SessionId,
    },
    Votes {
        session: SessionId,
        candidate: AccountId,
    },
    Winners {
        session: SessionId,
    },
    Candidates {
        session: SessionId,
    },
    Phase {
        session: SessionId,
    },
    Show {
        session: SessionId,
    },
    Sessions,
    Advance {
        secs: u64,
    },
    Now,
}

fn expect_args<'a>(
    command: &'static str,
    args: &'a [&'a str],
    expected: usize,
) -> Result<&'a [&'a str], CommandError> {
    if args.len() != expected {
        return Err(CommandError::Arity {
            command,
            expected,
            got: args.len(),
        });
    }
    Ok(args)
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = match line.split_once('#') {
        Some((code, _comment)) => code,
        None => line,
    };
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match head {
        "votes" => {
            let args = expect_args("votes", rest, 2)?;
            Command::Votes {
                session: args[0].parse()?,
                candidate: args[1].parse()?,
            }
        }
        "winners" => Command::Winners {
            session: expect_args("winners", rest, 1)?[0].parse()?,
        },
        "candidates" => Command::Candidates {
            session: expect_args("candidates", rest, 1)?[0].parse()?,
        },
        "phase" => Command::Phase {
            session: expect_args("phase", rest, 1)?[0].parse()?,
        },
        "show" => Command::Show {
            session: expect_args("show", rest, 1)?[0].parse()?,
        },
        "sessions" => {
            expect_args("sessions", rest, 0)?;
            Command::Sessions
        }
        "now" => {
            expect_args("now", rest, 0)?;
            Command::Now
        }
        "advance" => {
            let raw = expect_args("advance", rest, 1)?[0];
            Command::Advance {
                secs: raw
                    .parse()
                    .map_err(|_| CommandError::InvalidSeconds(raw.to_string()))?,
            }
        }
        caller => parse_call(caller.parse()?, rest)?,
    };
    Ok(Some(command))
}

fn parse_call(caller: AccountId, tokens: &[&str]) -> Result<Command, CommandError> {
    let Some((&verb, args)) = tokens.split_first() else {
        return Err(CommandError::Unknown(caller.to_string()));
    };
    let command = match verb {
        "create" => {
            expect_args("create", args, 0)?;
            Command::Create { caller }
        }
        "nominate" => {
            let args = expect_args("nominate", args, 2)?;
            Command::Nominate {
                caller,
                session: args[0].parse()?,
                candidate: args[1].parse()?,
            }
        }
        "open" => Command::Open {
            caller,
            session: expect_args("open", args, 1)?[0].parse()?,
        },
        "vote" => {
            let args = expect_args("vote", args, 2)?;
            Command::Vote {
                caller,
                session: args[0].parse()?,
                candidate: args[1].parse()?,
            }
        }
        "close" => Command::Close {
            caller,
            session: expect_args("close", args, 1)?[0].parse()?,
        },
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> AccountId {
        AccountId::from(name)
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# setup"), Ok(None));
    }

    #[test]
    fn parses_calls_with_caller_first() {
        assert_eq!(
            parse_line("v1 vote 3 alice"),
            Ok(Some(Command::Vote {
                caller: account("v1"),
                session: SessionId::new(3),
                candidate: account("alice"),
            }))
        );
        assert_eq!(
            parse_line("admin create  # first session"),
            Ok(Some(Command::Create {
                caller: account("admin")
            }))
        );
        assert_eq!(
            parse_line("bob nominate 0 carol"),
            Ok(Some(Command::Nominate {
                caller: account("bob"),
                session: SessionId::FIRST,
                candidate: account("carol"),
            }))
        );
    }

    #[test]
    fn parses_queries() {
        assert_eq!(
            parse_line("winners 2"),
            Ok(Some(Command::Winners {
                session: SessionId::new(2)
            }))
        );
        assert_eq!(
            parse_line("votes 0 alice"),
            Ok(Some(Command::Votes {
                session: SessionId::FIRST,
                candidate: account("alice"),
            }))
        );
        assert_eq!(parse_line("advance 121"), Ok(Some(Command::Advance { secs: 121 })));
        assert_eq!(parse_line("sessions"), Ok(Some(Command::Sessions)));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse_line("winners"),
            Err(CommandError::Arity { command: "winners", expected: 1, got: 0 })
        ));
        assert!(matches!(parse_line("admin explode 0"), Err(CommandError::Unknown(_))));
        assert!(matches!(parse_line("admin"), Err(CommandError::Unknown(_))));
        assert!(matches!(parse_line("admin open x"), Err(CommandError::Parse(_))));
        assert!(matches!(parse_line("advance soon"), Err(CommandError::InvalidSeconds(_))));
    }
}
