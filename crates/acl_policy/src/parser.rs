//! Parsers for the three source file sub-languages.
//!
//! All three share one lexer (see [`crate::lexer`]). Host and port files
//! are flat token sequences; policy files are sequences of rule statements:
//!
//! ```text
//! allow tcp src any dst @db-servers port 5432 log stateful
//! deny tcpudp src @guests dst 10.0.0.0/8 expire 20261231
//! ```
//!
//! Trailing rule options (`log`, `mirror`, `expire <date>`, `stateful`)
//! may appear in any order, each at most once.

use crate::error::{Error, Result};
use crate::lexer::{lex, Token, TokenKind};
use crate::model::{
    Action, HostEntry, HostObject, PortEntry, PortObject, PortSpec, Reference, Rule, RuleSet,
    Target,
};
use chrono::NaiveDate;

/// Parses a host object file.
///
/// Entries are dotted-quad addresses (optionally `/prefix`) or `@`
/// references to other host objects.
///
/// # Errors
///
/// Returns an error if the input fails to lex or contains a token that is
/// neither an address nor a reference.
///
/// # Example
///
/// ```rust
/// use acl_policy::parse_hosts;
///
/// let hosts = parse_hosts("10.1.1.10 10.1.1.11 @other-dc").unwrap();
/// assert_eq!(hosts.entries.len(), 3);
/// ```
pub fn parse_hosts(input: &str) -> Result<HostObject> {
    let tokens = lex(input)?;
    let mut entries = Vec::with_capacity(tokens.len());

    for token in tokens {
        match token.kind {
            TokenKind::Address => entries.push(HostEntry::Address(token.text)),
            TokenKind::Object => entries.push(HostEntry::Group(strip_sigil(&token.text))),
            _ => {
                return Err(Error::Parse {
                    line: token.line,
                    reason: format!("expected an address or @reference, found `{}`", token.text),
                })
            }
        }
    }

    Ok(HostObject { entries })
}

/// Parses a port object file.
///
/// Entries are port numbers, ranges, service names, or `@` references to
/// other port objects.
///
/// # Errors
///
/// Returns an error if the input fails to lex or contains a token that is
/// not a port, service name, or reference.
pub fn parse_ports(input: &str) -> Result<PortObject> {
    let tokens = lex(input)?;
    let mut entries = Vec::with_capacity(tokens.len());

    for token in tokens {
        match token.kind {
            TokenKind::Port | TokenKind::Ident => entries.push(PortEntry::Literal(token.text)),
            TokenKind::Object => entries.push(PortEntry::Group(strip_sigil(&token.text))),
            _ => {
                return Err(Error::Parse {
                    line: token.line,
                    reason: format!(
                        "expected a port, service name or @reference, found `{}`",
                        token.text
                    ),
                })
            }
        }
    }

    Ok(PortObject { entries })
}

/// Parses a policy file into an ordered [`RuleSet`].
///
/// # Errors
///
/// Returns an error if the input fails to lex, a statement does not match
/// the rule grammar, an option repeats, or an `expire` date is not a real
/// calendar date.
///
/// # Example
///
/// ```rust
/// use acl_policy::parse_rules;
///
/// let set = parse_rules("allow tcp src any dst @web port 443 stateful").unwrap();
/// assert_eq!(set.rules.len(), 1);
/// assert!(set.rules[0].stateful);
/// ```
pub fn parse_rules(input: &str) -> Result<RuleSet> {
    let tokens = lex(input)?;
    let mut parser = RuleParser { tokens, pos: 0 };
    let mut rules = Vec::new();

    while !parser.at_end() {
        rules.push(parser.parse_rule()?);
    }

    Ok(RuleSet { rules })
}

fn strip_sigil(text: &str) -> String {
    text.strip_prefix('@').unwrap_or(text).to_string()
}

/// Cursor over the token stream for rule parsing.
struct RuleParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl RuleParser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Consumes and returns the next token, or fails naming what was
    /// expected.
    fn next_or(&mut self, expected: &str) -> Result<Token> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token.clone())
            }
            None => Err(Error::Parse {
                line: self.tokens.last().map_or(1, |t| t.line),
                reason: format!("unexpected end of input, expected {expected}"),
            }),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.tokens
            .get(self.pos)
            .is_some_and(|t| t.kind == TokenKind::Ident && t.text == keyword)
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let token = self.next_or(&format!("`{keyword}`"))?;
        if token.kind == TokenKind::Ident && token.text == keyword {
            Ok(())
        } else {
            Err(Error::Parse {
                line: token.line,
                reason: format!("expected `{keyword}`, found `{}`", token.text),
            })
        }
    }

    fn parse_rule(&mut self) -> Result<Rule> {
        let action = self.parse_action()?;
        let protocol = self.parse_protocol()?;

        let mut any_qualifier = false;
        while self.peek_keyword("any") {
            self.pos += 1;
            any_qualifier = true;
        }

        self.expect_keyword("src")?;
        let source = self.parse_reference()?;
        self.expect_keyword("dst")?;
        let destination = self.parse_reference()?;

        let mut rule = Rule::new(action, protocol, source, destination);
        rule.any_qualifier = any_qualifier;
        self.parse_options(&mut rule)?;

        Ok(rule)
    }

    fn parse_action(&mut self) -> Result<Action> {
        let token = self.next_or("`allow` or `deny`")?;
        match (token.kind, token.text.as_str()) {
            (TokenKind::Ident, "allow") => Ok(Action::Allow),
            (TokenKind::Ident, "deny") => Ok(Action::Deny),
            _ => Err(Error::Parse {
                line: token.line,
                reason: format!("expected `allow` or `deny`, found `{}`", token.text),
            }),
        }
    }

    fn parse_protocol(&mut self) -> Result<String> {
        let token = self.next_or("a protocol")?;
        if token.kind == TokenKind::Ident {
            Ok(token.text)
        } else {
            Err(Error::Parse {
                line: token.line,
                reason: format!("expected a protocol, found `{}`", token.text),
            })
        }
    }

    fn parse_reference(&mut self) -> Result<Reference> {
        let token = self.next_or("an address, @reference or `any`")?;
        let target = match token.kind {
            TokenKind::Ident if token.text == "any" => Target::Any,
            TokenKind::Ident | TokenKind::Address => Target::Literal(token.text),
            TokenKind::Object => Target::Group(strip_sigil(&token.text)),
            _ => {
                return Err(Error::Parse {
                    line: token.line,
                    reason: format!(
                        "expected an address, @reference or `any`, found `{}`",
                        token.text
                    ),
                })
            }
        };

        let port = if self.peek_keyword("port") {
            self.pos += 1;
            let token = self.next_or("a port, @reference or `any`")?;
            match token.kind {
                TokenKind::Ident if token.text == "any" => PortSpec::Any,
                TokenKind::Port => PortSpec::Literal(token.text),
                TokenKind::Object => PortSpec::Group(strip_sigil(&token.text)),
                _ => {
                    return Err(Error::Parse {
                        line: token.line,
                        reason: format!(
                            "expected a port, @reference or `any`, found `{}`",
                            token.text
                        ),
                    })
                }
            }
        } else {
            PortSpec::Any
        };

        Ok(Reference { target, port })
    }

    /// Consumes trailing rule options until the next rule or end of input.
    fn parse_options(&mut self, rule: &mut Rule) -> Result<()> {
        loop {
            let Some(token) = self.tokens.get(self.pos) else {
                return Ok(());
            };
            if token.kind != TokenKind::Ident {
                return Err(Error::Parse {
                    line: token.line,
                    reason: format!("expected a rule option, found `{}`", token.text),
                });
            }
            let line = token.line;
            let option = token.text.clone();

            match option.as_str() {
                "allow" | "deny" => return Ok(()),
                "log" => {
                    self.pos += 1;
                    set_flag(&mut rule.log, "log", line)?;
                }
                "mirror" => {
                    self.pos += 1;
                    set_flag(&mut rule.mirror, "mirror", line)?;
                }
                "stateful" => {
                    self.pos += 1;
                    set_flag(&mut rule.stateful, "stateful", line)?;
                }
                "expire" => {
                    self.pos += 1;
                    if rule.expire.is_some() {
                        return Err(Error::DuplicateOption { line, option });
                    }
                    rule.expire = Some(self.parse_date()?);
                }
                _ => {
                    return Err(Error::Parse {
                        line,
                        reason: format!("expected a rule option, found `{option}`"),
                    });
                }
            }
        }
    }

    fn parse_date(&mut self) -> Result<NaiveDate> {
        let token = self.next_or("a YYYYMMDD date")?;
        if token.kind != TokenKind::Date {
            return Err(Error::Parse {
                line: token.line,
                reason: format!("expected a YYYYMMDD date, found `{}`", token.text),
            });
        }
        NaiveDate::parse_from_str(&token.text, "%Y%m%d").map_err(|_| Error::InvalidDate {
            line: token.line,
            value: token.text,
        })
    }
}

fn set_flag(flag: &mut bool, option: &str, line: usize) -> Result<()> {
    if *flag {
        return Err(Error::DuplicateOption {
            line,
            option: option.to_string(),
        });
    }
    *flag = true;
    Ok(())
}
