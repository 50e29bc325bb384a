//! Commit message parsing.
//!
//! Header format: `<type>(<scope>)!: <subject>`. Messages that do not follow
//! it still parse; `commit_type` is then `None` and the whole first line
//! becomes the subject.

use changeplan_core::{Author, BreakingChange, CommitType, ReferenceKind};

const REVERT_MARKER: &str = "This reverts commit ";
const CHERRY_PICK_MARKER: &str = "(cherry picked from commit ";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedMessage {
    /// `None` when the header is not a conventional commit header.
    pub commit_type: Option<CommitType>,
    pub scope: Option<String>,
    pub subject: String,
    pub body: Option<String>,
    pub breaking: Vec<BreakingChange>,
    pub references: Vec<(ReferenceKind, String)>,
    pub co_authors: Vec<Author>,
    pub revert_of: Option<String>,
    pub cherry_pick_of: Option<String>,
}

impl ParsedMessage {
    #[must_use]
    pub fn is_conventional(&self) -> bool {
        self.commit_type.is_some()
    }

    #[must_use]
    pub fn is_revert(&self) -> bool {
        self.commit_type == Some(CommitType::Revert) || self.revert_of.is_some()
    }
}

struct Header<'a> {
    keyword: &'a str,
    scope: Option<&'a str>,
    bang: bool,
    subject: &'a str,
}

fn parse_header(line: &str) -> Option<Header<'_>> {
    use winnow::ascii::{alphanumeric1, space0};
    use winnow::combinator::{opt, preceded, terminated};
    use winnow::prelude::*;
    use winnow::token::take_till;

    let mut parser = (
        alphanumeric1::<_, ()>,
        opt(preceded('(', terminated(take_till(0.., ')'), ')'))),
        opt('!'),
        ':',
        space0,
        take_till(0.., ['\n', '\r']),
    );

    let (keyword, scope, bang, _, _, subject) = parser.parse(line).ok()?;

    Some(Header {
        keyword,
        scope,
        bang: bang.is_some(),
        subject,
    })
}

/// Extracts the quoted subject of a `Revert "..."` header produced by `git revert`.
fn git_revert_subject(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("Revert \"")?;
    Some(inner.strip_suffix('"').unwrap_or(inner))
}

/// Splits a trailing ` (#123)` pull request suffix off a subject.
fn split_pull_request_suffix(subject: &str) -> (&str, Option<&str>) {
    let trimmed = subject.trim_end();
    let Some(without_paren) = trimmed.strip_suffix(')') else {
        return (trimmed, None);
    };
    let Some(open) = without_paren.rfind("(#") else {
        return (trimmed, None);
    };
    let id = &without_paren[open + 2..];
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return (trimmed, None);
    }
    (without_paren[..open].trim_end(), Some(id))
}

enum Trailer<'a> {
    Breaking(&'a str),
    CoAuthor(&'a str),
    Reference(ReferenceKind, &'a str),
    Other,
}

fn reference_kind(key: &str) -> Option<ReferenceKind> {
    match key.to_ascii_lowercase().as_str() {
        "close" | "closes" | "closed" | "resolve" | "resolves" | "resolved" => {
            Some(ReferenceKind::Closes)
        }
        "fix" | "fixes" | "fixed" => Some(ReferenceKind::Fixes),
        "ref" | "refs" | "references" | "see" => Some(ReferenceKind::Refs),
        _ => None,
    }
}

fn parse_trailer(line: &str) -> Option<Trailer<'_>> {
    for token in ["BREAKING CHANGE", "BREAKING-CHANGE"] {
        if line.len() > token.len()
            && line.is_char_boundary(token.len())
            && line[..token.len()].eq_ignore_ascii_case(token)
        {
            if let Some(value) = line[token.len()..].strip_prefix(':') {
                return Some(Trailer::Breaking(value.trim()));
            }
        }
    }

    if let Some((key, value)) = line.split_once(':') {
        let key = key.trim();
        let is_token = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if is_token {
            let value = value.trim();
            if key.eq_ignore_ascii_case("co-authored-by") {
                return Some(Trailer::CoAuthor(value));
            }
            if let Some(kind) = reference_kind(key) {
                return Some(Trailer::Reference(kind, value));
            }
            return Some(Trailer::Other);
        }
    }

    // git-style "Closes #12"
    let (key, _) = line.split_once(" #")?;
    let kind = reference_kind(key.trim())?;
    Some(Trailer::Reference(kind, line[key.len()..].trim()))
}

fn parse_author(value: &str) -> Author {
    match value.split_once('<') {
        Some((name, rest)) => {
            let email = rest.trim_end().trim_end_matches('>').trim();
            let author = Author::new(name.trim());
            if email.is_empty() {
                author
            } else {
                author.with_email(email)
            }
        }
        None => Author::new(value.trim()),
    }
}

fn reference_ids(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|token| token.trim().trim_start_matches('#'))
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

fn extract_sha(rest: &str) -> Option<String> {
    let sha: String = rest.chars().take_while(char::is_ascii_hexdigit).collect();
    (!sha.is_empty()).then_some(sha)
}

/// Parses a full commit message. Never fails.
#[must_use]
pub fn parse_message(message: &str) -> ParsedMessage {
    let trimmed = message.trim();
    let (first_line, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
    let first_line = first_line.trim();

    let mut parsed = ParsedMessage {
        subject: first_line.to_string(),
        ..ParsedMessage::default()
    };
    let mut bang = false;

    if let Some(inner) = git_revert_subject(first_line) {
        parsed.commit_type = Some(CommitType::Revert);
        parsed.subject = inner.to_string();
    } else if let Some(header) = parse_header(first_line) {
        let commit_type = CommitType::from_keyword(header.keyword);
        let subject = header.subject.trim();
        if commit_type.is_some() && !subject.is_empty() {
            parsed.commit_type = commit_type;
            parsed.scope = header
                .scope
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string);
            parsed.subject = subject.to_string();
            bang = header.bang;
        }
    }

    let (subject, pull_request) = split_pull_request_suffix(&parsed.subject);
    if let Some(id) = pull_request {
        parsed
            .references
            .push((ReferenceKind::PullRequest, id.to_string()));
        parsed.subject = subject.to_string();
    }

    parse_body(rest, &mut parsed);

    if bang && parsed.breaking.is_empty() {
        parsed.breaking.push(BreakingChange {
            summary: parsed.subject.clone(),
            notes: None,
        });
    }

    parsed
}

fn parse_body(rest: &str, parsed: &mut ParsedMessage) {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in rest.lines() {
        let line = line.trim_end();
        let marker_line = line.trim();

        if let Some(after) = marker_line.strip_prefix(REVERT_MARKER) {
            parsed.revert_of = extract_sha(after);
            continue;
        }
        if let Some(after) = marker_line.strip_prefix(CHERRY_PICK_MARKER) {
            parsed.cherry_pick_of = extract_sha(after);
            continue;
        }

        if marker_line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    let mut body_paragraphs = Vec::new();
    let last = paragraphs.len().saturating_sub(1);

    for (index, paragraph) in paragraphs.into_iter().enumerate() {
        let starts_with_trailer = paragraph
            .first()
            .is_some_and(|line| parse_trailer(line.trim()).is_some());
        let footer_start = if starts_with_trailer {
            Some(0)
        } else if index == last {
            // footers may follow prose in the final paragraph without a blank line
            paragraph.iter().position(|line| {
                matches!(
                    parse_trailer(line.trim()),
                    Some(Trailer::Breaking(_) | Trailer::CoAuthor(_) | Trailer::Reference(..))
                )
            })
        } else {
            None
        };
        let Some(footer_start) = footer_start else {
            body_paragraphs.push(paragraph.join("\n"));
            continue;
        };

        let (prose, footer) = paragraph.split_at(footer_start);
        if !prose.is_empty() {
            body_paragraphs.push(prose.join("\n"));
        }
        parse_footer(footer, parsed, &mut body_paragraphs);
    }

    let body = body_paragraphs.join("\n\n");
    parsed.body = (!body.trim().is_empty()).then(|| body.trim().to_string());
}

fn parse_footer(lines: &[&str], parsed: &mut ParsedMessage, body_paragraphs: &mut Vec<String>) {
    let mut active_breaking: Option<usize> = None;
    for line in lines {
        let line = line.trim();
        match parse_trailer(line) {
            Some(Trailer::Breaking(summary)) => {
                parsed.breaking.push(BreakingChange {
                    summary: summary.to_string(),
                    notes: None,
                });
                active_breaking = Some(parsed.breaking.len() - 1);
            }
            Some(Trailer::CoAuthor(value)) => {
                parsed.co_authors.push(parse_author(value));
                active_breaking = None;
            }
            Some(Trailer::Reference(kind, value)) => {
                parsed
                    .references
                    .extend(reference_ids(value).map(|id| (kind, id)));
                active_breaking = None;
            }
            Some(Trailer::Other) => active_breaking = None,
            None => match active_breaking {
                Some(index) => {
                    let notes = parsed.breaking[index].notes.get_or_insert_with(String::new);
                    if !notes.is_empty() {
                        notes.push('\n');
                    }
                    notes.push_str(line);
                }
                None => body_paragraphs.push(line.to_string()),
            },
        }
    }
}
