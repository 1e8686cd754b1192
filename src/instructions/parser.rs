use crate::instructions::date::resolve_date;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Instruction {
    Complete { task: String },
    Reschedule { task: String, due: NaiveDate },
    Rename { task: String, new_name: String },
    /// `priority` is the Todoist API value: 4 is P1.
    Prioritize { task: String, priority: u8 },
    Label { task: String, labels: Vec<String> },
}

impl Instruction {
    pub fn task(&self) -> &str {
        match self {
            Instruction::Complete { task }
            | Instruction::Reschedule { task, .. }
            | Instruction::Rename { task, .. }
            | Instruction::Prioritize { task, .. }
            | Instruction::Label { task, .. } => task,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Instruction::Complete { task } => format!("complete '{}'", task),
            Instruction::Reschedule { task, due } => format!("move '{}' to {}", task, due),
            Instruction::Rename { task, new_name } => {
                format!("rename '{}' to '{}'", task, new_name)
            }
            Instruction::Prioritize { task, priority } => {
                format!("set priority of '{}' to P{}", task, 5 - priority)
            }
            Instruction::Label { task, labels } => {
                format!("label '{}' with {}", task, labels.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    pub line: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInstructions {
    pub instructions: Vec<Instruction>,
    pub rejected: Vec<Rejected>,
}

/// Parses one instruction per line or `;`-separated segment. Blank segments
/// and `#` comments are ignored; lines that cannot be understood end up in
/// `rejected` instead of failing the whole batch.
pub fn parse_instructions(text: &str, today: NaiveDate) -> ParsedInstructions {
    let mut parsed = ParsedInstructions::default();

    for segment in text.lines().flat_map(|line| line.split(';')) {
        let segment = segment.trim();
        if segment.is_empty() || segment.starts_with('#') {
            continue;
        }
        match parse_line(segment, today) {
            Ok(instruction) => parsed.instructions.push(instruction),
            Err(reason) => {
                tracing::debug!("Rejected instruction '{}': {}", segment, reason);
                parsed.rejected.push(Rejected {
                    line: segment.to_string(),
                    reason,
                });
            }
        }
    }

    parsed
}

fn parse_line(line: &str, today: NaiveDate) -> Result<Instruction, String> {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_lowercase().as_str() {
        "complete" | "done" | "close" | "finish" => Ok(Instruction::Complete {
            task: task_name(rest)?,
        }),
        "move" | "reschedule" | "postpone" => {
            let (task, when) = split_argument(rest, "to")?;
            let due = resolve_date(when, today)
                .ok_or_else(|| format!("cannot resolve date '{}'", when))?;
            Ok(Instruction::Reschedule { task, due })
        }
        "rename" => {
            let (task, new_name) = split_argument(rest, "to")?;
            let new_name = unquote(new_name);
            if new_name.is_empty() {
                return Err("missing new name".to_string());
            }
            Ok(Instruction::Rename { task, new_name })
        }
        "priority" | "prioritize" => {
            let (task, level) = split_argument(rest, "to")?;
            Ok(Instruction::Prioritize {
                task,
                priority: parse_priority(level)?,
            })
        }
        "label" | "tag" => {
            let (task, labels) = split_argument(rest, "with")?;
            let labels: Vec<String> = labels
                .split(',')
                .map(|l| unquote(l.trim().trim_start_matches('@')))
                .filter(|l| !l.is_empty())
                .collect();
            if labels.is_empty() {
                return Err("missing label".to_string());
            }
            Ok(Instruction::Label { task, labels })
        }
        other => Err(format!("unknown action '{}'", other)),
    }
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
        .trim()
        .to_string()
}

fn task_name(s: &str) -> Result<String, String> {
    let name = unquote(s);
    if name.is_empty() {
        Err("missing task name".to_string())
    } else {
        Ok(name)
    }
}

/// Splits `<task> <keyword> <argument>`. A quoted task name ends at its
/// closing quote; otherwise the last occurrence of the keyword wins, so task
/// names may contain it.
fn split_argument<'a>(rest: &'a str, keyword: &str) -> Result<(String, &'a str), String> {
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted
            .find('"')
            .ok_or_else(|| "unterminated quote".to_string())?;
        let task = task_name(&quoted[..end])?;
        let after = quoted[end + 1..].trim_start();
        let argument = after
            .get(..keyword.len())
            .filter(|head| head.eq_ignore_ascii_case(keyword))
            .and_then(|_| after.get(keyword.len()..))
            .filter(|tail| tail.starts_with(char::is_whitespace))
            .ok_or_else(|| format!("expected '{}' after task name", keyword))?;
        return Ok((task, argument.trim()));
    }

    let separator = format!(" {} ", keyword);
    let idx = rest
        .to_ascii_lowercase()
        .rfind(&separator)
        .ok_or_else(|| format!("expected '<task> {} <value>'", keyword))?;
    let task = task_name(&rest[..idx])?;
    let argument = rest[idx + separator.len()..].trim();
    if argument.is_empty() {
        return Err(format!("missing value after '{}'", keyword));
    }
    Ok((task, argument))
}

fn parse_priority(level: &str) -> Result<u8, String> {
    match level.trim().to_lowercase().as_str() {
        "p1" | "1" | "urgent" => Ok(4),
        "p2" | "2" | "high" => Ok(3),
        "p3" | "3" | "medium" => Ok(2),
        "p4" | "4" | "low" | "normal" => Ok(1),
        other => Err(format!("unknown priority '{}'", other)),
    }
}
