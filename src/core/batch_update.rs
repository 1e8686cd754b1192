use crate::adapters::todoist::TodoistClient;
use crate::domain::model::{TaskUpdate, TodoistTask};
use crate::instructions::{Instruction, ParsedInstructions, Rejected};
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BatchUpdateReport {
    pub applied: Vec<String>,
    pub unmatched: Vec<String>,
    pub rejected: Vec<Rejected>,
    pub errors: Vec<String>,
}

impl BatchUpdateReport {
    pub fn total(&self) -> usize {
        self.applied.len() + self.unmatched.len() + self.rejected.len() + self.errors.len()
    }

    pub fn status(&self) -> &'static str {
        if self.unmatched.is_empty() && self.rejected.is_empty() && self.errors.is_empty() {
            "success"
        } else {
            "partial_success"
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Applied {} of {} instruction(s). Unmatched: {}, rejected: {}, errors: {}.",
            self.applied.len(),
            self.total(),
            self.unmatched.len(),
            self.rejected.len(),
            self.errors.len()
        )
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Applies parsed instructions to active Todoist tasks, matched by name.
pub struct BatchUpdateJob {
    todoist: TodoistClient,
    dry_run: bool,
}

impl BatchUpdateJob {
    pub fn new(todoist: TodoistClient, dry_run: bool) -> Self {
        Self { todoist, dry_run }
    }

    pub async fn run(&self, parsed: ParsedInstructions) -> Result<BatchUpdateReport> {
        let mut report = BatchUpdateReport {
            rejected: parsed.rejected,
            ..Default::default()
        };
        if parsed.instructions.is_empty() {
            tracing::info!("No instructions to apply");
            return Ok(report);
        }

        let tasks = self.todoist.get_tasks(None).await?;
        let mut by_name: HashMap<String, Vec<&TodoistTask>> = HashMap::new();
        for task in &tasks {
            by_name.entry(normalize(&task.content)).or_default().push(task);
        }
        // Labels as they stand after earlier instructions in this batch.
        let mut current_labels: HashMap<&str, Vec<String>> = HashMap::new();

        for instruction in parsed.instructions {
            let task = match by_name.get(&normalize(instruction.task())).map(Vec::as_slice) {
                None | Some([]) => {
                    tracing::warn!("No active task named '{}'", instruction.task());
                    report.unmatched.push(instruction.task().to_string());
                    continue;
                }
                Some([task]) => *task,
                Some(many) => {
                    let message = format!(
                        "Ambiguous task name '{}' matches {} tasks",
                        instruction.task(),
                        many.len()
                    );
                    tracing::warn!("{}", message);
                    report.errors.push(message);
                    continue;
                }
            };

            let description = instruction.describe();
            if self.dry_run {
                tracing::info!("[dry-run] would {}", description);
                report.applied.push(description);
                continue;
            }

            let labels = current_labels
                .entry(task.id.as_str())
                .or_insert_with(|| task.labels.clone());
            match self.execute(task, &instruction, labels).await {
                Ok(()) => {
                    tracing::info!("Applied: {}", description);
                    report.applied.push(description);
                }
                Err(e) => {
                    let message = format!("Failed to {}: {}", description, e);
                    tracing::error!("{}", message);
                    report.errors.push(message);
                }
            }
        }

        Ok(report)
    }

    async fn execute(
        &self,
        task: &TodoistTask,
        instruction: &Instruction,
        labels: &mut Vec<String>,
    ) -> Result<()> {
        let update = match instruction {
            Instruction::Complete { .. } => return self.todoist.close_task(&task.id).await,
            Instruction::Reschedule { due, .. } => TaskUpdate {
                due_date: Some(due.format("%Y-%m-%d").to_string()),
                ..Default::default()
            },
            Instruction::Rename { new_name, .. } => TaskUpdate {
                content: Some(new_name.clone()),
                ..Default::default()
            },
            Instruction::Prioritize { priority, .. } => TaskUpdate {
                priority: Some(*priority),
                ..Default::default()
            },
            Instruction::Label { labels: added, .. } => {
                let mut merged = labels.clone();
                for label in added {
                    if !merged.contains(label) {
                        merged.push(label.clone());
                    }
                }
                let update = TaskUpdate {
                    labels: Some(merged.clone()),
                    ..Default::default()
                };
                self.todoist.update_task(&task.id, &update).await?;
                *labels = merged;
                return Ok(());
            }
        };

        self.todoist.update_task(&task.id, &update).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_message() {
        let report = BatchUpdateReport {
            applied: vec!["complete 'A'".to_string()],
            unmatched: vec!["B".to_string()],
            ..Default::default()
        };
        assert_eq!(report.status(), "partial_success");
        assert_eq!(
            report.message(),
            "Applied 1 of 2 instruction(s). Unmatched: 1, rejected: 0, errors: 0."
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Buy Milk "), "buy milk");
    }
}
