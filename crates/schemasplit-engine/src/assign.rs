//! Group assignment
//!
//! Walks the creation order and places each table's CREATE TABLE block into
//! its preferred group. A block that would push a group over its line budget
//! cascades to the next group; tables only ever move forward. Running out of
//! groups is the one fatal condition of a split.

use crate::log::{LogEvent, ReassignmentLog};
use schemasplit_core::{Config, GroupConfig};
use schemasplit_sql::{line_count, TableDefinition, BLOCK_SEPARATOR};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Accumulated state of one output group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupState {
    pub name: String,
    pub file: String,
    pub line_limit: usize,

    /// Sum of the line counts of placed blocks (separators not counted)
    pub lines: usize,

    /// Placed tables, in placement order
    pub tables: Vec<String>,

    /// Placed blocks, parallel to `tables`
    pub blocks: Vec<String>,
}

impl GroupState {
    pub fn new(group: &GroupConfig, line_limit: usize) -> Self {
        Self {
            name: group.name.clone(),
            file: group.file.clone(),
            line_limit,
            lines: 0,
            tables: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Whether a block of `lines` lines still fits the budget
    ///
    /// Only block lines count. The blank line between blocks does not, so a
    /// group filled to its limit with N blocks renders N-1 lines over it and
    /// fails validation with `LINE_LIMIT_EXCEEDED`.
    pub fn fits(&self, lines: usize) -> bool {
        self.lines + lines <= self.line_limit
    }

    fn place(&mut self, table: &str, block: String, lines: usize) {
        self.lines += lines;
        self.tables.push(table.to_string());
        self.blocks.push(block);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// File content: blocks separated by a blank line, or a placeholder
    pub fn render(&self) -> String {
        if self.is_empty() {
            format!("-- {} schema pending\n", self.name)
        } else {
            self.blocks.join(BLOCK_SEPARATOR)
        }
    }
}

/// Where one table ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub table: String,
    pub lines: usize,

    /// Index of the preferred group
    pub preferred: usize,

    /// Index of the group that took the block
    pub group: usize,
}

impl Placement {
    pub fn cascaded(&self) -> bool {
        self.group != self.preferred
    }
}

/// Outcome of a successful assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Groups in configured order
    pub groups: Vec<GroupState>,

    /// One entry per placed table, in creation order
    pub placements: Vec<Placement>,

    /// Tables in the order with no CREATE TABLE block available
    pub skipped: Vec<String>,

    /// Cascade events
    pub log: ReassignmentLog,
}

impl Assignment {
    /// Name of the group holding a table
    pub fn group_of(&self, table: &str) -> Option<&str> {
        self.placements
            .iter()
            .find(|p| p.table == table)
            .map(|p| self.groups[p.group].name.as_str())
    }
}

/// Assignment error types
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    #[error("Line limit reached for all groups while placing {table} ({lines} lines)")]
    GroupsExhausted {
        table: String,
        lines: usize,

        /// Everything logged up to and including the failure
        log: ReassignmentLog,
    },
}

/// Places CREATE TABLE blocks into groups
pub struct GroupAssignor<'a> {
    config: &'a Config,
}

impl<'a> GroupAssignor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Fresh, empty group states
    pub fn empty_groups(&self) -> Vec<GroupState> {
        self.config
            .groups
            .iter()
            .map(|group| GroupState::new(group, self.config.line_limit_for(group)))
            .collect()
    }

    /// Place every table of `order` that has a CREATE TABLE block
    ///
    /// Placement order follows `order` exactly. Tables missing from `tables`
    /// or without a structural block are skipped.
    pub fn assign(
        &self,
        order: &[String],
        tables: &BTreeMap<String, TableDefinition>,
    ) -> Result<Assignment, AssignError> {
        let mut groups = self.empty_groups();
        let mut placements = Vec::with_capacity(order.len());
        let mut skipped = Vec::new();
        let mut log = ReassignmentLog::new();

        for table in order {
            let Some(block) = tables.get(table).and_then(TableDefinition::structural_block) else {
                debug!(table = %table, "no CREATE TABLE block, skipping");
                skipped.push(table.clone());
                continue;
            };

            let lines = line_count(&block);
            let preferred = self.config.preferred_group(table);
            let group = place(&mut groups, preferred, table, block, lines, &mut log)?;

            debug!(table = %table, group = %groups[group].name, lines, "placed table");
            placements.push(Placement {
                table: table.clone(),
                lines,
                preferred,
                group,
            });
        }

        Ok(Assignment {
            groups,
            placements,
            skipped,
            log,
        })
    }
}

/// Try `start` and every later group until the block fits
fn place(
    groups: &mut [GroupState],
    start: usize,
    table: &str,
    block: String,
    lines: usize,
    log: &mut ReassignmentLog,
) -> Result<usize, AssignError> {
    let mut index = start;

    loop {
        if groups[index].fits(lines) {
            groups[index].place(table, block, lines);
            return Ok(index);
        }

        let Some(next) = groups.get(index + 1) else {
            warn!(table = %table, lines, "no group can hold table");
            log.push(LogEvent::Exhausted { table: table.to_string() });
            return Err(AssignError::GroupsExhausted {
                table: table.to_string(),
                lines,
                log: std::mem::take(log),
            });
        };

        warn!(
            table = %table,
            from = %groups[index].name,
            to = %next.name,
            used = groups[index].lines,
            limit = groups[index].line_limit,
            "group full, cascading"
        );
        log.push(LogEvent::Moved {
            table: table.to_string(),
            from: groups[index].name.clone(),
            to: next.name.clone(),
        });
        index += 1;
    }
}
