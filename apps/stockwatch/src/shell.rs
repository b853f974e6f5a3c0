//! # Interactive Shell
//!
//! Line-oriented foreground interface to the catalog.
//!
//! Each command runs on the blocking pool under a timeout, so a stuck write
//! to a backing file is reported to the user instead of wedging the shell.
//! Replies are written to the shared [`Console`] as single blocks.

use crate::console::Console;
use crate::error::AppError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use stockwatch_core::formats::parse_line;
use stockwatch_core::{
    CatalogEntry, Decimal, EntryPatch, Inventory, InventoryReport, Search, StockError, Supplier,
    SupplierRegistry,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &[&str] = &[
    "Commands:",
    "  list                               all products",
    "  add <id,name,category,qty,price,supplier>",
    "  get <id>",
    "  search id <id> | search name <text> | search category <category>",
    "  update <id,name,category,qty,price,supplier>",
    "  update <id> [name=..] [category=..] [quantity=..] [price=..] [supplier=..]",
    "                                     values may span words: name=Cordless Drill",
    "  remove <id>",
    "  low [threshold]                    products below the threshold",
    "  report                             totals and per-category counts",
    "  save                               write the catalog and suppliers to disk",
    "  suppliers                          all suppliers",
    "  supplier add <id,name,contact,email,phone>",
    "  supplier get <id>",
    "  help | quit",
];

// =============================================================================
// COMMANDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Add(CatalogEntry),
    Get(String),
    Search(Search),
    Update { id: String, patch: EntryPatch },
    Remove(String),
    Low(Option<i64>),
    Report,
    Save,
    Suppliers,
    SupplierAdd(Supplier),
    SupplierGet(String),
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`; the error is a
    /// message for the user.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = split_word(line);

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "list" => Self::List,
            "add" => Self::Add(record_arg(rest, "add")?),
            "get" => Self::Get(id_arg(rest, "get")?),
            "search" => Self::Search(parse_search(rest)?),
            "update" => parse_update(rest)?,
            "remove" | "delete" => Self::Remove(id_arg(rest, "remove")?),
            "low" => match rest {
                "" => Self::Low(None),
                t => Self::Low(Some(
                    t.parse()
                        .map_err(|_| format!("invalid threshold '{t}'"))?,
                )),
            },
            "report" => Self::Report,
            "save" => Self::Save,
            "suppliers" => Self::Suppliers,
            "supplier" => match split_word(rest) {
                ("add", record) => Self::SupplierAdd(record_arg(record, "supplier add")?),
                ("get", id) => Self::SupplierGet(id_arg(id, "supplier get")?),
                _ => return Err("usage: supplier add <record> | supplier get <id>".into()),
            },
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{other}', type 'help'")),
        };
        Ok(Some(command))
    }
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn id_arg(rest: &str, command: &str) -> Result<String, String> {
    if rest.is_empty() {
        return Err(format!("usage: {command} <id>"));
    }
    Ok(rest.to_string())
}

fn record_arg<R: stockwatch_core::FlatRecord>(rest: &str, command: &str) -> Result<R, String> {
    if rest.is_empty() {
        return Err(format!("usage: {command} <record>"));
    }
    parse_line(rest).map_err(|e| e.to_string())
}

fn parse_search(rest: &str) -> Result<Search, String> {
    let search = match split_word(rest) {
        (_, "") => None,
        ("id", id) => Some(Search::Id(id.to_string())),
        ("name", text) => Some(Search::NameContains(text.to_string())),
        ("category", category) => Some(Search::Category(category.to_string())),
        _ => None,
    };
    search.ok_or_else(|| "usage: search id|name|category <text>".to_string())
}

/// `update <record>` replaces every field; `update <id> key=value...`
/// changes only the given ones.
fn parse_update(rest: &str) -> Result<Command, String> {
    if rest.contains(',') {
        let entry: CatalogEntry = record_arg(rest, "update")?;
        return Ok(Command::Update {
            patch: EntryPatch::replace_with(&entry),
            id: entry.id,
        });
    }

    let (id, assignments) = split_word(rest);
    if id.is_empty() || assignments.is_empty() {
        return Err("usage: update <id> field=value...".into());
    }

    // a word without '=' continues the previous value
    let mut fields: Vec<(&str, String)> = Vec::new();
    for word in assignments.split_whitespace() {
        if let Some((key, value)) = word.split_once('=') {
            fields.push((key, value.to_string()));
            continue;
        }
        let Some((_, value)) = fields.last_mut() else {
            return Err(format!("expected field=value, got '{word}'"));
        };
        value.push(' ');
        value.push_str(word);
    }

    let mut patch = EntryPatch::new();
    for (key, value) in fields {
        let value = value.as_str();
        patch = match key {
            "name" => patch.name(value),
            "category" => patch.category(value),
            "quantity" | "qty" => patch.quantity(
                value
                    .parse()
                    .map_err(|_| format!("invalid quantity '{value}'"))?,
            ),
            "price" => patch.price(
                value
                    .parse::<Decimal>()
                    .map_err(|_| format!("invalid price '{value}'"))?,
            ),
            "supplier" => patch.supplier_id(value),
            other => return Err(format!("unknown field '{other}'")),
        };
    }

    Ok(Command::Update {
        id: id.to_string(),
        patch,
    })
}

// =============================================================================
// SHELL
// =============================================================================

/// How the shell loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    Quit,
    EndOfInput,
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct Shell {
    inventory: Arc<Inventory>,
    suppliers: Arc<SupplierRegistry>,
    console: Arc<Console>,
    threshold: i64,
    command_timeout: Duration,
}

impl Shell {
    pub fn new(
        inventory: Arc<Inventory>,
        suppliers: Arc<SupplierRegistry>,
        console: Arc<Console>,
        threshold: i64,
        command_timeout: Duration,
    ) -> Self {
        Self {
            inventory,
            suppliers,
            console,
            threshold,
            command_timeout,
        }
    }

    /// Read commands from `input` until `quit`, end of input or
    /// `interrupt` resolves.
    pub async fn run<I>(
        &self,
        input: I,
        interrupt: impl Future<Output = ()>,
    ) -> Result<ShellExit, AppError>
    where
        I: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        tokio::pin!(interrupt);
        self.console.line("Type 'help' for commands.")?;

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                () = &mut interrupt => return Ok(ShellExit::Interrupted),
            };
            let Some(line) = line else {
                return Ok(ShellExit::EndOfInput);
            };

            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => return Ok(ShellExit::Quit),
                Ok(Some(command)) => {
                    let reply = self.dispatch(command).await;
                    self.console.block(&reply)?;
                }
                Err(message) => self.console.line(message)?,
            }
        }
    }

    /// Run one command on the blocking pool, bounded by the command timeout.
    pub async fn dispatch(&self, command: Command) -> Vec<String> {
        let shell = self.clone();
        let job = tokio::task::spawn_blocking(move || shell.execute(command));

        match tokio::time::timeout(self.command_timeout, job).await {
            Ok(Ok(Ok(lines))) => lines,
            Ok(Ok(Err(e))) => vec![format!("Error: {e}")],
            Ok(Err(e)) => {
                tracing::error!(error = %e, "shell command panicked");
                vec!["Error: command failed".to_string()]
            }
            Err(_) => {
                let e = StockError::IoFailure(format!(
                    "command did not finish within {} ms",
                    self.command_timeout.as_millis()
                ));
                tracing::warn!(error = %e, "shell command timed out");
                vec![format!("Error: {e}")]
            }
        }
    }

    /// Run one command synchronously and return its reply.
    pub fn execute(&self, command: Command) -> Result<Vec<String>, StockError> {
        let inv = &self.inventory;
        let lines = match command {
            Command::Help => HELP.iter().map(|s| (*s).to_string()).collect(),
            Command::List => entry_lines(inv.list(), "No products found."),
            Command::Add(entry) => {
                let id = entry.id.clone();
                inv.add_entry(entry)?;
                tracing::info!(id = %id, "product added");
                vec![format!("Product {id} added.")]
            }
            Command::Get(id) => vec![inv.find_by_id(&id)?.to_string()],
            Command::Search(search) => search_lines(inv.search(&search)),
            Command::Update { id, patch } => {
                let updated = inv.update_entry(&id, &patch)?;
                tracing::info!(id = %id, "product updated");
                vec![format!("Product updated: {updated}")]
            }
            Command::Remove(id) => {
                let removed = inv.remove_entry(&id)?;
                tracing::info!(id = %id, "product removed");
                vec![format!("Product removed: {removed}")]
            }
            Command::Low(threshold) => {
                let threshold = threshold.unwrap_or(self.threshold);
                low_stock_lines(&inv.search(&Search::LowStock(threshold)))
            }
            Command::Report => report_lines(&inv.report(Some(&self.suppliers))),
            Command::Save => {
                inv.persist()?;
                self.suppliers.store().persist()?;
                tracing::info!(entries = inv.len(), "catalog saved");
                vec!["Catalog saved.".to_string()]
            }
            Command::Suppliers => {
                let suppliers = self.suppliers.list();
                if suppliers.is_empty() {
                    vec!["No suppliers found.".to_string()]
                } else {
                    suppliers.iter().map(ToString::to_string).collect()
                }
            }
            Command::SupplierAdd(supplier) => {
                let id = supplier.id.clone();
                self.suppliers.add_supplier(supplier)?;
                tracing::info!(id = %id, "supplier added");
                vec![format!("Supplier {id} added.")]
            }
            Command::SupplierGet(id) => vec![self.suppliers.get_supplier(&id)?.to_string()],
            Command::Quit => Vec::new(),
        };
        Ok(lines)
    }
}

// =============================================================================
// REPLY FORMATTING
// =============================================================================

fn entry_lines(entries: Vec<CatalogEntry>, empty: &str) -> Vec<String> {
    if entries.is_empty() {
        return vec![empty.to_string()];
    }
    entries.iter().map(ToString::to_string).collect()
}

fn search_lines(entries: Vec<CatalogEntry>) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No products found.".to_string()];
    }
    let mut lines = vec![format!("Found {} product(s):", entries.len())];
    lines.extend(entries.iter().map(ToString::to_string));
    lines
}

pub fn low_stock_lines(entries: &[CatalogEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No low stock products.".to_string()];
    }
    let mut lines = vec![format!(
        "Found {} product(s) with low stock:",
        entries.len()
    )];
    lines.extend(
        entries
            .iter()
            .map(|e| format!("   {} (ID: {}) - Only {} left!", e.name, e.id, e.quantity)),
    );
    lines
}

pub fn report_lines(report: &InventoryReport) -> Vec<String> {
    let mut lines = vec![
        format!("Total inventory value: ${:.2}", report.total_value),
        "Category-wise product count:".to_string(),
    ];
    lines.extend(
        report
            .by_category
            .iter()
            .map(|(category, count)| format!("   {category}: {count} product(s)")),
    );
    lines.push(format!("Total products: {}", report.entry_count));
    if !report.unresolved_suppliers.is_empty() {
        lines.push(format!(
            "Unknown supplier on: {}",
            report.unresolved_suppliers.join(", ")
        ));
    }
    lines
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_no_command() {
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn parses_add_record() {
        let command = Command::parse("add P1,Widget,Tools,4,2.50,S1").expect("parse");
        let Some(Command::Add(entry)) = command else {
            unreachable!("expected add, got {command:?}");
        };
        assert_eq!(entry.id, "P1");
        assert_eq!(entry.price, Decimal::new(250, 2));
    }

    #[test]
    fn add_with_bad_number_is_user_error() {
        let err = Command::parse("add P1,Widget,Tools,many,2.50,S1").expect_err("bad qty");
        assert!(err.contains("line 1"));
    }

    #[test]
    fn parses_partial_update() {
        let command = Command::parse("update P1 quantity=3 price=1.25").expect("parse");
        assert_eq!(
            command,
            Some(Command::Update {
                id: "P1".into(),
                patch: EntryPatch::new().quantity(3).price(Decimal::new(125, 2)),
            })
        );
    }

    #[test]
    fn partial_update_values_may_span_words() {
        let command = Command::parse("update P1 name=Cordless  Drill quantity=3").expect("parse");
        assert_eq!(
            command,
            Some(Command::Update {
                id: "P1".into(),
                patch: EntryPatch::new().name("Cordless Drill").quantity(3),
            })
        );

        let err = Command::parse("update P1 Cordless name=Drill").expect_err("no key");
        assert!(err.contains("field=value"));
    }

    #[test]
    fn full_record_update_replaces_all_fields() {
        let command = Command::parse("update P1,Bolt,Hardware,7,0.10,S2").expect("parse");
        let Some(Command::Update { id, patch }) = command else {
            unreachable!("expected update, got {command:?}");
        };
        assert_eq!(id, "P1");
        assert_eq!(patch.name.as_deref(), Some("Bolt"));
        assert_eq!(patch.quantity, Some(7));
    }

    #[test]
    fn search_and_supplier_subcommands() {
        assert_eq!(
            Command::parse("search name cordless drill"),
            Ok(Some(Command::Search(Search::NameContains(
                "cordless drill".into()
            ))))
        );
        assert_eq!(
            Command::parse("search id P7"),
            Ok(Some(Command::Search(Search::Id("P7".into()))))
        );
        assert!(Command::parse("search category").is_err());
        assert_eq!(Command::parse("save"), Ok(Some(Command::Save)));
        assert_eq!(
            Command::parse("supplier get S1"),
            Ok(Some(Command::SupplierGet("S1".into())))
        );
        assert!(Command::parse("search colour red").is_err());
        assert_eq!(Command::parse("low 5"), Ok(Some(Command::Low(Some(5)))));
        assert_eq!(Command::parse("QUIT"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn report_formats_money_with_two_decimals() {
        let report = InventoryReport {
            entry_count: 2,
            total_value: Decimal::new(11, 0),
            by_category: [("Tools".to_string(), 2)].into_iter().collect(),
            unresolved_suppliers: Vec::new(),
        };

        let lines = report_lines(&report);

        assert_eq!(lines[0], "Total inventory value: $11.00");
        assert_eq!(lines[2], "   Tools: 2 product(s)");
        assert_eq!(lines[3], "Total products: 2");
    }
}
