// Console pages: a generic table plus the row builders for each view
use serde::Serialize;
use tera::{Context, Tera};
use tracing::warn;

use crate::api::validators::{valid_domain, valid_ip, valid_name};
use crate::database::roster::subdomain_label;
use crate::dns::reconcile::{ActionKind, PublishedRow, ReconciliationAction};
use crate::error::KeeperError;

pub const TABLE_TEMPLATE: &str = "table_page.html";

pub const ERROR_PAGE: &str = r#"<!DOCTYPE html>
<html>
    <head><title>Internal server error</title></head>
    <body>The page encountered a rendering error</body>
</html>"#;

pub const SERVER_HEADERS: [&str; 4] = ["Friendly Name", "Cluster", "DNS status", "Actions"];
pub const DNS_HEADERS: [&str; 4] = ["Domain String", "IP", "Server Friendly Name", "Cluster Name"];

pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(TABLE_TEMPLATE, include_str!("../../templates/table_page.html"))?;
    Ok(tera)
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionLink {
    pub operation: &'static str,
    pub name: String,
    pub domain: String,
    pub ip: String,
    pub title: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub link: Option<ActionLink>,
    pub flagged: bool,
}

impl TableRow {
    fn width(&self) -> usize {
        self.cells.len() + usize::from(self.link.is_some())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TablePage {
    title: String,
    subtitle: String,
    headers: Vec<String>,
    rows: Vec<TableRow>,
}

impl TablePage {
    pub fn new(title: &str, subtitle: &str, headers: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a page from `items`, one row per item the builder accepts.
    pub fn from_rows<T>(
        title: &str,
        subtitle: &str,
        headers: &[&str],
        items: &[T],
        build: impl Fn(&T) -> Option<TableRow>,
    ) -> Result<Self, KeeperError> {
        let mut page = Self::new(title, subtitle, headers);
        for row in items.iter().filter_map(build) {
            page.add_row(row)?;
        }
        Ok(page)
    }

    pub fn add_row(&mut self, row: TableRow) -> Result<(), KeeperError> {
        if row.width() != self.headers.len() {
            return Err(KeeperError::Validation(format!(
                "row has {} columns, table '{}' has {}",
                row.width(),
                self.title,
                self.headers.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn render(&self, tera: &Tera) -> Result<String, tera::Error> {
        let context = Context::from_serialize(self)?;
        tera.render(TABLE_TEMPLATE, &context)
    }
}

/// Row for one reconciliation action; suspect input is dropped with a warning.
pub fn action_row(action: &ReconciliationAction) -> Option<TableRow> {
    if !(valid_name(&action.server_name) && valid_domain(&action.domain) && valid_ip(&action.ip)) {
        warn!(
            kind = ?action.kind,
            name = %action.server_name,
            domain = %action.domain,
            ip = %action.ip,
            "Suspect input detected (ignored)"
        );
        return None;
    }

    let (operation, title, text, status) = match action.kind {
        ActionKind::Add => ("add", "add to rotation", "Add", "NONE".to_string()),
        ActionKind::Remove => ("remove", "remove from rotation", "Remove", action.ip.clone()),
    };

    Some(TableRow {
        cells: vec![
            action.server_name.clone(),
            subdomain_label(&action.domain).to_string(),
            status,
        ],
        link: Some(ActionLink {
            operation,
            name: action.server_name.clone(),
            domain: action.domain.clone(),
            ip: action.ip.clone(),
            title,
            text,
        }),
        flagged: false,
    })
}

/// Row for one published address; unclaimed addresses are flagged.
pub fn published_row(row: &PublishedRow) -> Option<TableRow> {
    Some(TableRow {
        cells: vec![
            row.domain.clone(),
            row.ip.clone(),
            row.friendly_name.clone(),
            row.cluster_name.clone(),
        ],
        link: None,
        flagged: !row.matched,
    })
}

pub fn servers_page(actions: &[ReconciliationAction]) -> Result<TablePage, KeeperError> {
    TablePage::from_rows("Servers", "Servers in the database", &SERVER_HEADERS, actions, action_row)
}

pub fn dns_page(rows: &[PublishedRow]) -> Result<TablePage, KeeperError> {
    TablePage::from_rows(
        "DNS Records",
        "Currently published DNS entries",
        &DNS_HEADERS,
        rows,
        published_row,
    )
}
