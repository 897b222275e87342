//! Password sheet rendering
//!
//! Sheets are plain HTML documents handed to a [`PdfRenderer`]. There are
//! four of them:
//! - password sheets, one page per account
//! - the master grid, all accounts on a few landscape pages
//! - the CDS password sheets, one page per account per server
//! - the CDS master, one row per account per server
//!
//! [`PdfRenderer`]: super::PdfRenderer

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::accounts::{Account, ServerAccounts};
use crate::validate::SheetSettings;

/// Master grid columns per page
const MASTER_COLUMNS: usize = 3;

const STYLE: &str = "body{font-family:sans-serif;margin:0}\
.page{page-break-after:always;padding:1em}\
.page:last-child{page-break-after:auto}\
.banner{max-width:100%;max-height:8em}\
.credentials td{padding:.3em 1em;font-size:1.4em}\
.password{font-family:monospace}\
.grid{display:flex;gap:1em}\
.grid table,.list{border-collapse:collapse;font-size:.8em}\
.grid td,.list td,.list th{border:1px solid #999;padding:0 .4em}\
.footer{margin-top:2em;color:#555}";

/// Format a date the way sheets print it, e.g. `Friday 05 April 2024`
pub fn today_formatted() -> String {
    chrono::Local::now().format("%A %d %B %Y").to_string()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Variables shared by every sheet of a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetContext {
    pub title: Option<String>,
    pub footer: Option<String>,
    /// Absolute path
    pub banner: Option<PathBuf>,
    pub ccs: Option<String>,
    pub link: Option<String>,
    pub linux: bool,
    pub page_size: String,
    pub date: String,
}

impl SheetContext {
    pub fn new(settings: &SheetSettings, date: String) -> Self {
        Self {
            title: settings.title.clone(),
            footer: settings.footer.clone(),
            banner: settings.banner.as_deref().map(absolute),
            ccs: settings.account_types.ccs.name.clone(),
            link: settings.account_types.ccs.link.clone(),
            linux: settings.account_types.linux,
            page_size: settings.page_size.clone(),
            date,
        }
    }

    fn head(&self, out: &mut String) {
        let title = self.title.as_deref().map(escape_html).unwrap_or_default();
        let _ = writeln!(
            out,
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>",
            title, STYLE
        );
    }

    fn banner(&self, out: &mut String) {
        if let Some(banner) = &self.banner {
            let _ = writeln!(
                out,
                "<img class=\"banner\" src=\"file://{}\">",
                escape_html(&banner.display().to_string())
            );
        }
    }

    fn heading(&self, out: &mut String, suffix: Option<&str>) {
        let mut text = self.title.as_deref().map(escape_html).unwrap_or_default();
        if let Some(suffix) = suffix {
            if !text.is_empty() {
                text.push_str(" - ");
            }
            text.push_str(&escape_html(suffix));
        }
        if !text.is_empty() {
            let _ = writeln!(out, "<h1>{}</h1>", text);
        }
    }

    fn footer(&self, out: &mut String) {
        if let Some(footer) = &self.footer {
            let _ = writeln!(out, "<div class=\"footer\">{}</div>", escape_html(footer));
        }
    }
}

fn credentials_row(out: &mut String, label: &str, value: &str, class: &str) {
    let _ = writeln!(
        out,
        "<tr><td>{}</td><td class=\"{}\">{}</td></tr>",
        label,
        class,
        escape_html(value)
    );
}

/// One page per account with its credentials
pub fn render_password_sheets(ctx: &SheetContext, accounts: &[&Account]) -> String {
    let mut out = String::new();
    ctx.head(&mut out);
    for account in accounts {
        out.push_str("<div class=\"page\">\n");
        ctx.banner(&mut out);
        ctx.heading(&mut out, None);
        let _ = writeln!(out, "<h2>{}</h2>", escape_html(&account.name));
        out.push_str("<table class=\"credentials\">\n");
        credentials_row(&mut out, "Username", &account.username, "username");
        credentials_row(&mut out, "Password", &account.password, "password");
        out.push_str("</table>\n");
        if let Some(ccs) = &ctx.ccs {
            let _ = write!(
                out,
                "<p>Use these credentials to log in to {}",
                escape_html(ccs)
            );
            if let Some(link) = &ctx.link {
                let _ = write!(out, " at <b>{}</b>", escape_html(link));
            }
            out.push_str(".</p>\n");
        }
        if ctx.linux {
            out.push_str("<p>The same credentials log you in to your workstation.</p>\n");
        }
        ctx.footer(&mut out);
        out.push_str("</div>\n");
    }
    out.push_str("</body></html>\n");
    out
}

/// Rows and columns of a master grid page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterLayout {
    pub rows_per_page: usize,
    pub columns: usize,
}

impl MasterLayout {
    pub fn per_page(&self) -> usize {
        self.rows_per_page * self.columns
    }

    /// Split accounts into pages, each page into columns
    pub fn paginate<'a, T>(&self, items: &'a [T]) -> Vec<Vec<&'a [T]>> {
        items
            .chunks(self.per_page())
            .map(|page| page.chunks(self.rows_per_page).collect())
            .collect()
    }
}

/// 40 rows on A4, 41 on anything else, always 3 columns
pub fn master_layout(page_size: &str) -> MasterLayout {
    MasterLayout {
        rows_per_page: if page_size == "A4" { 40 } else { 41 },
        columns: MASTER_COLUMNS,
    }
}

/// 35 rows on A4, 36 on anything else
pub fn cds_master_rows(page_size: &str) -> usize {
    if page_size == "A4" {
        35
    } else {
        36
    }
}

fn master_heading(ctx: &SheetContext, out: &mut String) {
    ctx.heading(out, Some("Master list"));
    let _ = writeln!(out, "<p>{}</p>", escape_html(&ctx.date));
}

/// All accounts on landscape pages of three columns
pub fn render_master(ctx: &SheetContext, accounts: &[&Account]) -> String {
    let layout = master_layout(&ctx.page_size);
    let mut out = String::new();
    ctx.head(&mut out);
    for page in layout.paginate(accounts) {
        out.push_str("<div class=\"page\">\n");
        master_heading(ctx, &mut out);
        out.push_str("<div class=\"grid\">\n");
        for column in page {
            out.push_str("<table>\n");
            for account in column {
                let _ = writeln!(
                    out,
                    "<tr><td>{}</td><td class=\"password\">{}</td></tr>",
                    escape_html(&account.username),
                    escape_html(&account.password)
                );
            }
            out.push_str("</table>\n");
        }
        out.push_str("</div>\n");
        ctx.footer(&mut out);
        out.push_str("</div>\n");
    }
    out.push_str("</body></html>\n");
    out
}

/// An account together with the server it lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdsSheetEntry<'a> {
    pub account: &'a Account,
    pub server: &'a str,
    pub url: &'a str,
}

/// Flatten per-server accounts, server by server
pub fn cds_entries(servers: &[ServerAccounts]) -> Vec<CdsSheetEntry<'_>> {
    servers
        .iter()
        .flat_map(|entry| {
            entry.accounts.iter().map(move |account| CdsSheetEntry {
                account,
                server: &entry.server.name,
                url: &entry.server.url,
            })
        })
        .collect()
}

/// One page per account per server
pub fn render_cds_sheets(ctx: &SheetContext, entries: &[CdsSheetEntry<'_>]) -> String {
    let mut out = String::new();
    ctx.head(&mut out);
    for entry in entries {
        out.push_str("<div class=\"page\">\n");
        ctx.banner(&mut out);
        let _ = writeln!(
            out,
            "<h1>{}</h1>\n<h2>{}</h2>",
            escape_html(&entry.account.name),
            escape_html(entry.server)
        );
        out.push_str("<table class=\"credentials\">\n");
        credentials_row(&mut out, "URL", entry.url, "url");
        credentials_row(&mut out, "Username", &entry.account.username, "username");
        credentials_row(&mut out, "Password", &entry.account.password, "password");
        out.push_str("</table>\n");
        ctx.footer(&mut out);
        out.push_str("</div>\n");
    }
    out.push_str("</body></html>\n");
    out
}

/// Every CDS account in a single table, split over landscape pages
pub fn render_cds_master(ctx: &SheetContext, entries: &[CdsSheetEntry<'_>]) -> String {
    let rows = cds_master_rows(&ctx.page_size);
    let mut out = String::new();
    ctx.head(&mut out);
    for page in entries.chunks(rows) {
        out.push_str("<div class=\"page\">\n");
        master_heading(ctx, &mut out);
        out.push_str(
            "<table class=\"list\">\n<tr><th>Server</th><th>Name</th><th>Username</th><th>Password</th></tr>\n",
        );
        for entry in page {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"password\">{}</td></tr>",
                escape_html(entry.server),
                escape_html(&entry.account.name),
                escape_html(&entry.account.username),
                escape_html(&entry.account.password)
            );
        }
        out.push_str("</table>\n");
        ctx.footer(&mut out);
        out.push_str("</div>\n");
    }
    out.push_str("</body></html>\n");
    out
}
