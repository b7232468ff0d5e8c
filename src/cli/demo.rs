//! Sample records and the reports the `demo` command prints.
//!
//! Each report runs typed pipelines over the sample data and returns the
//! printed lines, starting every section with a `#### title ####` banner.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::Serialize;

use super::CliError;
use crate::{
    PipelineError,
    output::format_float,
    stream::{Comparator, Pipeline, Predicate, SharedSource, SourceMode},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub name: String,
    pub age: u32,
    pub active: bool,
}

impl User {
    fn new(name: &str, age: u32, active: bool) -> Self {
        User {
            name: name.to_string(),
            age,
            active,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t| {}", self.name, self.age)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub name: String,
    pub price: u32,
    pub published: bool,
}

impl Book {
    fn new(name: &str, price: u32, published: bool) -> Self {
        Book {
            name: name.to_string(),
            price,
            published,
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.published { "Published" } else { "Unpublished" };
        write!(f, "{}\t| \t| ${}\t| {}", self.name, self.price, status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub name: String,
    pub active: bool,
    pub books: Vec<Book>,
}

impl Author {
    fn new(name: &str, active: bool, books: Vec<Book>) -> Self {
        Author {
            name: name.to_string(),
            active,
            books,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.active { "Active" } else { "Inactive" };
        write!(f, "{}\t| {}", self.name, status)
    }
}

pub fn users() -> Vec<User> {
    vec![
        User::new("Seven", 7, true),
        User::new("Four", 4, false),
        User::new("Eleven", 11, true),
        User::new("Three", 3, true),
        User::new("Nine", 9, false),
        User::new("One", 1, true),
        User::new("Twelve", 12, true),
    ]
}

pub fn library() -> Vec<Author> {
    vec![
        Author::new(
            "Author A",
            true,
            vec![Book::new("A1", 100, true), Book::new("A2", 200, true), Book::new("A3", 220, true)],
        ),
        Author::new(
            "Author B",
            true,
            vec![
                Book::new("B1", 80, true),
                Book::new("B2", 80, false),
                Book::new("B3", 190, true),
                Book::new("B4", 210, true),
            ],
        ),
        Author::new(
            "Author C",
            true,
            vec![Book::new("C1", 110, true), Book::new("C2", 120, false), Book::new("C3", 130, true)],
        ),
        Author::new("Author D", false, vec![Book::new("D1", 200, true), Book::new("D2", 300, false)]),
        Author::new("Author X", true, vec![]),
    ]
}

pub fn users_json() -> Result<serde_json::Value, CliError> {
    Ok(serde_json::to_value(users())?)
}

pub fn library_json() -> Result<serde_json::Value, CliError> {
    Ok(serde_json::to_value(library())?)
}

fn banner(lines: &mut Vec<String>, title: &str) {
    lines.push(format!("#### {} ####", title));
}

fn select_users(
    lines: &mut Vec<String>,
    filter: Option<Predicate<'_, User>>,
    order: Option<Comparator<'_, User>>,
) -> Result<(), PipelineError> {
    Pipeline::from_vec(users())
        .select(filter, order)
        .for_each(|user| lines.push(user.to_string()))
}

fn by_name(a: &User, b: &User) -> Ordering {
    a.name.cmp(&b.name)
}

pub fn users_report() -> Result<Vec<String>, PipelineError> {
    let mut lines = Vec::new();

    banner(&mut lines, "Listing all users");
    select_users(&mut lines, None, None)?;

    banner(&mut lines, "Listing users with age > 5 sorted by name");
    select_users(&mut lines, Some(Box::new(|u: &User| u.age > 5)), Some(Box::new(by_name)))?;

    banner(&mut lines, "Listing users with age < 10 sorted by age");
    select_users(
        &mut lines,
        Some(Box::new(|u: &User| u.age < 10)),
        Some(Box::new(|a: &User, b: &User| b.age.cmp(&a.age))),
    )?;

    banner(&mut lines, "Listing active users sorted by name");
    select_users(&mut lines, Some(Box::new(|u: &User| u.active)), Some(Box::new(by_name)))?;

    banner(&mut lines, "Listing active users with age > 8 sorted by name");
    select_users(
        &mut lines,
        Some(Box::new(|u: &User| u.active && u.age > 8)),
        Some(Box::new(by_name)),
    )?;

    Ok(lines)
}

pub fn library_report() -> Result<Vec<String>, PipelineError> {
    let authors = library();
    let mut lines = Vec::new();

    banner(&mut lines, "Authors information");
    Pipeline::from_vec(authors.clone()).for_each(|author| lines.push(author.to_string()))?;

    banner(&mut lines, "Active authors");
    Pipeline::from_vec(authors.clone())
        .filter(|author| author.active)
        .for_each(|author| lines.push(author.to_string()))?;

    banner(&mut lines, "Active books for all authors");
    Pipeline::from_vec(authors.clone())
        .expand(|author| author.books)
        .filter(|book| book.published)
        .for_each(|book| lines.push(book.to_string()))?;

    banner(&mut lines, "Average price for all books in the library");
    let average = Pipeline::from_vec(authors.clone())
        .expand(|author| author.books)
        .average(|book| f64::from(book.price))?;
    if let Some(average) = average {
        lines.push(format_float(average));
    }

    banner(&mut lines, "Active authors that have at least one published book");
    Pipeline::from_vec(authors)
        .filter(|author| author.active)
        .filter(|author| author.books.iter().any(|book| book.published))
        .for_each(|author| lines.push(author.to_string()))?;

    Ok(lines)
}

fn format_groups<K: fmt::Display>(groups: &BTreeMap<K, Vec<String>>) -> String {
    let entries: Vec<String> = groups
        .iter()
        .map(|(key, members)| format!("{}=[{}]", key, members.join(", ")))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

pub fn collectors_report() -> Result<Vec<String>, PipelineError> {
    let mut lines = Vec::new();

    banner(&mut lines, "Partitioning vs grouping an empty stream");
    let partitioned = Pipeline::<String>::empty().partition_by(|s| s.starts_with('c'))?;
    let grouped = Pipeline::<String>::empty().group_by(|s| s.starts_with('c'))?;
    lines.push(format!("{} {}", format_groups(&partitioned), format_groups(&grouped)));

    banner(&mut lines, "Reducing 1..=5 by addition");
    let sum = Pipeline::from_vec((1..=5).collect()).reduce(0, |a, b| a + b)?;
    lines.push(sum.to_string());

    banner(&mut lines, "Collecting characters into a word");
    let word = Pipeline::from_vec(vec!["w", "o", "l", "f"]).join("")?;
    lines.push(word);

    banner(&mut lines, "Live view vs snapshot over a growing list");
    let names = SharedSource::new(vec!["Jane".to_string(), "John".to_string()]);
    let mut live = Pipeline::over(&names, SourceMode::Live);
    let mut snapshot = Pipeline::over(&names, SourceMode::Snapshot);
    names.push("Mary".to_string());
    lines.push(format!("live: {}, snapshot: {}", live.count()?, snapshot.count()?));

    Ok(lines)
}

/// Which report(s) the `demo` command prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoKind {
    Users,
    Library,
    Collectors,
    All,
}

impl std::str::FromStr for DemoKind {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "users" | "lambda" => Ok(DemoKind::Users),
            "library" | "authors" | "streams" => Ok(DemoKind::Library),
            "collectors" => Ok(DemoKind::Collectors),
            "all" => Ok(DemoKind::All),
            _ => Err(CliError::UnknownDemo(s.to_string())),
        }
    }
}

/// Lines for the requested demo. With `json`, the sample records instead.
pub fn render_demo(kind: DemoKind, json: bool) -> Result<Vec<String>, CliError> {
    if json {
        let data = match kind {
            DemoKind::Users => users_json()?,
            DemoKind::Library => library_json()?,
            DemoKind::Collectors | DemoKind::All => serde_json::json!({
                "users": users_json()?,
                "library": library_json()?,
            }),
        };
        return Ok(vec![serde_json::to_string_pretty(&data)?]);
    }

    let lines = match kind {
        DemoKind::Users => users_report()?,
        DemoKind::Library => library_report()?,
        DemoKind::Collectors => collectors_report()?,
        DemoKind::All => {
            let mut lines = users_report()?;
            lines.extend(library_report()?);
            lines.extend(collectors_report()?);
            lines
        }
    };
    Ok(lines)
}
