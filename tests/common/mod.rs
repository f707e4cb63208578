#![allow(dead_code)]

use plurkdl::{AccountId, IdentifierResolver, PageFetcher, PageResult, RawPlurk, TimelineError};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// `Www, DD Jan 2020 HH:MM:SS GMT` with the correct weekday (1 Jan 2020 was a Wednesday).
pub fn jan2020(day: u8, h: u8, m: u8, s: u8) -> String {
    const WEEKDAYS: [&str; 7] = ["Wed", "Thu", "Fri", "Sat", "Sun", "Mon", "Tue"];
    assert!((1..=31).contains(&day));
    format!("{}, {:02} Jan 2020 {:02}:{:02}:{:02} GMT", WEEKDAYS[usize::from(day - 1) % 7], day, h, m, s)
}

pub fn raw(plurk_id: u64, posted: &str, text: &str) -> RawPlurk {
    RawPlurk {
        plurk_id,
        posted: posted.to_string(),
        content: format!("<p>{text}</p>"),
        content_raw: text.to_string(),
        response_count: plurk_id % 5,
    }
}

/// Plays back a fixed list of answers, then reports `End` forever.
/// Records every offset it was asked for.
pub struct ScriptedFetcher {
    pub pages: VecDeque<PageResult>,
    pub offsets: Vec<String>,
    pub accounts: Vec<AccountId>,
}

impl ScriptedFetcher {
    pub fn new(pages: Vec<PageResult>) -> Self {
        Self { pages: pages.into(), offsets: Vec::new(), accounts: Vec::new() }
    }
}

impl PageFetcher for ScriptedFetcher {
    fn fetch(&mut self, account: &AccountId, offset: &str) -> Result<PageResult, TimelineError> {
        self.accounts.push(account.clone());
        self.offsets.push(offset.to_string());
        Ok(self.pages.pop_front().unwrap_or(PageResult::End))
    }
}

/// Never runs out: every call returns one post one hour older than the last.
pub struct EndlessFetcher {
    pub calls: u64,
}

impl PageFetcher for EndlessFetcher {
    fn fetch(&mut self, _account: &AccountId, _offset: &str) -> Result<PageResult, TimelineError> {
        self.calls += 1;
        let hour = 23 - (self.calls % 24) as u8;
        let day = 28 - (self.calls / 24) as u8;
        Ok(PageResult::Page(vec![raw(1000 - self.calls, &jan2020(day, hour, 0, 0), "tick")]))
    }
}

/// Resolver that answers from a fixed id, or fails like a missing profile.
pub struct FixedResolver(pub Option<&'static str>);

impl IdentifierResolver for FixedResolver {
    fn resolve(&self, handle: &str) -> Result<AccountId, TimelineError> {
        self.0
            .map(AccountId::new)
            .ok_or_else(|| TimelineError::Resolution { handle: handle.to_string() })
    }
}

/// Read a text file line-by-line (terminators stripped, empty lines kept).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    BufReader::new(f).lines().map(|l| l.unwrap()).collect()
}
