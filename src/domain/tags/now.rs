// {% now "format" %}

use std::fmt;

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Timelike};

use crate::domain::context::Context;
use crate::domain::template::ast::Node;
use crate::domain::template::expression::{smart_split, unquote};
use crate::domain::template::library::NodeFactory;
use crate::domain::template::parser::Parser;
use crate::error::{Result, TemplateError};

pub struct NowNodeFactory;

impl NodeFactory for NowNodeFactory {
    fn get_node(&self, args: &str, _parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let bits = smart_split(args);
        let [format] = bits.as_slice() else {
            return Err(TemplateError::tag_syntax(
                "now",
                "expected a single quoted format string",
            ));
        };
        let format = unquote(format)
            .ok_or_else(|| TemplateError::tag_syntax("now", "format string must be quoted"))?;
        Ok(Box::new(NowNode {
            format: format.to_string(),
        }))
    }
}

/// Current local time, formatted with the format fixed at parse time
#[derive(Debug)]
pub struct NowNode {
    format: String,
}

impl NowNode {
    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Node for NowNode {
    fn kind(&self) -> &str {
        "NowNode"
    }

    fn render(&self, _ctx: &mut Context, out: &mut String) -> Result<()> {
        out.push_str(&format_datetime(&Local::now(), &self.format));
        Ok(())
    }

    fn describe(&self) -> String {
        format!("NowNode(\"{}\")", self.format)
    }
}

const MONTHS_AP: [&str; 12] = [
    "Jan.", "Feb.", "March", "April", "May", "June", "July", "Aug.", "Sept.", "Oct.", "Nov.",
    "Dec.",
];

/// Format a timestamp with single-character date codes.
///
/// A backslash makes the next character literal; characters that are not
/// codes are copied through.
pub fn format_datetime<Tz>(dt: &DateTime<Tz>, format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    let mut chars = format.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(literal) = chars.next() {
                    out.push(literal);
                }
            }
            'd' => out.push_str(&format!("{:02}", dt.day())),
            'D' => out.push_str(&dt.format("%a").to_string()),
            'j' => out.push_str(&dt.day().to_string()),
            'l' => out.push_str(&dt.format("%A").to_string()),
            'N' => out.push_str(MONTHS_AP[dt.month0() as usize]),
            'w' => out.push_str(&dt.weekday().num_days_from_sunday().to_string()),
            // 1 for January 1st
            'z' => out.push_str(&dt.ordinal().to_string()),
            'W' => out.push_str(&dt.iso_week().week().to_string()),
            'm' => out.push_str(&format!("{:02}", dt.month())),
            'M' => out.push_str(&dt.format("%b").to_string()),
            'n' => out.push_str(&dt.month().to_string()),
            'F' => out.push_str(&dt.format("%B").to_string()),
            'y' => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
            'Y' => out.push_str(&dt.year().to_string()),
            'L' => out.push_str(if is_leap_year(dt.year()) { "True" } else { "False" }),
            't' => out.push_str(&days_in_month(dt.year(), dt.month()).to_string()),
            'a' => out.push_str(if dt.hour() < 12 { "a.m." } else { "p.m." }),
            'A' => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
            'g' => out.push_str(&hour12(dt.hour()).to_string()),
            'G' => out.push_str(&dt.hour().to_string()),
            'h' => out.push_str(&format!("{:02}", hour12(dt.hour()))),
            'H' => out.push_str(&format!("{:02}", dt.hour())),
            'i' => out.push_str(&format!("{:02}", dt.minute())),
            's' => out.push_str(&format!("{:02}", dt.second())),
            'u' => out.push_str(&format!("{:06}", dt.timestamp_subsec_micros())),
            'e' => out.push_str(&dt.offset().to_string()),
            'O' => out.push_str(&dt.format("%z").to_string()),
            'P' => out.push_str(&friendly_time(dt.hour(), dt.minute())),
            'U' => out.push_str(&dt.timestamp().to_string()),
            'S' => out.push_str(ordinal_suffix(dt.day())),
            other => out.push(other),
        }
    }
    out
}

fn hour12(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

/// "midnight", "noon", "1 a.m." or "1:30 p.m."
fn friendly_time(hour: u32, minute: u32) -> String {
    match (hour, minute) {
        (0, 0) => "midnight".to_string(),
        (12, 0) => "noon".to_string(),
        _ => {
            let period = if hour < 12 { "a.m." } else { "p.m." };
            if minute == 0 {
                format!("{} {}", hour12(hour), period)
            } else {
                format!("{}:{:02} {}", hour12(hour), minute, period)
            }
        }
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}
