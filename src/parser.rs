use crate::calendar::{HijriMonth, MONTHS, WEEKDAYS_AR, month_by_number};
use crate::fetch::FetchedDocument;
use crate::model::{ExtractedDate, ExtractionMethod};
use crate::numerals::arabic_numeral_to_int;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info};

/// Text matches must carry a year above this. Keeps Gregorian years and
/// stray counters from passing as a Hijri date.
pub const MIN_PLAUSIBLE_YEAR: u64 = 1440;

const DIGIT_RUN: &str = "([٠-٩]+)";

struct MonthPatterns {
    month: &'static HijriMonth,
    header: Regex,
    text: Regex,
}

static MONTH_PATTERNS: LazyLock<Vec<MonthPatterns>> = LazyLock::new(|| {
    let weekdays = weekday_alternation(&WEEKDAYS_AR);

    MONTHS
        .iter()
        .map(|month| MonthPatterns {
            month,
            header: header_regex(&weekdays, month),
            text: Regex::new(&format!(
                r"{DIGIT_RUN}\s*{}\s*{DIGIT_RUN}",
                regex::escape(month.name_ar)
            ))
            .expect("text date regex must compile"),
        })
        .collect()
});

// ASCII only; `\d` also matches Arabic-Indic digits.
static JSON_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""date_hijri":"([0-9]{4})-([0-9]{2})-([0-9]{2})""#)
        .expect("json date regex must compile")
});

fn weekday_alternation(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|label| regex::escape(label.trim()))
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}

fn header_regex(weekdays: &str, month: &HijriMonth) -> Regex {
    let name = regex::escape(month.name_ar);
    Regex::new(&format!(r"(?:{weekdays})\s*{DIGIT_RUN}\s*{name}\s*{DIGIT_RUN}"))
        .expect("header date regex must compile")
}

const SKIPPED_TEXT_PARENTS: [&str; 4] = ["script", "style", "noscript", "template"];

pub fn extract_from_document(doc: &FetchedDocument) -> Option<ExtractedDate> {
    let markup = doc.markup();
    let found = extract_hijri_date(&markup, &html_to_text(&markup));

    match &found {
        Some(date) => info!(
            url = %doc.source_url,
            method = date.method.as_str(),
            day = date.day,
            month = %date.month_name_ar,
            year = date.year,
            "found hijri date"
        ),
        None => debug!(url = %doc.source_url, "no hijri date in document"),
    }

    found
}

/// Tries the weekday-anchored header, then any `day month year` run in the
/// rendered text, then the `date_hijri` JSON field in the markup.
pub fn extract_hijri_date(markup: &str, text: &str) -> Option<ExtractedDate> {
    find_header_date(text)
        .or_else(|| find_text_date(text))
        .or_else(|| find_json_date(markup))
}

/// As [`extract_hijri_date`], with the header anchored on `weekdays` instead
/// of the built-in Arabic labels.
pub fn extract_hijri_date_with(
    markup: &str,
    text: &str,
    weekdays: &[&str],
) -> Option<ExtractedDate> {
    find_header_date_with(text, weekdays)
        .or_else(|| find_text_date(text))
        .or_else(|| find_json_date(markup))
}

pub fn find_header_date(text: &str) -> Option<ExtractedDate> {
    scan_months(text, ExtractionMethod::Header, |patterns| &patterns.header)
}

/// No labels means no header match.
pub fn find_header_date_with(text: &str, weekdays: &[&str]) -> Option<ExtractedDate> {
    let weekdays = weekday_alternation(weekdays);
    if weekdays.is_empty() {
        return None;
    }

    MONTHS.iter().find_map(|month| {
        let header = header_regex(&weekdays, month);
        first_plausible(text, &header, month, ExtractionMethod::Header)
    })
}

pub fn find_text_date(text: &str) -> Option<ExtractedDate> {
    scan_months(text, ExtractionMethod::Text, |patterns| &patterns.text)
}

fn scan_months(
    text: &str,
    method: ExtractionMethod,
    pick: impl Fn(&MonthPatterns) -> &Regex,
) -> Option<ExtractedDate> {
    MONTH_PATTERNS
        .iter()
        .find_map(|patterns| first_plausible(text, pick(patterns), patterns.month, method))
}

fn first_plausible(
    text: &str,
    pattern: &Regex,
    month: &'static HijriMonth,
    method: ExtractionMethod,
) -> Option<ExtractedDate> {
    for caps in pattern.captures_iter(text) {
        let (Some(day), Some(year)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let day = arabic_numeral_to_int(day.as_str());
        let year = arabic_numeral_to_int(year.as_str());
        if year <= MIN_PLAUSIBLE_YEAR {
            debug!(month = month.name_en, year, "rejected implausible hijri year");
            continue;
        }
        let Some((day, year)) = plausible_day(day).zip(u32::try_from(year).ok()) else {
            continue;
        };
        return Some(ExtractedDate::new(day, month, year, method));
    }

    None
}

pub fn find_json_date(markup: &str) -> Option<ExtractedDate> {
    for caps in JSON_DATE.captures_iter(markup) {
        let (Some(year), Some(month), Some(day)) = (
            caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()),
            caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()),
            caps.get(3).and_then(|m| m.as_str().parse::<u64>().ok()),
        ) else {
            debug!(field = &caps[0], "date_hijri field is not numeric");
            continue;
        };

        let Some(month) = month_by_number(month) else {
            debug!(month, "date_hijri field has an unknown month");
            continue;
        };
        let Some(day) = plausible_day(day) else {
            continue;
        };
        return Some(ExtractedDate::new(day, month, year, ExtractionMethod::Json));
    }

    None
}

fn plausible_day(day: u64) -> Option<u32> {
    if (1..=30).contains(&day) {
        Some(day as u32)
    } else {
        None
    }
}

/// Visible text of `<body>`, one space between text nodes.
pub fn html_to_text(markup: &str) -> String {
    let parsed = Html::parse_document(markup);
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = parsed.select(&body_selector).next() else {
        return String::new();
    };

    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?;
            if let Some(element) = parent.value().as_element()
                && SKIPPED_TEXT_PARENTS.contains(&element.name())
            {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_to_text_skips_scripts_and_styles() {
        let html = r#"<html><head><title>t</title></head><body>
            <div>السبت <b>١٤</b> رجب ١٤٤٧</div>
            <script>var x = "١ محرم ١٤٥٠";</script>
            <style>.a{}</style>
        </body></html>"#;
        let text = html_to_text(html);
        assert_eq!(text, "السبت ١٤ رجب ١٤٤٧");
    }

    #[test]
    fn day_outside_month_range_is_rejected() {
        assert!(find_text_date("٣١ رجب ١٤٤٧").is_none());
        assert!(find_text_date("٠ رجب ١٤٤٧").is_none());
    }

    #[test]
    fn later_occurrence_is_tried_after_implausible_one() {
        let text = "أرشيف ٥ رجب ١٤٣٠ ثم ١٤ رجب ١٤٤٧";
        let found = find_text_date(text).unwrap();
        assert_eq!((found.day, found.month, found.year), (14, 7, 1447));
    }
}
