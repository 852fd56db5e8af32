use crate::catalog::ExerciseRecord;
use crate::selector::WorkoutPlan;
use chrono::{DateTime, Local};
use maud::{DOCTYPE, Markup, html};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const PAGE_FILE: &str = "workout_plan.html";
pub const LINK_LABEL: &str = "🔗 Open guide";

const STYLE: &str = "body{font-family:sans-serif;background:#FFD590;margin:2em}\
table{border-collapse:collapse;background:#FFF3E0}\
th{background:#FFB74D}\
th,td{border:1px solid #c98a2b;padding:.5em 1em;text-align:center}\
tr.fallback{background:#FFE0B2}";

/// Extra column headers in first-seen order across the plan.
fn extra_headers(exercises: &[ExerciseRecord]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    let mut headers = Vec::new();
    for ex in exercises {
        for (h, _) in &ex.extra {
            if seen.insert(h.as_str()) {
                headers.push(h.as_str());
            }
        }
    }
    headers
}

fn extra_value<'a>(ex: &'a ExerciseRecord, header: &str) -> &'a str {
    ex.extra
        .iter()
        .find(|(h, _)| h == header)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

/// Render the plan as a standalone HTML page.
///
/// Only links starting with `http` become anchors; any other link value
/// leaves the guide cell empty.
pub fn build_html(plan: &WorkoutPlan, generated_at: DateTime<Local>) -> Markup {
    let extras = extra_headers(&plan.exercises);
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Workout Plan" }
                style { (STYLE) }
            }
            body {
                h1 { "Workout Plan" }
                p { "Generated " (generated_at.format("%Y-%m-%d %H:%M").to_string()) }
                @if plan.is_empty() {
                    p { "No exercises selected" }
                } @else {
                    table {
                        tr {
                            th { "#" }
                            th { "Exercise" }
                            th { "Muscle Group" }
                            th { "Difficulty" }
                            th { "Equipment" }
                            @for h in &extras {
                                th { (h) }
                            }
                            th { "Guide" }
                        }
                        @for (i, ex) in plan.exercises.iter().enumerate() {
                            tr class=[(i >= plan.primary_len).then_some("fallback")] {
                                td { ((i + 1)) }
                                td { (ex.name) }
                                td { (ex.muscle_group) }
                                td { (ex.difficulty) }
                                td { (ex.equipment) }
                                @for h in &extras {
                                    td { (extra_value(ex, h)) }
                                }
                                td {
                                    @if let Some(url) = ex.guide_url() {
                                        a href=(url) target="_blank" { (LINK_LABEL) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Write the plan page into `dir` and return its path.
pub fn write_plan_page<P: AsRef<Path>>(
    dir: P,
    plan: &WorkoutPlan,
    generated_at: DateTime<Local>,
) -> std::io::Result<PathBuf> {
    let path = dir.as_ref().join(PAGE_FILE);
    std::fs::write(&path, build_html(plan, generated_at).into_string())?;
    Ok(path)
}

/// Show the plan in the default web browser.
pub fn open_plan_in_browser(plan: &WorkoutPlan) -> std::io::Result<()> {
    let path = write_plan_page(std::env::temp_dir(), plan, Local::now())?;
    log::info!("Opening workout plan at {}", path.display());
    open::that(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_plan() -> WorkoutPlan {
        let mut dip = ExerciseRecord {
            name: "Dip".into(),
            muscle_group: "Triceps".into(),
            difficulty: "Hard".into(),
            equipment: "Bodyweight".into(),
            link: Some("not-a-url".into()),
            extra: vec![("Reps".into(), "8".into())],
        };
        let row = ExerciseRecord {
            name: "Row".into(),
            muscle_group: "Back".into(),
            difficulty: "Easy".into(),
            equipment: "TRX".into(),
            link: Some("https://example.com/row".into()),
            extra: vec![("Reps".into(), "12".into())],
        };
        let mut curl = row.clone();
        curl.name = "Curl".into();
        curl.link = None;
        curl.extra.clear();
        dip.extra.push(("Tempo".into(), "3-1-1".into()));
        WorkoutPlan {
            exercises: vec![row, dip, curl],
            primary_len: 2,
        }
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap()
    }

    #[test]
    fn valid_links_become_anchors() {
        let output = build_html(&sample_plan(), at()).into_string();
        assert!(output.contains("href=\"https://example.com/row\""));
        assert_eq!(output.matches("<a ").count(), 1);
        assert!(!output.contains("not-a-url"));
    }

    #[test]
    fn invalid_link_row_still_rendered() {
        let output = build_html(&sample_plan(), at()).into_string();
        assert!(output.contains("<td>Dip</td>"));
        assert!(output.contains("<td>Triceps</td>"));
    }

    #[test]
    fn extra_columns_and_fallback_rows() {
        let output = build_html(&sample_plan(), at()).into_string();
        assert!(output.contains("<th>Reps</th>"));
        assert!(output.contains("<th>Tempo</th>"));
        assert!(output.contains("<td>3-1-1</td>"));
        assert_eq!(output.matches("class=\"fallback\"").count(), 1);
        assert!(output.contains("Generated 2024-05-01 18:30"));
    }

    #[test]
    fn rows_are_numbered_from_one() {
        let output = build_html(&sample_plan(), at()).into_string();
        assert!(output.contains("<td>1</td><td>Row</td>"));
        assert!(output.contains("<td>2</td><td>Dip</td>"));
        assert!(output.contains("<td>3</td><td>Curl</td>"));
        assert!(!output.contains("<td>0</td>"));
    }

    #[test]
    fn empty_plan_placeholder() {
        let output = build_html(&WorkoutPlan::default(), at()).into_string();
        assert!(output.contains("No exercises selected"));
        assert!(!output.contains("<table"));
    }

    #[test]
    fn write_plan_page_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plan_page(dir.path(), &sample_plan(), at()).unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
