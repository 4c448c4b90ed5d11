//! Report rendering for `leanline report`.
//!
//! All conversion to the display unit happens here; the analytics value is
//! in kilograms.

use std::fmt;

use leanline_core::analytics::{format_weight, format_weight_delta, Analytics, AnalyticsStatus};
use leanline_core::{UnitSystem, UserProfile};
use serde::Serialize;

const BAR_WIDTH: usize = 20;

/// Everything a report needs, serializable for `--format json`.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub user: Option<&'a UserProfile>,
    pub analytics: &'a Analytics,
    pub units: UnitSystem,
    pub log_window_days: u32,
}

/// Plain terminal rendering.
pub struct TextReport<'a>(pub &'a Report<'a>);

/// Markdown rendering.
pub struct MarkdownReport<'a>(pub &'a Report<'a>);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let a = report.analytics;
        let units = report.units;

        let Some(user) = report.user else {
            writeln!(f, "No profile yet. Run `leanline profile set` or `leanline seed`.")?;
            return Ok(());
        };

        let title = format!("leanline: {}", user.name);
        writeln!(f)?;
        writeln!(f, "╭{}╮", "─".repeat(50))?;
        writeln!(f, "│{:^50}│", title)?;
        writeln!(f, "╰{}╯", "─".repeat(50))?;
        writeln!(f)?;

        let Some(current) = a.current_weight_kg else {
            writeln!(f, "  No readings yet. Log one with `leanline log --weight <w>`.")?;
            return Ok(());
        };

        writeln!(f, "PROGRESS")?;
        writeln!(
            f,
            "   Current:     {}  (BMI {:.1})",
            format_weight(current, units),
            a.latest_bmi
        )?;
        writeln!(
            f,
            "   Goal:        {}  ({} to go)",
            format_weight(user.target_weight_kg, units),
            format_weight(a.remaining_kg, units)
        )?;
        writeln!(
            f,
            "   Progress:    {} {}%",
            progress_bar(a.progress),
            a.progress_percent()
        )?;
        writeln!(f, "   This week:   {}", a.weekly_change_label)?;
        writeln!(
            f,
            "   Logged:      {} in the last {} days",
            plural(a.logs_this_week, "reading"),
            report.log_window_days
        )?;
        writeln!(f)?;

        writeln!(f, "COMPOSITION")?;
        writeln!(f, "   Fat lost:    {:.1}% of starting fat mass", a.fat_loss_pct)?;
        writeln!(f, "   Muscle:      {}/100 preservation score", a.muscle_score)?;
        writeln!(f, "   Hydration:   {}", hydration_text(a.hydration_low))?;
        if a.status == AnalyticsStatus::InsufficientHistory {
            writeln!(f, "   (log a few more readings to see trends)")?;
        }
        writeln!(f)?;

        writeln!(f, "WEEKLY AVERAGES")?;
        writeln!(f, "   {:<12} {:>10} {:>6} {:>6}", "WEEK OF", "WEIGHT", "FAT%", "LEAN%")?;
        for (week, comp) in a.weekly_weights.iter().zip(&a.composition_by_week) {
            writeln!(
                f,
                "   {:<12} {:>10} {:>6.1} {:>6.1}",
                week.label,
                format_weight(week.mean_weight_kg, units),
                comp.fat_pct,
                comp.lean_pct
            )?;
        }
        writeln!(f)?;

        writeln!(f, "PREDICTED")?;
        for point in a.predicted_curve.iter().filter(|p| p.week % 4 == 0) {
            writeln!(
                f,
                "   Week {:<3} {}",
                point.week,
                format_weight(point.weight_kg, units)
            )?;
        }
        writeln!(f)?;
        Ok(())
    }
}

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let a = report.analytics;
        let units = report.units;

        let name = report.user.map(|u| u.name.as_str()).unwrap_or("No profile");
        writeln!(f, "# leanline report: {}", name)?;
        writeln!(f)?;

        let (Some(user), Some(current)) = (report.user, a.current_weight_kg) else {
            writeln!(f, "*No data yet.*")?;
            return Ok(());
        };

        writeln!(f, "## Progress")?;
        writeln!(f)?;
        writeln!(f, "- **Current weight:** {}", format_weight(current, units))?;
        writeln!(
            f,
            "- **Goal:** {} ({} to go)",
            format_weight(user.target_weight_kg, units),
            format_weight(a.remaining_kg, units)
        )?;
        writeln!(f, "- **Progress:** {}%", a.progress_percent())?;
        writeln!(
            f,
            "- **Weekly change:** {} ({})",
            a.weekly_change_label,
            format_weight_delta(a.weekly_change_kg, units)
        )?;
        writeln!(
            f,
            "- **Logged:** {} in the last {} days",
            plural(a.logs_this_week, "reading"),
            report.log_window_days
        )?;
        writeln!(f, "- **BMI:** {:.1}", a.latest_bmi)?;
        writeln!(f)?;

        writeln!(f, "## Composition")?;
        writeln!(f)?;
        writeln!(f, "- **Fat lost:** {:.1}%", a.fat_loss_pct)?;
        writeln!(f, "- **Muscle preservation:** {}/100", a.muscle_score)?;
        writeln!(f, "- **Hydration:** {}", hydration_text(a.hydration_low))?;
        writeln!(f)?;

        writeln!(f, "## Weekly Averages")?;
        writeln!(f)?;
        writeln!(f, "| Week of | Weight | Fat % | Lean % |")?;
        writeln!(f, "|---------|--------|-------|--------|")?;
        for (week, comp) in a.weekly_weights.iter().zip(&a.composition_by_week) {
            writeln!(
                f,
                "| {} | {} | {:.1} | {:.1} |",
                week.label,
                format_weight(week.mean_weight_kg, units),
                comp.fat_pct,
                comp.lean_pct
            )?;
        }
        writeln!(f)?;

        writeln!(f, "## Predicted Curve")?;
        writeln!(f)?;
        writeln!(f, "| Week | Weight |")?;
        writeln!(f, "|------|--------|")?;
        for point in &a.predicted_curve {
            writeln!(f, "| {} | {} |", point.week, format_weight(point.weight_kg, units))?;
        }
        writeln!(f)?;
        writeln!(f, "---")?;
        writeln!(f, "*Generated by leanline*")?;
        Ok(())
    }
}

fn progress_bar(progress: f64) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn hydration_text(low: bool) -> &'static str {
    if low {
        "Low - body water is well below your recent average"
    } else {
        "OK"
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
