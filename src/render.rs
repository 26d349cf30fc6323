//! HTML rendering of a visibility report.
//!
//! Produces the renderable form of a report for the UI layer: a header
//! with the location, viewing window, and criteria, followed by the object
//! table ordered as in the report. Rendering is a pure function of the
//! report, so a cached payload always renders identically.

use crate::api::{VisibilityReport, VisibleObject};

/// Render a report as a self-contained HTML fragment.
pub fn render_html(report: &VisibilityReport) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str("<h1>DSO Visibility Report</h1>\n");
    out.push_str("<div class=\"info\">\n");
    out.push_str(&format!(
        "  <p><strong>Location:</strong> {}</p>\n",
        escape(&report.location)
    ));
    out.push_str(&format!(
        "  <p><strong>Viewing Window:</strong> {} to {} ({})</p>\n",
        report.window_start_local.format("%H:%M"),
        report.window_end_local.format("%H:%M"),
        report.timezone
    ));
    out.push_str(&format!(
        "  <p><strong>Criteria:</strong> Altitude &gt;= {:.0}&deg;, Azimuth {:.0}&deg;-{:.0}&deg;</p>\n",
        report.min_altitude_deg, report.az_min_deg, report.az_max_deg
    ));
    out.push_str("</div>\n");

    if report.objects.is_empty() {
        out.push_str("<p>No objects meet the visibility criteria for this date.</p>\n");
        return out;
    }

    out.push_str("<table class=\"dso-table\">\n<thead>\n<tr>");
    for heading in [
        "Priority",
        "Name",
        "Also Known As",
        "Start",
        "Start Alt",
        "Start Az",
        "End",
        "End Alt",
        "End Az",
        "Duration",
        "Size (sq')",
        "Mag",
        "Constellation",
        "Type",
    ] {
        out.push_str(&format!("<th>{}</th>", heading));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for obj in &report.objects {
        out.push_str(&render_row(obj));
    }

    out.push_str("</tbody>\n</table>\n");
    out.push_str(&format!(
        "<p><strong>Total visible objects:</strong> {}</p>\n",
        report.objects.len()
    ));
    out
}

fn render_row(obj: &VisibleObject) -> String {
    format!(
        "<tr><td class=\"priority\">{}</td><td><strong>{}</strong></td><td>{}</td>\
         <td>{}</td><td>{:.0}&deg;</td><td>{:.0}&deg;</td>\
         <td>{}</td><td>{:.0}&deg;</td><td>{:.0}&deg;</td>\
         <td class=\"duration\">{}</td><td>{:.0}</td><td>{:.1}</td><td>{}</td><td>{}</td></tr>\n",
        if obj.priority { "&#9733;" } else { "" },
        escape(&obj.name),
        escape(&obj.aka),
        obj.first_visible_local.format("%H:%M"),
        obj.start_alt_deg,
        obj.start_az_deg,
        obj.last_visible_local.format("%H:%M"),
        obj.end_alt_deg,
        obj.end_az_deg,
        format_duration(obj.visible_minutes),
        obj.size_sq_arcmin,
        obj.magnitude,
        escape(&obj.constellation),
        escape(&obj.type_desc),
    )
}

/// Minutes as "4.5h" above an hour, "45m" below.
fn format_duration(minutes: i64) -> String {
    if minutes >= 60 {
        format!("{:.1}h", minutes as f64 / 60.0)
    } else {
        format!("{}m", minutes)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
