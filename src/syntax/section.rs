//! Section rewriter
//!
//! Tasks live under one designated heading. Reading pulls the lines
//! between that heading and the next heading of equal or higher level;
//! rewriting replaces exactly that span and leaves the rest of the
//! document alone.

/// Returns the body line range of the task section: the lines strictly
/// between the matching heading and the next heading of equal or higher
/// level. `None` when the heading is absent.
pub fn section_span(lines: &[&str], heading: &str) -> Option<std::ops::Range<usize>> {
    let marker = heading.trim();
    let level = heading_level(marker).max(1);
    let start = lines
        .iter()
        .position(|line| line.trim().eq_ignore_ascii_case(marker))?;
    let mut end = lines.len();
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        let l = heading_level(line.trim());
        if l > 0 && l <= level {
            end = i;
            break;
        }
    }
    Some(start + 1..end)
}

/// The task section's lines, or an empty slice when the heading is absent
pub fn section_lines<'s, 'a>(lines: &'s [&'a str], heading: &str) -> &'s [&'a str] {
    match section_span(lines, heading) {
        Some(span) => &lines[span],
        None => &[],
    }
}

/// Replaces the task section's body with `body`, preserving everything
/// else. When the heading is missing, the section is appended at the end
/// of the document, preceded by a blank line unless one is already there.
pub fn replace_section(text: &str, heading: &str, body: &[String]) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let marker = heading.trim();

    let mut out: Vec<String> = Vec::new();
    match section_span(&lines, heading) {
        Some(span) => {
            out.extend(lines[..span.start].iter().map(|l| l.to_string()));
            out.extend(body.iter().cloned());
            if span.end < lines.len() {
                out.push(String::new());
                out.extend(lines[span.end..].iter().map(|l| l.to_string()));
            }
        }
        None => {
            out.extend(lines.iter().map(|l| l.to_string()));
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                out.push(String::new());
            }
            out.push(marker.to_string());
            out.extend(body.iter().cloned());
        }
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}

/// Number of leading `#` characters; 0 for non-headings
fn heading_level(line: &str) -> usize {
    line.chars().take_while(|&c| c == '#').count()
}
