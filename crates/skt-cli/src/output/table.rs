//! Plain-text tables for `--format table`.

/// Columns never shrink below this, or below their header.
const MIN_COLUMN: usize = 4;
const GAP: &str = "  ";

#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Render `rows` under `headers`. Missing cells show as `-`, numbers are
/// right-aligned, and known statuses are coloured when `options.color` is set.
#[must_use]
pub fn render(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let floors: Vec<usize> = headers
        .iter()
        .map(|header| header.chars().count().max(MIN_COLUMN))
        .collect();
    let mut widths: Vec<usize> = floors
        .iter()
        .enumerate()
        .map(|(index, floor)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|value| value.chars().count())
                .fold(*floor, usize::max)
        })
        .collect();
    if let Some(budget) = options.max_width {
        shrink(&mut widths, &floors, budget);
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(&clip(header, *width), *width, false))
        .collect();
    lines.push(header_cells.join(GAP).trim_end().to_string());
    lines.push("-".repeat(line_width(&widths)));

    for row in rows {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let value = row.get(index).map_or("-", String::as_str);
                let padded = pad(&clip(value, *width), *width, value.parse::<f64>().is_ok());
                match status_color(value) {
                    Some(code) if options.color => format!("\u{1b}[{code}m{padded}\u{1b}[0m"),
                    _ => padded,
                }
            })
            .collect();
        lines.push(cells.join(GAP).trim_end().to_string());
    }
    lines.join("\n")
}

fn line_width(widths: &[usize]) -> usize {
    widths.iter().sum::<usize>() + GAP.len() * widths.len().saturating_sub(1)
}

/// Narrow the widest shrinkable column until the table fits `budget` or
/// every column sits at its floor.
fn shrink(widths: &mut [usize], floors: &[usize], budget: usize) {
    let mut excess = line_width(widths).saturating_sub(budget);
    while excess > 0 {
        let Some(widest) = (0..widths.len())
            .filter(|&index| widths[index] > floors[index])
            .max_by_key(|&index| widths[index])
        else {
            break;
        };
        let runner_up = widths
            .iter()
            .copied()
            .filter(|width| *width < widths[widest])
            .max()
            .unwrap_or(0);
        let step = (widths[widest] - runner_up.max(floors[widest])).min(excess);
        widths[widest] -= step;
        excess -= step;
    }
}

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{value:>width$}")
    } else {
        format!("{value:<width$}")
    }
}

/// ANSI colour for a wire status: green once a record has landed, yellow
/// while it is in flight, red when it has fallen out.
fn status_color(value: &str) -> Option<&'static str> {
    match value {
        "ACTIVE" | "CERTIFIED" | "PLACED" | "READY" | "COMPLETED" | "JOINED" | "RETAINED" => {
            Some("32")
        }
        "DRAFT" | "ENROLLED" | "TRAINING" | "GENERATING" | "PENDING" | "PROCESSING"
        | "OFFERED" => Some("33"),
        "CANCELLED" | "DROPPED" | "FAILED" | "EXPIRED" | "LEFT" => Some("31"),
        _ => None,
    }
}
