use std::io::{self, Write};

use ansi_term::Style;
use anyhow::Result;

use crate::journey::display::DisplayJourney;

/// Wide enough for the longest leg label.
const LABEL_WIDTH: usize = 36;

const TOTAL_LABEL: &str = "Journey Time";

/// Runs the `records` command: journey cards, most recent first.
pub fn print_records(journeys: &[DisplayJourney]) -> Result<()> {
    write_records(&mut io::stdout().lock(), journeys)?;
    Ok(())
}

pub fn write_records(out: &mut impl Write, journeys: &[DisplayJourney]) -> io::Result<()> {
    if journeys.is_empty() {
        writeln!(out, "No journeys recorded yet.")?;
        return Ok(());
    }
    for journey in journeys {
        write_journey(out, journey)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_journey(out: &mut impl Write, journey: &DisplayJourney) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        Style::new()
            .bold()
            .paint(format!("#{} {}", journey.id, journey.kind))
    )?;
    for leg in &journey.legs {
        writeln!(out, "  {:<width$}{}", leg.label, leg.time, width = LABEL_WIDTH)?;
    }
    writeln!(
        out,
        "  {:<width$}{}",
        TOTAL_LABEL,
        journey.total_duration,
        width = LABEL_WIDTH
    )
}
