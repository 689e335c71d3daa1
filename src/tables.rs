use comfy_table::{Attribute, Cell, CellAlignment, Table, modifiers, presets};

use crate::statistics::ranges::RangeSummary;

pub fn build_ranges_table(summaries: &[RangeSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec!["Temperature", "Mean (kWh)", "Std (kWh)", "Days"]);
    for summary in summaries {
        table.add_row(vec![
            Cell::new(summary.label).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.2}", summary.mean)).set_alignment(CellAlignment::Right),
            match summary.std {
                Some(std) => Cell::new(format!("{std:.2}")).set_alignment(CellAlignment::Right),
                None => Cell::new("n/a").set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim),
            },
            Cell::new(summary.count).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
