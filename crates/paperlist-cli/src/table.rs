//! Terminal rendering of a listing with `comfy-table`.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use paperlist_core::{ColumnKind, RenderedList};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell(value: &str) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn is_numeric(kind: ColumnKind) -> bool {
    matches!(
        kind,
        ColumnKind::Id
            | ColumnKind::Score
            | ColumnKind::Formula
            | ColumnKind::TopicScore
            | ColumnKind::Desirability
            | ColumnKind::ReviewStatus
    )
}

/// One table column per displayed, unfolded column; cells show the plain
/// text form. Row-placed columns become table columns too.
pub fn listing_table(listing: &RenderedList) -> Table {
    let shown: Vec<usize> = listing
        .columns
        .iter()
        .enumerate()
        .filter(|(_, column)| !column.folded)
        .map(|(index, _)| index)
        .collect();

    let mut table = Table::new();
    table.set_header(
        shown
            .iter()
            .map(|index| header_cell(&listing.columns[*index].name))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);
    for (position, index) in shown.iter().enumerate() {
        if is_numeric(listing.columns[*index].kind)
            && let Some(column) = table.column_mut(position)
        {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    for row in &listing.rows {
        table.add_row(
            shown
                .iter()
                .map(|index| match row.cells.get(*index) {
                    Some(cell) if !cell.text.is_empty() => Cell::new(&cell.text),
                    _ => dim_cell(""),
                })
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Footer statistics, one row per column that has them.
pub fn statistics_table(listing: &RenderedList) -> Option<Table> {
    let first = listing.statistics.first()?;
    let mut table = Table::new();
    let mut header = vec![header_cell("Column")];
    header.extend(first.values.iter().map(|(label, _)| header_cell(label)));
    table.set_header(header);
    apply_table_style(&mut table);
    for statistics in &listing.statistics {
        let mut cells = vec![Cell::new(&statistics.column).fg(Color::Blue)];
        cells.extend(statistics.values.iter().map(|(_, value)| Cell::new(value)));
        table.add_row(cells);
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperlist_core::{AnyFlags, ColumnErrors, RenderedCell, RenderedColumn, RenderedRow};
    use paperlist_model::{PaperId, QueryOptions};

    fn listing() -> RenderedList {
        let column = |name: &str, kind, folded| RenderedColumn {
            name: name.to_string(),
            header: name.to_string(),
            kind,
            css_class: String::new(),
            is_row: false,
            folded,
        };
        let cell = |text: &str| RenderedCell {
            content: (!text.is_empty()).then(|| text.to_string()),
            text: text.to_string(),
        };
        RenderedList {
            columns: vec![
                column("id", ColumnKind::Id, false),
                column("abstract", ColumnKind::Abstract, true),
                column("title", ColumnKind::Title, false),
            ],
            rows: vec![RenderedRow {
                paper_id: PaperId(4),
                cells: vec![cell("4"), RenderedCell::default(), cell("Chain Replication")],
            }],
            statistics: Vec::new(),
            any: AnyFlags::default(),
            footer_scripts: Vec::new(),
            footer_html: Vec::new(),
            errors: ColumnErrors::new(),
            query_options: QueryOptions::new(),
        }
    }

    #[test]
    fn folded_columns_are_left_out() {
        let mut table = listing_table(&listing());
        assert_eq!(table.column_count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("Chain Replication"));
        assert!(!rendered.contains("abstract"));
    }

    #[test]
    fn no_statistics_means_no_footer() {
        assert!(statistics_table(&listing()).is_none());
    }
}
