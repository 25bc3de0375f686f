use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ELLIPSIS: char = '\u{2026}';

/// Terminal cells taken by `s`.
pub fn cell_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Render `s` into exactly `cells` terminal cells for a table column.
///
/// Control characters (tabs included) become single spaces so a cell never
/// breaks the row. Text that does not fit is cut on a grapheme boundary
/// and ends in `…`; short text is padded with spaces.
pub fn fit_cell(s: &str, cells: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let mut out = String::with_capacity(cells);
    let mut used = 0;
    if cell_width(&flat) <= cells {
        out.push_str(&flat);
        used = cell_width(&flat);
    } else if cells > 0 {
        let budget = cells - 1;
        for grapheme in flat.graphemes(true) {
            let w = cell_width(grapheme);
            if used + w > budget {
                break;
            }
            out.push_str(grapheme);
            used += w;
        }
        out.push(ELLIPSIS);
        used += 1;
    }

    out.extend(std::iter::repeat_n(' ', cells.saturating_sub(used)));
    out
}
