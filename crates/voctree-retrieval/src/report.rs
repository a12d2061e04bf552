//! Text renderings of query results and of the document map.
//!
//! Numbers are written the way a default C++ output stream writes them, so
//! reports stay byte-compatible with existing matlab scripts and parsers.
use std::fs;
use std::path::Path;

use voctree_core::config::{ReportFormat, ReportTarget};
use voctree_core::error::{Error, Result};
use voctree_core::types::{DocumentMap, QueryBatch};

/// Six significant digits, trailing zeros dropped, exponent form outside
/// `[1e-4, 1e6)` (printf `%g`).
pub fn format_score(score: f32) -> String {
    let v = f64::from(score);
    if v == 0.0 {
        return "0".to_string();
    }
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let sci = format!("{:.5e}", v);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (5 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// One `"<query> <match id> <score>"` line per match, in rank order.
pub fn render_plain(batch: &QueryBatch) -> String {
    let mut out = String::new();
    for (i, matches) in batch.iter().enumerate() {
        for m in matches {
            out.push_str(&format!("{} {} {}\n", i, m.id, format_score(m.score)));
        }
    }
    out
}

/// One 1-based matlab cell assignment per query: `m{1}=[ id, score; ... ];`.
pub fn render_matlab(batch: &QueryBatch) -> String {
    let mut out = String::new();
    for (i, matches) in batch.iter().enumerate() {
        out.push_str(&format!("m{{{}}}=[ ", i + 1));
        for m in matches {
            out.push_str(&format!("{}, {}; ", m.id, format_score(m.score)));
        }
        out.push_str("];\n");
    }
    out
}

pub fn render(format: ReportFormat, batch: &QueryBatch) -> String {
    match format {
        ReportFormat::Plain => render_plain(batch),
        ReportFormat::Matlab => render_matlab(batch),
    }
}

/// One `d{<id>} = [ w, w, ];` line per document.
pub fn render_document_map(documents: &DocumentMap) -> String {
    let mut out = String::new();
    for (id, words) in documents {
        out.push_str(&format!("d{{{}}} = [ ", id));
        for w in words {
            out.push_str(&format!("{}, ", w));
        }
        out.push_str("];\n");
    }
    out
}

pub fn write_report(target: &ReportTarget, batch: &QueryBatch) -> Result<()> {
    let path = target.path.as_path();
    fs::write(path, render(target.format, batch)).map_err(|e| Error::io(path, e))
}

pub fn save_document_map(path: &Path, documents: &DocumentMap) -> Result<()> {
    fs::write(path, render_document_map(documents)).map_err(|e| Error::io(path, e))
}
